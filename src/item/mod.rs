pub mod validate;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use validate::{validate, Field, ItemDraft, ValidationErrors};

pub type ItemId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Product,
    Service,
}

impl ItemType {
    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Product => "Product",
            ItemType::Service => "Service",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            ItemType::Product => ItemType::Service,
            ItemType::Service => ItemType::Product,
        }
    }
}

/// Whether a price already includes GST. Shared by sales and purchase prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    Inclusive,
    #[default]
    Exclusive,
}

impl TaxType {
    pub fn label(&self) -> &'static str {
        match self {
            TaxType::Inclusive => "With tax",
            TaxType::Exclusive => "Without tax",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            TaxType::Inclusive => TaxType::Exclusive,
            TaxType::Exclusive => TaxType::Inclusive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Percentage,
    Flat,
}

impl DiscountType {
    pub fn label(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "Percentage (%)",
            DiscountType::Flat => "Flat amount",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            DiscountType::Percentage => DiscountType::Flat,
            DiscountType::Flat => DiscountType::Percentage,
        }
    }
}

/// GST slab in basis points (1800 = 18%).
///
/// Only the slabs in [`GstRate::SLABS`] can be constructed from outside, so a
/// stored rate is always one the tax authority actually uses. The value is
/// carried as an opaque field; nothing here computes tax from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct GstRate(u32);

impl GstRate {
    pub const SLABS: [GstRate; 7] = [
        GstRate(0),
        GstRate(25),
        GstRate(300),
        GstRate(500),
        GstRate(1200),
        GstRate(1800),
        GstRate(2800),
    ];

    pub fn from_bps(bps: u32) -> Option<Self> {
        Self::SLABS.iter().copied().find(|slab| slab.0 == bps)
    }

    pub fn from_percentage(pct: f64) -> Option<Self> {
        if !pct.is_finite() || pct < 0.0 {
            return None;
        }
        Self::from_bps((pct * 100.0).round() as u32)
    }

    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Next slab, wrapping from 28% back to 0%
    pub fn next(&self) -> Self {
        let idx = Self::SLABS.iter().position(|s| s == self).unwrap_or(0);
        Self::SLABS[(idx + 1) % Self::SLABS.len()]
    }
}

impl Default for GstRate {
    fn default() -> Self {
        GstRate(1800)
    }
}

impl fmt::Display for GstRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}%", self.percentage())
        }
    }
}

impl TryFrom<f64> for GstRate {
    type Error = String;

    fn try_from(pct: f64) -> Result<Self, Self::Error> {
        GstRate::from_percentage(pct).ok_or_else(|| format!("{} is not a GST slab", pct))
    }
}

impl From<GstRate> for f64 {
    fn from(rate: GstRate) -> Self {
        rate.percentage()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Pcs,
    Box,
    Pack,
    Dozen,
    Kg,
    G,
    L,
    Ml,
    M,
    Hrs,
    Days,
}

impl Unit {
    pub const ALL: [Unit; 11] = [
        Unit::Pcs,
        Unit::Box,
        Unit::Pack,
        Unit::Dozen,
        Unit::Kg,
        Unit::G,
        Unit::L,
        Unit::Ml,
        Unit::M,
        Unit::Hrs,
        Unit::Days,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Unit::Pcs => "pcs",
            Unit::Box => "box",
            Unit::Pack => "pack",
            Unit::Dozen => "dozen",
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "l",
            Unit::Ml => "ml",
            Unit::M => "m",
            Unit::Hrs => "hrs",
            Unit::Days => "days",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Unit::Pcs => "Pieces (pcs)",
            Unit::Box => "Box",
            Unit::Pack => "Pack",
            Unit::Dozen => "Dozen",
            Unit::Kg => "Kilogram (kg)",
            Unit::G => "Gram (g)",
            Unit::L => "Litre (l)",
            Unit::Ml => "Millilitre (ml)",
            Unit::M => "Metre (m)",
            Unit::Hrs => "Hours (hrs)",
            Unit::Days => "Days",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|u| u == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Validated item payload handed to the item service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInput {
    pub name: String,
    pub description: String,
    pub sku: String,
    pub hsn_code: String,
    pub price: Decimal,
    pub cost_price: Decimal,
    pub stock_quantity: u32,
    pub gst_rate: GstRate,
    pub unit: Unit,
    pub low_stock_threshold: u32,
    pub item_type: ItemType,
    pub image_url: String,
    pub barcode: String,
    pub category: String,
    pub tax_type: TaxType,
    pub purchase_tax_type: TaxType,
    pub discount: Decimal,
    pub discount_type: DiscountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wholesale_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_stock_date: Option<NaiveDate>,
}

/// A stored inventory item (product or service)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub hsn_code: String,
    pub price: Decimal,
    #[serde(default)]
    pub cost_price: Decimal,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub gst_rate: GstRate,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub low_stock_threshold: u32,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tax_type: TaxType,
    #[serde(default)]
    pub purchase_tax_type: TaxType,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wholesale_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_stock_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn from_input(id: ItemId, input: ItemInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            sku: input.sku,
            hsn_code: input.hsn_code,
            price: input.price,
            cost_price: input.cost_price,
            stock_quantity: input.stock_quantity,
            gst_rate: input.gst_rate,
            unit: input.unit,
            low_stock_threshold: input.low_stock_threshold,
            item_type: input.item_type,
            image_url: input.image_url,
            barcode: input.barcode,
            category: input.category,
            tax_type: input.tax_type,
            purchase_tax_type: input.purchase_tax_type,
            discount: input.discount,
            discount_type: input.discount_type,
            wholesale_price: input.wholesale_price,
            opening_stock_date: input.opening_stock_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every editable field, keeping id and creation time
    pub fn apply(&mut self, input: ItemInput, now: DateTime<Utc>) {
        let id = self.id;
        let created_at = self.created_at;
        *self = Self::from_input(id, input, now);
        self.created_at = created_at;
    }

    pub fn is_low_stock(&self) -> bool {
        self.item_type == ItemType::Product && self.stock_quantity <= self.low_stock_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> ItemInput {
        ItemInput {
            name: "Basmati Rice 5kg".to_string(),
            description: String::new(),
            sku: "RICE-5".to_string(),
            hsn_code: "1006".to_string(),
            price: Decimal::new(62500, 2),
            cost_price: Decimal::new(54000, 2),
            stock_quantity: 40,
            gst_rate: GstRate::from_bps(500).unwrap(),
            unit: Unit::Pack,
            low_stock_threshold: 5,
            item_type: ItemType::Product,
            image_url: String::new(),
            barcode: String::new(),
            category: "Grocery".to_string(),
            tax_type: TaxType::Inclusive,
            purchase_tax_type: TaxType::Exclusive,
            discount: Decimal::ZERO,
            discount_type: DiscountType::Percentage,
            wholesale_price: None,
            opening_stock_date: None,
        }
    }

    #[test]
    fn test_gst_rate_slabs() {
        assert!(GstRate::from_percentage(18.0).is_some());
        assert!(GstRate::from_percentage(0.25).is_some());
        assert!(GstRate::from_percentage(10.0).is_none());
        assert_eq!(GstRate::from_bps(2800).unwrap().next(), GstRate::from_bps(0).unwrap());
        assert_eq!(GstRate::from_bps(1800).unwrap().to_string(), "18%");
        assert_eq!(GstRate::from_bps(25).unwrap().to_string(), "0.25%");
    }

    #[test]
    fn test_item_serializes_type_and_rate() {
        let item = Item::from_input(Uuid::new_v4(), sample_input(), Utc::now());
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["type"], "product");
        assert_eq!(json["gst_rate"], 5.0);
        assert_eq!(json["tax_type"], "inclusive");
        assert!(json.get("wholesale_price").is_none());

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_unknown_gst_rate_rejected() {
        let mut json = serde_json::to_value(Item::from_input(Uuid::new_v4(), sample_input(), Utc::now())).unwrap();
        json["gst_rate"] = serde_json::json!(7.5);
        assert!(serde_json::from_value::<Item>(json).is_err());
    }

    #[test]
    fn test_apply_keeps_identity() {
        let created = Utc::now() - chrono::Duration::days(3);
        let mut item = Item::from_input(Uuid::new_v4(), sample_input(), created);
        let id = item.id;

        let mut input = sample_input();
        input.name = "Basmati Rice 10kg".to_string();
        item.apply(input, Utc::now());

        assert_eq!(item.id, id);
        assert_eq!(item.created_at, created);
        assert!(item.updated_at > created);
        assert_eq!(item.name, "Basmati Rice 10kg");
    }

    #[test]
    fn test_low_stock_only_for_products() {
        let mut input = sample_input();
        input.stock_quantity = 5;
        let item = Item::from_input(Uuid::new_v4(), input.clone(), Utc::now());
        assert!(item.is_low_stock());

        input.item_type = ItemType::Service;
        input.stock_quantity = 0;
        let service = Item::from_input(Uuid::new_v4(), input, Utc::now());
        assert!(!service.is_low_stock());
    }
}
