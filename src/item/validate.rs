//! Field schema for the item form.
//!
//! The form keeps every text field as the raw string the user typed. `validate`
//! turns that draft into a typed [`ItemInput`], collecting one message per
//! failing field so all problems can be shown inline at once.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{DiscountType, GstRate, ItemInput, ItemType, TaxType, Unit};

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;
const SKU_MAX: usize = 50;
const CATEGORY_MAX: usize = 50;
const BARCODE_MAX: usize = 32;

/// Every field the item form shows, in form order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    ItemType,
    Category,
    Unit,
    Sku,
    HsnCode,
    Barcode,
    Description,
    ImageUrl,
    Price,
    CostPrice,
    WholesalePrice,
    GstRate,
    TaxType,
    PurchaseTaxType,
    Discount,
    DiscountType,
    StockQuantity,
    LowStockThreshold,
    OpeningStockDate,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Item Name *",
            Field::ItemType => "Type",
            Field::Category => "Category",
            Field::Unit => "Unit",
            Field::Sku => "SKU",
            Field::HsnCode => "HSN/SAC Code",
            Field::Barcode => "Barcode",
            Field::Description => "Description",
            Field::ImageUrl => "Image URL",
            Field::Price => "Selling Price *",
            Field::CostPrice => "Purchase Price",
            Field::WholesalePrice => "Wholesale Price",
            Field::GstRate => "GST Rate",
            Field::TaxType => "Sales Tax",
            Field::PurchaseTaxType => "Purchase Tax",
            Field::Discount => "Discount",
            Field::DiscountType => "Discount Type",
            Field::StockQuantity => "Opening Stock",
            Field::LowStockThreshold => "Low Stock Alert",
            Field::OpeningStockDate => "As of Date",
        }
    }

    /// Selector fields cycle through fixed values instead of taking text
    pub fn is_selector(&self) -> bool {
        matches!(
            self,
            Field::ItemType
                | Field::Unit
                | Field::GstRate
                | Field::TaxType
                | Field::PurchaseTaxType
                | Field::DiscountType
        )
    }
}

/// Raw form values as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub description: String,
    pub sku: String,
    pub hsn_code: String,
    pub price: String,
    pub cost_price: String,
    pub wholesale_price: String,
    pub stock_quantity: String,
    pub low_stock_threshold: String,
    pub opening_stock_date: String,
    pub image_url: String,
    pub barcode: String,
    pub category: String,
    pub discount: String,
    pub gst_rate: GstRate,
    pub unit: Unit,
    pub item_type: ItemType,
    pub tax_type: TaxType,
    pub purchase_tax_type: TaxType,
    pub discount_type: DiscountType,
}

impl ItemDraft {
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Name => &self.name,
            Field::Category => &self.category,
            Field::Sku => &self.sku,
            Field::HsnCode => &self.hsn_code,
            Field::Barcode => &self.barcode,
            Field::Description => &self.description,
            Field::ImageUrl => &self.image_url,
            Field::Price => &self.price,
            Field::CostPrice => &self.cost_price,
            Field::WholesalePrice => &self.wholesale_price,
            Field::Discount => &self.discount,
            Field::StockQuantity => &self.stock_quantity,
            Field::LowStockThreshold => &self.low_stock_threshold,
            Field::OpeningStockDate => &self.opening_stock_date,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        let value = match field {
            Field::Name => &mut self.name,
            Field::Category => &mut self.category,
            Field::Sku => &mut self.sku,
            Field::HsnCode => &mut self.hsn_code,
            Field::Barcode => &mut self.barcode,
            Field::Description => &mut self.description,
            Field::ImageUrl => &mut self.image_url,
            Field::Price => &mut self.price,
            Field::CostPrice => &mut self.cost_price,
            Field::WholesalePrice => &mut self.wholesale_price,
            Field::Discount => &mut self.discount,
            Field::StockQuantity => &mut self.stock_quantity,
            Field::LowStockThreshold => &mut self.low_stock_threshold,
            Field::OpeningStockDate => &mut self.opening_stock_date,
            _ => return None,
        };
        Some(value)
    }
}

/// Per-field validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) need attention", .errors.len())]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.errors.keys().copied()
    }

    pub fn clear(&mut self, field: Field) {
        self.errors.remove(&field);
    }
}

/// Check the draft against the item schema
pub fn validate(draft: &ItemDraft) -> Result<ItemInput, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let is_product = draft.item_type == ItemType::Product;

    let name = draft.name.trim();
    if name.is_empty() {
        errors.add(Field::Name, "Item name is required");
    } else if name.chars().count() > NAME_MAX {
        errors.add(Field::Name, format!("Name must be at most {} characters", NAME_MAX));
    }

    let description = draft.description.trim();
    if description.chars().count() > DESCRIPTION_MAX {
        errors.add(
            Field::Description,
            format!("Description must be at most {} characters", DESCRIPTION_MAX),
        );
    }

    let sku = draft.sku.trim();
    if sku.chars().count() > SKU_MAX {
        errors.add(Field::Sku, format!("SKU must be at most {} characters", SKU_MAX));
    } else if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'))
    {
        errors.add(Field::Sku, "SKU may only contain letters, digits, '-', '_' or '/'");
    }

    let hsn_code = draft.hsn_code.trim();
    if !hsn_code.is_empty()
        && !(matches!(hsn_code.len(), 4 | 6 | 8) && hsn_code.chars().all(|c| c.is_ascii_digit()))
    {
        errors.add(Field::HsnCode, "HSN/SAC code must be 4, 6 or 8 digits");
    }

    let price = check(&mut errors, Field::Price, parse_money(&draft.price, "Selling price", true));
    let cost_price = check(
        &mut errors,
        Field::CostPrice,
        parse_money(&draft.cost_price, "Purchase price", false),
    );
    let wholesale_price = check(
        &mut errors,
        Field::WholesalePrice,
        parse_money(&draft.wholesale_price, "Wholesale price", false),
    );

    let discount = check(
        &mut errors,
        Field::Discount,
        parse_money(&draft.discount, "Discount", false),
    )
    .flatten()
    .unwrap_or(Decimal::ZERO);
    match draft.discount_type {
        DiscountType::Percentage if discount > Decimal::ONE_HUNDRED => {
            errors.add(Field::Discount, "Discount cannot exceed 100%");
        }
        DiscountType::Flat => {
            if let Some(Some(price)) = price {
                if discount > price {
                    errors.add(Field::Discount, "Flat discount cannot exceed the selling price");
                }
            }
        }
        _ => {}
    }

    // Stock fields are hidden for services, so whatever they hold is ignored
    let (stock_quantity, low_stock_threshold, opening_stock_date) = if is_product {
        let stock = check(
            &mut errors,
            Field::StockQuantity,
            parse_count(&draft.stock_quantity, "Stock quantity"),
        );
        let threshold = check(
            &mut errors,
            Field::LowStockThreshold,
            parse_count(&draft.low_stock_threshold, "Low stock alert"),
        );
        let date = check(
            &mut errors,
            Field::OpeningStockDate,
            parse_date(&draft.opening_stock_date),
        );
        (
            stock.unwrap_or(0),
            threshold.unwrap_or(0),
            date.flatten(),
        )
    } else {
        (0, 0, None)
    };

    let image_url = draft.image_url.trim();
    if !image_url.is_empty() && !is_http_url(image_url) {
        errors.add(Field::ImageUrl, "Image URL must start with http:// or https://");
    }

    let barcode = draft.barcode.trim();
    if barcode.len() > BARCODE_MAX || !barcode.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.add(
            Field::Barcode,
            format!("Barcode must be letters and digits only (max {})", BARCODE_MAX),
        );
    }

    let category = draft.category.trim();
    if category.chars().count() > CATEGORY_MAX {
        errors.add(
            Field::Category,
            format!("Category must be at most {} characters", CATEGORY_MAX),
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ItemInput {
        name: name.to_string(),
        description: description.to_string(),
        sku: sku.to_string(),
        hsn_code: hsn_code.to_string(),
        price: price.flatten().unwrap_or(Decimal::ZERO),
        cost_price: cost_price.flatten().unwrap_or(Decimal::ZERO),
        stock_quantity,
        gst_rate: draft.gst_rate,
        unit: draft.unit,
        low_stock_threshold,
        item_type: draft.item_type,
        image_url: image_url.to_string(),
        barcode: barcode.to_string(),
        category: category.to_string(),
        tax_type: draft.tax_type,
        purchase_tax_type: draft.purchase_tax_type,
        discount,
        discount_type: draft.discount_type,
        wholesale_price: wholesale_price.flatten(),
        opening_stock_date,
    })
}

/// Record a field error and hand back the parsed value if there was one
fn check<T>(errors: &mut ValidationErrors, field: Field, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// Parse a money amount: at most two decimal places, never negative
fn parse_money(raw: &str, what: &str, required: bool) -> Result<Option<Decimal>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return if required {
            Err(format!("{} is required", what))
        } else {
            Ok(None)
        };
    }

    let value = Decimal::from_str(raw).map_err(|_| format!("{} must be a valid amount", what))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("{} cannot be negative", what));
    }
    if value.normalize().scale() > 2 {
        return Err(format!("{} can have at most 2 decimal places", what));
    }
    Ok(Some(value))
}

/// Parse a whole, non-negative count; empty means zero
fn parse_count(raw: &str, what: &str) -> Result<u32, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>()
        .map_err(|_| format!("{} must be a whole number of 0 or more", what))
}

fn parse_date(raw: &str) -> Result<Option<NaiveDate>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| "Opening stock date must be YYYY-MM-DD".to_string())
}

fn is_http_url(s: &str) -> bool {
    let rest = match s.strip_prefix("https://").or_else(|| s.strip_prefix("http://")) {
        Some(rest) => rest,
        None => return false,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    !host.is_empty() && !s.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ItemDraft {
        ItemDraft {
            name: "Masala Chai 250g".to_string(),
            price: "120".to_string(),
            cost_price: "95.50".to_string(),
            stock_quantity: "24".to_string(),
            low_stock_threshold: "5".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_product() {
        let input = validate(&draft()).unwrap();
        assert_eq!(input.name, "Masala Chai 250g");
        assert_eq!(input.price, Decimal::new(120, 0));
        assert_eq!(input.cost_price, Decimal::new(9550, 2));
        assert_eq!(input.stock_quantity, 24);
        assert_eq!(input.wholesale_price, None);
    }

    #[test]
    fn test_empty_name_is_required() {
        let mut d = draft();
        d.name = "   ".to_string();
        let errors = validate(&d).unwrap_err();
        assert_eq!(errors.get(Field::Name), Some("Item name is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut d = draft();
        d.name.clear();
        d.price = "abc".to_string();
        d.hsn_code = "12345".to_string();
        d.image_url = "ftp://example.com/a.png".to_string();
        let errors = validate(&d).unwrap_err();

        assert!(errors.contains(Field::Name));
        assert!(errors.contains(Field::Price));
        assert!(errors.contains(Field::HsnCode));
        assert!(errors.contains(Field::ImageUrl));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_price_rules() {
        let mut d = draft();
        d.price.clear();
        assert_eq!(
            validate(&d).unwrap_err().get(Field::Price),
            Some("Selling price is required")
        );

        d.price = "-1".to_string();
        assert_eq!(
            validate(&d).unwrap_err().get(Field::Price),
            Some("Selling price cannot be negative")
        );

        d.price = "10.555".to_string();
        assert!(validate(&d).unwrap_err().contains(Field::Price));

        d.price = "10.50".to_string();
        assert!(validate(&d).is_ok());
    }

    #[test]
    fn test_discount_limits() {
        let mut d = draft();
        d.discount = "150".to_string();
        assert_eq!(
            validate(&d).unwrap_err().get(Field::Discount),
            Some("Discount cannot exceed 100%")
        );

        d.discount_type = DiscountType::Flat;
        assert_eq!(
            validate(&d).unwrap_err().get(Field::Discount),
            Some("Flat discount cannot exceed the selling price")
        );

        d.discount = "20".to_string();
        assert_eq!(validate(&d).unwrap().discount, Decimal::new(20, 0));
    }

    #[test]
    fn test_service_ignores_stock_fields() {
        let mut d = draft();
        d.item_type = ItemType::Service;
        d.stock_quantity = "not a number".to_string();
        d.opening_stock_date = "yesterday".to_string();

        let input = validate(&d).unwrap();
        assert_eq!(input.stock_quantity, 0);
        assert_eq!(input.low_stock_threshold, 0);
        assert_eq!(input.opening_stock_date, None);
    }

    #[test]
    fn test_product_stock_fields() {
        let mut d = draft();
        d.stock_quantity = "-3".to_string();
        d.opening_stock_date = "2024-13-01".to_string();
        let errors = validate(&d).unwrap_err();
        assert!(errors.contains(Field::StockQuantity));
        assert!(errors.contains(Field::OpeningStockDate));

        d.stock_quantity = "3".to_string();
        d.opening_stock_date = "2024-04-01".to_string();
        let input = validate(&d).unwrap();
        assert_eq!(input.opening_stock_date, NaiveDate::from_ymd_opt(2024, 4, 1));
    }

    #[test]
    fn test_length_limits() {
        let cases: [(Field, usize, &str); 5] = [
            (Field::Name, 100, "Name must be at most 100 characters"),
            (Field::Description, 500, "Description must be at most 500 characters"),
            (Field::Sku, 50, "SKU must be at most 50 characters"),
            (Field::Category, 50, "Category must be at most 50 characters"),
            (Field::Barcode, 32, "Barcode must be letters and digits only (max 32)"),
        ];

        for (field, max, message) in cases {
            let mut d = draft();
            *d.text_mut(field).unwrap() = "a".repeat(max);
            assert!(validate(&d).is_ok(), "{:?} at {} chars", field, max);

            *d.text_mut(field).unwrap() = "a".repeat(max + 1);
            let errors = validate(&d).unwrap_err();
            assert_eq!(errors.get(field), Some(message));
            assert_eq!(errors.len(), 1);
        }
    }

    #[test]
    fn test_wholesale_price_rules() {
        let mut d = draft();
        d.wholesale_price = "-5".to_string();
        assert_eq!(
            validate(&d).unwrap_err().get(Field::WholesalePrice),
            Some("Wholesale price cannot be negative")
        );

        d.wholesale_price = "cheap".to_string();
        assert_eq!(
            validate(&d).unwrap_err().get(Field::WholesalePrice),
            Some("Wholesale price must be a valid amount")
        );

        d.wholesale_price = "110.25".to_string();
        assert_eq!(validate(&d).unwrap().wholesale_price, Some(Decimal::new(11025, 2)));
    }

    #[test]
    fn test_low_stock_threshold_must_be_a_count() {
        let mut d = draft();
        d.low_stock_threshold = "ten".to_string();
        assert_eq!(
            validate(&d).unwrap_err().get(Field::LowStockThreshold),
            Some("Low stock alert must be a whole number of 0 or more")
        );

        d.low_stock_threshold = "-1".to_string();
        assert!(validate(&d).unwrap_err().contains(Field::LowStockThreshold));

        d.low_stock_threshold.clear();
        assert_eq!(validate(&d).unwrap().low_stock_threshold, 0);
    }

    #[test]
    fn test_optional_codes() {
        let mut d = draft();
        d.hsn_code = "09024020".to_string();
        d.sku = "TEA/250-G".to_string();
        d.barcode = "8901234567890".to_string();
        d.image_url = "https://cdn.example.com/chai.png".to_string();
        assert!(validate(&d).is_ok());

        d.sku = "TEA 250".to_string();
        d.barcode = "890-123".to_string();
        d.image_url = "https:///nohost".to_string();
        let errors = validate(&d).unwrap_err();
        assert!(errors.contains(Field::Sku));
        assert!(errors.contains(Field::Barcode));
        assert!(errors.contains(Field::ImageUrl));
    }
}
