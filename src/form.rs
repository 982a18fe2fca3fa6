//! Item form state: text buffers, tabs, the product/service toggle and the
//! submit flow (validate, save, then navigate away or reset).

use rust_decimal::Decimal;

use crate::config::FormDefaults;
use crate::item::{validate, Field, Item, ItemDraft, ItemId, ItemInput, ItemType, ValidationErrors};
use crate::nav::{Navigator, Route};
use crate::notify::Notifier;
use crate::store::{ItemService, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Basic,
    Pricing,
    Stock,
}

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Basic => "Basic Info",
            Tab::Pricing => "Pricing & Tax",
            Tab::Stock => "Stock",
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        match self {
            Tab::Basic => &[
                Field::Name,
                Field::ItemType,
                Field::Category,
                Field::Unit,
                Field::Sku,
                Field::HsnCode,
                Field::Barcode,
                Field::Description,
                Field::ImageUrl,
            ],
            Tab::Pricing => &[
                Field::Price,
                Field::CostPrice,
                Field::WholesalePrice,
                Field::GstRate,
                Field::TaxType,
                Field::PurchaseTaxType,
                Field::Discount,
                Field::DiscountType,
            ],
            Tab::Stock => &[
                Field::StockQuantity,
                Field::LowStockThreshold,
                Field::OpeningStockDate,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Save, then leave the form
    Save,
    /// Save, then start over with a blank form of the same type
    SaveAndNew,
}

/// A validated submission waiting for the item service
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub id: Option<ItemId>,
    pub input: ItemInput,
    pub mode: SubmitMode,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitBlocked {
    #[error("A save is already in progress")]
    InFlight,

    #[error(transparent)]
    Invalid(ValidationErrors),
}

/// Send a request to the service: create when there is no id, update otherwise
pub async fn save(service: &dyn ItemService, request: &SaveRequest) -> Result<Item, StoreError> {
    match request.id {
        Some(id) => service.update_item(id, request.input.clone()).await,
        None => service.create_item(request.input.clone()).await,
    }
}

#[derive(Debug, Clone)]
pub struct ItemForm {
    draft: ItemDraft,
    existing: Option<ItemId>,
    defaults: FormDefaults,
    tab: Tab,
    focus: usize,
    errors: ValidationErrors,
    submitting: bool,
    dirty: bool,
}

impl ItemForm {
    /// Form for editing `existing`, or a blank one built from `defaults`
    pub fn new(existing: Option<&Item>, defaults: &FormDefaults) -> Self {
        let draft = match existing {
            Some(item) => draft_from_item(item),
            None => blank_draft(defaults),
        };

        Self {
            draft,
            existing: existing.map(|i| i.id),
            defaults: defaults.clone(),
            tab: Tab::Basic,
            focus: 0,
            errors: ValidationErrors::default(),
            submitting: false,
            dirty: false,
        }
    }

    pub fn with_item_type(mut self, item_type: ItemType) -> Self {
        self.draft.item_type = item_type;
        self
    }

    pub fn draft(&self) -> &ItemDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn existing_id(&self) -> Option<ItemId> {
        self.existing
    }

    pub fn is_edit(&self) -> bool {
        self.existing.is_some()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn item_type(&self) -> ItemType {
        self.draft.item_type
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn focused_field(&self) -> Field {
        let fields = self.tab.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    /// Stock only makes sense for products
    pub fn visible_tabs(&self) -> Vec<Tab> {
        match self.draft.item_type {
            ItemType::Product => vec![Tab::Basic, Tab::Pricing, Tab::Stock],
            ItemType::Service => vec![Tab::Basic, Tab::Pricing],
        }
    }

    pub fn set_item_type(&mut self, item_type: ItemType) {
        if self.draft.item_type == item_type {
            return;
        }
        self.draft.item_type = item_type;
        self.dirty = true;

        if item_type == ItemType::Service {
            for field in Tab::Stock.fields() {
                self.errors.clear(*field);
            }
            if self.tab == Tab::Stock {
                self.select_tab(Tab::Basic);
            }
        }
    }

    pub fn toggle_item_type(&mut self) {
        self.set_item_type(self.draft.item_type.toggle());
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.visible_tabs().contains(&tab) {
            self.tab = tab;
            self.focus = 0;
        }
    }

    pub fn next_tab(&mut self) {
        let tabs = self.visible_tabs();
        let idx = tabs.iter().position(|t| *t == self.tab).unwrap_or(0);
        self.select_tab(tabs[(idx + 1) % tabs.len()]);
    }

    pub fn prev_tab(&mut self) {
        let tabs = self.visible_tabs();
        let idx = tabs.iter().position(|t| *t == self.tab).unwrap_or(0);
        self.select_tab(tabs[idx.checked_sub(1).unwrap_or(tabs.len() - 1)]);
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.tab.fields().len();
    }

    pub fn focus_prev(&mut self) {
        let len = self.tab.fields().len();
        self.focus = self.focus.checked_sub(1).unwrap_or(len - 1);
    }

    pub fn focus_field(&mut self, field: Field) {
        for tab in self.visible_tabs() {
            if let Some(idx) = tab.fields().iter().position(|f| *f == field) {
                self.tab = tab;
                self.focus = idx;
                return;
            }
        }
    }

    /// Type a character into the focused text field
    pub fn input_char(&mut self, c: char) {
        let field = self.focused_field();
        if !accepts_char(field, c) {
            return;
        }
        if let Some(buffer) = self.draft.text_mut(field) {
            buffer.push(c);
            self.errors.clear(field);
            self.dirty = true;
        }
    }

    pub fn backspace(&mut self) {
        let field = self.focused_field();
        if let Some(buffer) = self.draft.text_mut(field) {
            if buffer.pop().is_some() {
                self.errors.clear(field);
                self.dirty = true;
            }
        }
    }

    /// Advance the focused selector to its next value
    pub fn cycle_selection(&mut self) {
        let field = self.focused_field();
        match field {
            Field::ItemType => return self.toggle_item_type(),
            Field::Unit => self.draft.unit = self.draft.unit.next(),
            Field::GstRate => self.draft.gst_rate = self.draft.gst_rate.next(),
            Field::TaxType => self.draft.tax_type = self.draft.tax_type.next(),
            Field::PurchaseTaxType => {
                self.draft.purchase_tax_type = self.draft.purchase_tax_type.next()
            }
            Field::DiscountType => {
                self.draft.discount_type = self.draft.discount_type.next();
                self.errors.clear(Field::Discount);
            }
            _ => return,
        }
        self.dirty = true;
    }

    /// Display value for a field, text or selector label
    pub fn display_value(&self, field: Field) -> String {
        if let Some(text) = self.draft.text(field) {
            return text.to_string();
        }
        match field {
            Field::ItemType => self.draft.item_type.label().to_string(),
            Field::Unit => self.draft.unit.label().to_string(),
            Field::GstRate => format!("GST @ {}", self.draft.gst_rate),
            Field::TaxType => self.draft.tax_type.label().to_string(),
            Field::PurchaseTaxType => self.draft.purchase_tax_type.label().to_string(),
            Field::DiscountType => self.draft.discount_type.label().to_string(),
            _ => String::new(),
        }
    }

    /// Validate and mark the form as submitting.
    ///
    /// Only one request may be in flight per form; the flag is cleared again by
    /// [`ItemForm::finish_submit`].
    pub fn begin_submit(&mut self, mode: SubmitMode) -> Result<SaveRequest, SubmitBlocked> {
        if self.submitting {
            return Err(SubmitBlocked::InFlight);
        }

        match validate(&self.draft) {
            Ok(input) => {
                self.errors = ValidationErrors::default();
                self.submitting = true;
                Ok(SaveRequest {
                    id: self.existing,
                    input,
                    mode,
                })
            }
            Err(errors) => {
                tracing::debug!("Item form blocked by {} field error(s)", errors.len());
                // Field order follows form order, so this is the first bad field on screen
                if let Some(first) = errors.fields().next() {
                    self.focus_field(first);
                }
                self.errors = errors.clone();
                Err(SubmitBlocked::Invalid(errors))
            }
        }
    }

    /// Apply the service result to the form
    pub fn finish_submit(
        &mut self,
        request: &SaveRequest,
        result: Result<Item, StoreError>,
        navigator: &mut dyn Navigator,
        notifier: &mut dyn Notifier,
    ) {
        self.submitting = false;

        match result {
            Ok(item) => {
                let verb = if request.id.is_some() { "updated" } else { "created" };
                notifier.success(&format!("Item '{}' {} successfully", item.name, verb));
                self.dirty = false;

                match request.mode {
                    SubmitMode::SaveAndNew => self.reset(),
                    SubmitMode::Save if request.id.is_some() => navigator.go_back(),
                    SubmitMode::Save => navigator.go_to(Route::Inventory),
                }
                navigator.refresh_current_view();
            }
            Err(e) => {
                tracing::error!("Failed to save item: {}", e);
                notifier.error(&format!("Failed to save item: {}", e));
            }
        }
    }

    /// Validate, call create/update, then apply the result
    pub async fn submit(
        &mut self,
        mode: SubmitMode,
        service: &dyn ItemService,
        navigator: &mut dyn Navigator,
        notifier: &mut dyn Notifier,
    ) -> Result<(), SubmitBlocked> {
        let request = self.begin_submit(mode)?;
        let result = save(service, &request).await;
        self.finish_submit(&request, result, navigator, notifier);
        Ok(())
    }

    /// Blank form in create mode, keeping only the selected item type
    pub fn reset(&mut self) {
        let item_type = self.draft.item_type;
        self.draft = blank_draft(&self.defaults);
        self.draft.item_type = item_type;
        self.existing = None;
        self.tab = Tab::Basic;
        self.focus = 0;
        self.errors = ValidationErrors::default();
        self.submitting = false;
        self.dirty = false;
    }
}

fn blank_draft(defaults: &FormDefaults) -> ItemDraft {
    ItemDraft {
        stock_quantity: "0".to_string(),
        low_stock_threshold: defaults.low_stock_threshold.to_string(),
        discount: "0".to_string(),
        gst_rate: defaults.gst_rate,
        unit: defaults.unit,
        item_type: defaults.item_type,
        tax_type: defaults.tax_type,
        purchase_tax_type: defaults.purchase_tax_type,
        discount_type: defaults.discount_type,
        ..Default::default()
    }
}

fn draft_from_item(item: &Item) -> ItemDraft {
    let money = |d: Decimal| d.normalize().to_string();

    ItemDraft {
        name: item.name.clone(),
        description: item.description.clone(),
        sku: item.sku.clone(),
        hsn_code: item.hsn_code.clone(),
        price: money(item.price),
        cost_price: money(item.cost_price),
        wholesale_price: item.wholesale_price.map(money).unwrap_or_default(),
        stock_quantity: item.stock_quantity.to_string(),
        low_stock_threshold: item.low_stock_threshold.to_string(),
        opening_stock_date: item
            .opening_stock_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        image_url: item.image_url.clone(),
        barcode: item.barcode.clone(),
        category: item.category.clone(),
        discount: money(item.discount),
        gst_rate: item.gst_rate,
        unit: item.unit,
        item_type: item.item_type,
        tax_type: item.tax_type,
        purchase_tax_type: item.purchase_tax_type,
        discount_type: item.discount_type,
    }
}

/// Numeric fields only take the characters they can parse
fn accepts_char(field: Field, c: char) -> bool {
    if c.is_control() {
        return false;
    }
    match field {
        Field::Price | Field::CostPrice | Field::WholesalePrice | Field::Discount => {
            c.is_ascii_digit() || c == '.'
        }
        Field::StockQuantity | Field::LowStockThreshold | Field::HsnCode => c.is_ascii_digit(),
        Field::OpeningStockDate => c.is_ascii_digit() || c == '-',
        _ => true,
    }
}
