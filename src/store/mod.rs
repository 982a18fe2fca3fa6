pub mod json;

use async_trait::async_trait;

use crate::item::{Item, ItemId, ItemInput};

pub use json::JsonStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("SKU '{0}' is already used by another item")]
    DuplicateSku(String),

    #[error("Could not access item store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Item store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Create/update operations the item form submits to
#[async_trait]
pub trait ItemService: Send + Sync {
    async fn create_item(&self, input: ItemInput) -> Result<Item, StoreError>;

    async fn update_item(&self, id: ItemId, input: ItemInput) -> Result<Item, StoreError>;

    async fn get_item(&self, id: ItemId) -> Result<Item, StoreError>;

    /// All items, sorted by name
    async fn list_items(&self) -> Result<Vec<Item>, StoreError>;
}
