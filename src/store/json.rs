//! Item service backed by a single JSON file.
//!
//! The whole inventory is small enough to live in memory: it is read on first
//! use, and every change rewrites the file through a temp file and a rename so
//! a crash never leaves half an inventory on disk.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ItemService, StoreError};
use crate::item::{Item, ItemId, ItemInput};

pub struct JsonStore {
    path: PathBuf,
    items: Mutex<Option<Vec<Item>>>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            items: Mutex::new(None),
        }
    }

    /// Default store location: `<data_dir>/stockbook/items.json`
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?
            .join("stockbook");
        Ok(data_dir.join("items.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<Vec<Item>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No item store at {}, starting empty", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, items: &[Item]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Run `f` against the loaded items, loading them first if needed
    async fn with_items<T>(
        &self,
        f: impl FnOnce(&mut Vec<Item>) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.items.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_file().await?);
        }
        let items = guard.get_or_insert_with(Vec::new);

        let mut working = items.clone();
        let (value, changed) = f(&mut working)?;
        if changed {
            self.write_file(&working).await?;
            *items = working;
        }
        Ok(value)
    }
}

fn ensure_unique_sku(items: &[Item], sku: &str, except: Option<ItemId>) -> Result<(), StoreError> {
    if sku.is_empty() {
        return Ok(());
    }
    let taken = items
        .iter()
        .any(|i| Some(i.id) != except && i.sku.eq_ignore_ascii_case(sku));
    if taken {
        return Err(StoreError::DuplicateSku(sku.to_string()));
    }
    Ok(())
}

#[async_trait]
impl ItemService for JsonStore {
    async fn create_item(&self, input: ItemInput) -> Result<Item, StoreError> {
        let item = self
            .with_items(|items| {
                ensure_unique_sku(items, &input.sku, None)?;
                let item = Item::from_input(Uuid::new_v4(), input, Utc::now());
                items.push(item.clone());
                Ok((item, true))
            })
            .await?;
        tracing::info!("Created item {} ({})", item.name, item.id);
        Ok(item)
    }

    async fn update_item(&self, id: ItemId, input: ItemInput) -> Result<Item, StoreError> {
        let item = self
            .with_items(|items| {
                ensure_unique_sku(items, &input.sku, Some(id))?;
                let item = items
                    .iter_mut()
                    .find(|i| i.id == id)
                    .ok_or(StoreError::NotFound(id))?;
                item.apply(input, Utc::now());
                Ok((item.clone(), true))
            })
            .await?;
        tracing::info!("Updated item {} ({})", item.name, item.id);
        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Item, StoreError> {
        self.with_items(|items| {
            let item = items
                .iter()
                .find(|i| i.id == id)
                .cloned()
                .ok_or(StoreError::NotFound(id))?;
            Ok((item, false))
        })
        .await
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        self.with_items(|items| {
            let mut sorted = items.clone();
            sorted.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            Ok((sorted, false))
        })
        .await
    }
}
