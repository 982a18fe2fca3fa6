use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::item::{DiscountType, GstRate, ItemType, TaxType, Unit};

/// Values a fresh item form starts with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefaults {
    #[serde(default)]
    pub item_type: ItemType,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub gst_rate: GstRate,
    #[serde(default)]
    pub tax_type: TaxType,
    #[serde(default)]
    pub purchase_tax_type: TaxType,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,
}

fn default_low_stock_threshold() -> u32 {
    10
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            item_type: ItemType::default(),
            unit: Unit::default(),
            gst_rate: GstRate::default(),
            tax_type: TaxType::default(),
            purchase_tax_type: TaxType::default(),
            discount_type: DiscountType::default(),
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

/// Optional hex colour overrides (`#RRGGBB` or `#RGB`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Item store file (defaults to `<data_dir>/stockbook/items.json`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Show desktop notifications on save
    #[serde(default)]
    pub notifications: bool,

    #[serde(default)]
    pub defaults: FormDefaults,

    #[serde(default)]
    pub theme: ThemeConfig,
}

impl AppConfig {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("stockbook");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location, or create it
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => Ok(AppConfig::default()),
        }
    }

    /// Load config from `path`; unreadable or invalid files fall back to defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to parse config: {}", e);
                        return Ok(AppConfig::default());
                    }
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        if let Err(e) = config.save_to(path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Clean up the config before saving
        let mut clean_config = self.clone();

        if clean_config
            .store_path
            .as_ref()
            .map(|p| p.as_os_str().is_empty())
            .unwrap_or(false)
        {
            clean_config.store_path = None;
        }

        // Drop colour overrides that would not parse on the next start
        for slot in [
            &mut clean_config.theme.accent,
            &mut clean_config.theme.danger,
            &mut clean_config.theme.success,
            &mut clean_config.theme.warning,
            &mut clean_config.theme.text,
        ] {
            if slot
                .as_deref()
                .map(|s| crate::theme::parse_hex_color(s).is_none())
                .unwrap_or(false)
            {
                *slot = None;
            }
        }

        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            store_path: Some(PathBuf::from("/srv/shop/items.json")),
            notifications: true,
            defaults: FormDefaults {
                item_type: ItemType::Service,
                unit: Unit::Hrs,
                gst_rate: GstRate::from_bps(1200).unwrap(),
                tax_type: TaxType::Inclusive,
                purchase_tax_type: TaxType::Exclusive,
                discount_type: DiscountType::Flat,
                low_stock_threshold: 3,
            },
            theme: ThemeConfig {
                accent: Some("#FFC107".to_string()),
                ..Default::default()
            },
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.store_path, deserialized.store_path);
        assert_eq!(config.defaults, deserialized.defaults);
        assert_eq!(config.theme, deserialized.theme);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("notifications = true\n[defaults]\nunit = \"kg\"\n").unwrap();
        assert!(config.notifications);
        assert_eq!(config.defaults.unit, Unit::Kg);
        assert_eq!(config.defaults.low_stock_threshold, 10);
        assert_eq!(config.defaults.gst_rate, GstRate::default());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from(&path).unwrap();
        assert!(!config.notifications);
        assert!(path.exists());
    }

    #[test]
    fn test_save_drops_invalid_colours() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.theme.accent = Some("not-a-colour".to_string());
        config.theme.danger = Some("#D35F5F".to_string());
        config.save_to(&path).unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.theme.accent, None);
        assert_eq!(reloaded.theme.danger.as_deref(), Some("#D35F5F"));
    }
}
