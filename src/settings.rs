//! `cohort.toml` loading

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cohort_core::EngineConfig;
use cohort_indexer::InventoryConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "cohort.toml";

/// Engine sections (`[batch]`, `[resolver]`, `[subdivision]`) plus `[inventory]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub engine: EngineConfig,
    pub inventory: InventoryConfig,
}

impl Settings {
    /// Load `explicit`, or `<root>/cohort.toml` when it exists, or defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_FILE);
                if !candidate.is_file() {
                    tracing::debug!("No {} under {}, using defaults", CONFIG_FILE, root.display());
                    return Ok(Settings::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let settings = Self::from_toml(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        if !(self.inventory.tokens_per_char > 0.0) {
            anyhow::bail!(
                "inventory.tokens_per_char must be positive, got {}",
                self.inventory.tokens_per_char
            );
        }
        Ok(())
    }
}
