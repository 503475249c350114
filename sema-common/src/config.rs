//! Configuration loading for SEMA
//!
//! Resolution priority: environment variables → TOML file → defaults.
//! The database holds model revisions, not settings, so there is no
//! database tier here.
//!
//! Environment overrides:
//! - `SEMA_CONFIG` — path to the TOML file
//! - `SEMA_BIND_ADDRESS` — service listen address
//! - `SEMA_DATABASE_PATH` — SQLite model store path

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level TOML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Service listen address
    pub bind_address: String,
    /// SQLite model store path
    pub database_path: PathBuf,
    /// Baseline training settings
    pub training: TrainingSection,
}

/// Baseline training settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSection {
    /// Shuffle/init seed: two runs on identical input with the same seed
    /// produce identical model weights
    pub seed: u64,
    /// Fixed epoch budget (not adaptive)
    pub epochs: usize,
    /// Minibatch size
    pub batch_size: usize,
    /// Gradient descent learning rate
    pub learning_rate: f32,
    /// Hidden layer width (both hidden layers)
    pub hidden_width: usize,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5730".to_string(),
            database_path: PathBuf::from("sema.db"),
            training: TrainingSection::default(),
        }
    }
}

impl Default for TrainingSection {
    fn default() -> Self {
        Self {
            seed: 42,
            epochs: 120,
            batch_size: 16,
            learning_rate: 0.05,
            hidden_width: 20,
        }
    }
}

impl TomlConfig {
    /// Load configuration with ENV → TOML → default resolution
    ///
    /// A missing config file is not an error (defaults apply); a present
    /// but unparseable file is.
    pub fn resolve() -> Result<Self> {
        let path = std::env::var("SEMA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("sema.toml"));

        let mut config = if path.exists() {
            let loaded = Self::load(&path)?;
            info!("Configuration loaded from {}", path.display());
            loaded
        } else {
            warn!(
                "No config file at {}, using defaults",
                path.display()
            );
            Self::default()
        };

        if let Ok(addr) = std::env::var("SEMA_BIND_ADDRESS") {
            info!("Bind address overridden from environment");
            config.bind_address = addr;
        }
        if let Ok(db) = std::env::var("SEMA_DATABASE_PATH") {
            info!("Database path overridden from environment");
            config.database_path = PathBuf::from(db);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate ranges that would otherwise fail far from their cause
    fn validate(&self) -> Result<()> {
        if self.training.epochs == 0 {
            return Err(Error::Config("training.epochs must be at least 1".into()));
        }
        if self.training.batch_size == 0 {
            return Err(Error::Config("training.batch_size must be at least 1".into()));
        }
        if !(self.training.learning_rate > 0.0) {
            return Err(Error::Config(
                "training.learning_rate must be positive".into(),
            ));
        }
        if self.training.hidden_width == 0 {
            return Err(Error::Config("training.hidden_width must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = TomlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.training.seed, 42);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address = \"0.0.0.0:9000\"").unwrap();
        writeln!(file, "[training]").unwrap();
        writeln!(file, "epochs = 50").unwrap();

        let config = TomlConfig::load(file.path()).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.training.epochs, 50);
        // Unspecified fields keep defaults
        assert_eq!(config.training.batch_size, 16);
        assert_eq!(config.database_path, PathBuf::from("sema.db"));
    }

    #[test]
    fn test_invalid_training_section_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[training]").unwrap();
        writeln!(file, "epochs = 0").unwrap();

        assert!(TomlConfig::load(file.path()).is_err());
    }
}
