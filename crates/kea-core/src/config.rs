//! Store configuration.
//!
//! All fields have defaults, so a config file only needs to list what it changes:
//!
//! ```rust
//! use kea_core::StoreConfig;
//!
//! let config = StoreConfig::from_yaml_str("recent_files_limit: 5\n").unwrap();
//! assert_eq!(config.recent_files_limit, 5);
//! assert_eq!(config.untitled_name, "Untitled");
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default number of recent files kept.
pub const DEFAULT_RECENT_FILES_LIMIT: usize = 10;

/// Default half-width (in characters) of the anchor token search window.
pub const DEFAULT_ANCHOR_WINDOW: usize = 64;

/// Largest accepted anchor window.
pub const MAX_ANCHOR_WINDOW: usize = 4096;

/// Tunables for [`crate::DocumentStore`] and its viewport translator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of entries in the recent-files list.
    pub recent_files_limit: usize,
    /// Display name for new untitled documents.
    pub untitled_name: String,
    /// Half-width of the window searched for an anchor token around the cursor.
    pub anchor_window: usize,
    /// When `false`, closing a dirty document never asks for confirmation.
    pub confirm_on_close: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            recent_files_limit: DEFAULT_RECENT_FILES_LIMIT,
            untitled_name: "Untitled".to_string(),
            anchor_window: DEFAULT_ANCHOR_WINDOW,
            confirm_on_close: true,
        }
    }
}

impl StoreConfig {
    /// Parse a YAML document, filling omitted fields with defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_files_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "recent_files_limit",
                message: "must be at least 1".to_string(),
            });
        }
        if self.anchor_window == 0 || self.anchor_window > MAX_ANCHOR_WINDOW {
            return Err(ConfigError::Invalid {
                field: "anchor_window",
                message: format!("must be between 1 and {MAX_ANCHOR_WINDOW}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(StoreConfig::from_yaml_str("").unwrap(), StoreConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config =
            StoreConfig::from_yaml_str("untitled_name: Draft\nconfirm_on_close: false\n").unwrap();
        assert_eq!(config.untitled_name, "Draft");
        assert!(!config.confirm_on_close);
        assert_eq!(config.recent_files_limit, DEFAULT_RECENT_FILES_LIMIT);
        assert_eq!(config.anchor_window, DEFAULT_ANCHOR_WINDOW);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = StoreConfig::from_yaml_str("recent_files_limit: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "recent_files_limit",
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_anchor_window_rejected() {
        for text in ["anchor_window: 0\n", "anchor_window: 18446744073709551615\n"] {
            let err = StoreConfig::from_yaml_str(text).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    field: "anchor_window",
                    ..
                }
            ));
        }
        let config = StoreConfig::from_yaml_str(&format!("anchor_window: {MAX_ANCHOR_WINDOW}\n"));
        assert_eq!(config.unwrap().anchor_window, MAX_ANCHOR_WINDOW);
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let err = StoreConfig::from_yaml_str("recent_files_limit: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
