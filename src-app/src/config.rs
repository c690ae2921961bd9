//! Application Configuration
//!
//! Read from the process environment (after `.env` is loaded by `main`).

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "card_board.db";
pub const DEFAULT_OWNER: &str = "local";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must not be empty")]
    Empty { name: &'static str },
    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `CARD_BOARD_DB`
    pub db_path: PathBuf,
    /// `CARD_BOARD_OWNER`, the signed-in user
    pub owner: String,
    /// `CARD_BOARD_LOG_DIR`
    pub log_dir: PathBuf,
    /// `RUST_LOG`
    pub log_filter: String,
    /// `CARD_BOARD_NOTIFY_CAPACITY`
    pub notification_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset variables take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let owner = lookup("CARD_BOARD_OWNER").unwrap_or_else(|| DEFAULT_OWNER.to_string());
        if owner.trim().is_empty() {
            return Err(ConfigError::Empty { name: "CARD_BOARD_OWNER" });
        }

        let notification_capacity = match lookup("CARD_BOARD_NOTIFY_CAPACITY") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                name: "CARD_BOARD_NOTIFY_CAPACITY",
                value,
            })?,
            None => card_board::SyncConfig::default().notification_capacity,
        };

        Ok(Self {
            db_path: lookup("CARD_BOARD_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()).into(),
            owner: owner.trim().to_string(),
            log_dir: lookup("CARD_BOARD_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()).into(),
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            notification_capacity,
        })
    }

    pub fn sync_config(&self) -> card_board::SyncConfig {
        card_board::SyncConfig {
            notification_capacity: self.notification_capacity,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.owner, DEFAULT_OWNER);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.notification_capacity, 64);
    }

    #[test]
    fn test_values_from_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CARD_BOARD_DB", "/tmp/cards.db"),
            ("CARD_BOARD_OWNER", " alice "),
            ("CARD_BOARD_NOTIFY_CAPACITY", "8"),
            ("RUST_LOG", "card_board=debug"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/cards.db"));
        assert_eq!(config.owner, "alice");
        assert_eq!(config.sync_config().notification_capacity, 8);
        assert_eq!(config.log_filter, "card_board=debug");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("CARD_BOARD_OWNER", "  ")])),
            Err(ConfigError::Empty { name: "CARD_BOARD_OWNER" })
        );
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("CARD_BOARD_NOTIFY_CAPACITY", "many")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
