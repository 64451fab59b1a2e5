use std::path::{Path, PathBuf};

use buddy_domain::{OwnerId, WindowPreset};
use rust_decimal::Decimal;
use serde::{de::Deserializer, Deserialize, Serialize};

use crate::ConfigError;

const DATA_DIR: &str = "data";

/// User-configurable shell preferences and analytics defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_currency")]
    pub currency: String,

    /// Assigned on first launch and kept for every later session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,

    #[serde(default, deserialize_with = "lenient_window")]
    pub default_window: WindowPreset,
    #[serde(default = "Config::default_trend_months")]
    pub trend_months: u32,
    #[serde(default = "Config::default_top_n")]
    pub top_n: usize,
    #[serde(default = "Config::default_budget_margin")]
    pub budget_margin: Decimal,
    #[serde(default = "Config::default_attachment_base_url")]
    pub attachment_base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root for expense files and receipts. Defaults to `<home>/data`.
    pub data_root: Option<PathBuf>,

    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: Self::default_currency(),
            owner_id: None,
            default_window: WindowPreset::default(),
            trend_months: Self::default_trend_months(),
            top_n: Self::default_top_n(),
            budget_margin: Self::default_budget_margin(),
            attachment_base_url: Self::default_attachment_base_url(),
            data_root: None,
            ui_color_enabled: Self::default_ui_color_enabled(),
        }
    }
}

impl Config {
    /// Keys accepted by [`Config::set`].
    pub const KEYS: [&'static str; 8] = [
        "currency",
        "default_window",
        "trend_months",
        "top_n",
        "budget_margin",
        "attachment_base_url",
        "data_root",
        "ui_color_enabled",
    ];

    pub fn default_currency() -> String {
        "USD".into()
    }

    pub fn default_trend_months() -> u32 {
        6
    }

    pub fn default_top_n() -> usize {
        5
    }

    pub fn default_budget_margin() -> Decimal {
        Decimal::new(1, 1)
    }

    pub fn default_attachment_base_url() -> String {
        "file://receipts".into()
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_root(&self, home: &Path) -> PathBuf {
        match &self.data_root {
            Some(path) => path.clone(),
            None => home.join(DATA_DIR),
        }
    }

    /// Returns the owner id, assigning a fresh one when none is stored yet.
    /// The flag is `true` when the caller should persist the change.
    pub fn ensure_owner(&mut self) -> (OwnerId, bool) {
        match self.owner_id {
            Some(owner) => (owner, false),
            None => {
                let owner = OwnerId::new();
                self.owner_id = Some(owner);
                (owner, true)
            }
        }
    }

    /// Updates a single preference from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: key.to_string(),
            reason,
        };
        match key {
            "currency" => {
                if value.is_empty() {
                    return Err(invalid("currency cannot be empty".into()));
                }
                self.currency = value.to_ascii_uppercase();
            }
            "default_window" => {
                self.default_window = value.parse().map_err(|err| invalid(format!("{err}")))?;
            }
            "trend_months" => {
                let months: u32 = value.parse().map_err(|_| invalid("expected a number".into()))?;
                if months == 0 {
                    return Err(invalid("must be at least 1".into()));
                }
                self.trend_months = months;
            }
            "top_n" => {
                let n: usize = value.parse().map_err(|_| invalid("expected a number".into()))?;
                if n == 0 {
                    return Err(invalid("must be at least 1".into()));
                }
                self.top_n = n;
            }
            "budget_margin" => {
                let margin: Decimal = value
                    .parse()
                    .map_err(|_| invalid("expected a decimal such as 0.1".into()))?;
                if margin < Decimal::ZERO {
                    return Err(invalid("must not be negative".into()));
                }
                self.budget_margin = margin;
            }
            "attachment_base_url" => {
                self.attachment_base_url = value.trim_end_matches('/').to_string();
            }
            "data_root" => {
                self.data_root = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "ui_color_enabled" => {
                self.ui_color_enabled = match value.to_ascii_lowercase().as_str() {
                    "true" | "on" | "yes" => true,
                    "false" | "off" | "no" => false,
                    _ => return Err(invalid("expected on or off".into())),
                };
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Textual form of a preference, as shown by the `config` command.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        let value = match key {
            "currency" => self.currency.clone(),
            "default_window" => self.default_window.label().to_string(),
            "trend_months" => self.trend_months.to_string(),
            "top_n" => self.top_n.to_string(),
            "budget_margin" => self.budget_margin.to_string(),
            "attachment_base_url" => self.attachment_base_url.clone(),
            "data_root" => self
                .data_root
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "(default)".into()),
            "ui_color_enabled" => self.ui_color_enabled.to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }
}

// Unknown window names fall back to the default instead of failing the whole file.
fn lenient_window<'de, D>(deserializer: D) -> Result<WindowPreset, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default())
}
