use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::debug;

use crate::{
    currency::{default_rate, NumberLocale},
    utils::paths,
};

const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration file is malformed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub home_currency: String,
    pub display_currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub default_rate: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            home_currency: "JPY".into(),
            display_currency: "TWD".into(),
            default_rate: default_rate(),
            data_dir: None,
            color: true,
        }
    }
}

impl Config {
    /// Number separators for the configured locale; unknown tags format en-US.
    pub fn number_locale(&self) -> NumberLocale {
        NumberLocale::for_tag(&self.locale).unwrap_or_default()
    }

    pub const KEYS: [&'static str; 5] = [
        "locale",
        "home_currency",
        "display_currency",
        "default_rate",
        "color",
    ];

    /// Updates one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();
        match key {
            "locale" => {
                self.locale = NumberLocale::canonical_tag(value)
                    .ok_or_else(invalid)?
                    .to_string();
            }
            "home_currency" | "display_currency" => {
                if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(invalid());
                }
                let code = value.to_ascii_uppercase();
                if key == "home_currency" {
                    self.home_currency = code;
                } else {
                    self.display_currency = code;
                }
            }
            "default_rate" => {
                let rate = Decimal::from_str(value)
                    .ok()
                    .filter(|rate| *rate > Decimal::ZERO)
                    .ok_or_else(invalid)?;
                self.default_rate = rate.normalize();
            }
            "color" => {
                self.color = match value.to_ascii_lowercase().as_str() {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    _ => return Err(invalid()),
                }
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        Ok(match key {
            "locale" => self.locale.clone(),
            "home_currency" => self.home_currency.clone(),
            "display_currency" => self.display_currency.clone(),
            "default_rate" => self.default_rate.normalize().to_string(),
            "color" => if self.color { "on" } else { "off" }.to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        })
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: paths::config_file_in(&base),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            debug!(path = %self.path.display(), "no config file; using defaults");
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), ConfigError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
