use figment::{Figment, providers::{Env, Format, Json, Serialized, Toml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::LogmoError;
use crate::export::environment::AppInfo;
use crate::loggers::console::DEFAULT_DATE_FORMAT;
use crate::loggers::core::Level;
use crate::loggers::printer::check_date_format;

pub mod preferences;

pub use preferences::{FilePreferences, MemoryPreferences, PreferenceStore};

/// Name of the preference scope used when nothing else is configured.
pub const DEFAULT_SCOPE: &str = "logmo";
pub const DEFAULT_EXPORT_TITLE: &str = "Export Logs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogmoConfig {
    /// Preference scope holding `filterPatterns`, `showFilters`, `showSearchBar`.
    pub scope: String,
    pub preferences_dir: PathBuf,
    /// Where export files are created; they never outlive one export.
    pub export_dir: PathBuf,
    pub date_format: String,
    pub export_title: String,
    /// Minimum level a logger built from this config lets through.
    pub level: Level,
    pub app: AppInfo,
}

impl Default for LogmoConfig {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE.to_string(),
            preferences_dir: dirs::config_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(DEFAULT_SCOPE),
            export_dir: std::env::temp_dir(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            export_title: DEFAULT_EXPORT_TITLE.to_string(),
            level: Level::Debug,
            app: AppInfo::default(),
        }
    }
}

impl LogmoConfig {
    /// Defaults merged with `LOGMO_` env vars (`__` separates nested keys).
    pub fn from_env() -> Result<Self, LogmoError> {
        Self::figment(None).extract::<Self>()?.validated()
    }

    /// LOCAL: defaults + file (JSON by extension, TOML otherwise) + `LOGMO_`
    /// env vars. Fails if the file is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogmoError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LogmoError::Config(format!(
                "Local file not found: {}",
                path.display()
            )));
        }

        Self::figment(Some(path)).extract::<Self>()?.validated()
    }

    fn validated(self) -> Result<Self, LogmoError> {
        check_date_format(&self.date_format)?;
        Ok(self)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(LogmoConfig::default()));
        if let Some(path) = path {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        figment.merge(Env::prefixed("LOGMO_").split("__"))
    }
}
