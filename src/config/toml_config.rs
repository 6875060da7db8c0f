use crate::adapters::SheetFiles;
use crate::core::ConfigProvider;
use crate::utils::error::{CheckinError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub name: String,
    /// Sessions only carry day and month; this is the year they fall in.
    pub year: i32,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            name: "event".to_string(),
            year: 2025,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: String,
    pub files: SheetFiles,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            files: SheetFiles::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub open_before_minutes: i64,
    pub close_after_minutes: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            open_before_minutes: 60,
            close_after_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub timeout_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the compact format.
    #[serde(default)]
    pub json: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CheckinError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CheckinError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CHECKIN_DATA_DIR})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("event.name", &self.event.name)?;
        validate_range("event.year", self.event.year, 1970, 9999)?;
        validate_path("store.data_dir", &self.store.data_dir)?;
        for (field, file) in [
            ("store.files.attendees", &self.store.files.attendees),
            ("store.files.sessions", &self.store.files.sessions),
            ("store.files.general_attendance", &self.store.files.general_attendance),
            ("store.files.session_attendance", &self.store.files.session_attendance),
        ] {
            validate_path(field, file)?;
        }
        validate_range("window.open_before_minutes", self.window.open_before_minutes, 0, 24 * 60)?;
        validate_range("window.close_after_minutes", self.window.close_after_minutes, 0, 24 * 60)?;
        validate_positive_number("lock.timeout_ms", self.lock.timeout_ms, 1)?;
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn data_dir(&self) -> &str {
        &self.store.data_dir
    }

    fn event_year(&self) -> i32 {
        self.event.year
    }

    fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock.timeout_ms)
    }

    fn open_before_minutes(&self) -> i64 {
        self.window.open_before_minutes
    }

    fn close_after_minutes(&self) -> i64 {
        self.window.close_after_minutes
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
