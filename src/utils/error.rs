use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckinError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed sheet data: {message}")]
    DataError { message: String },

    #[error("Could not acquire registration lock within {timeout_ms} ms")]
    LockTimeout { timeout_ms: u64 },

    #[error("Record store unavailable: {message}")]
    StoreError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Concurrency,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CheckinError {
    pub fn data(message: impl Into<String>) -> Self {
        Self::DataError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::DataError { .. } | Self::SerializationError(_) => ErrorCategory::Data,
            Self::LockTimeout { .. } => ErrorCategory::Concurrency,
            Self::CsvError(_) | Self::IoError(_) | Self::StoreError { .. } => {
                ErrorCategory::Storage
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 另一個請求持有鎖，稍後重試即可
            ErrorCategory::Concurrency => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("The event data could not be read: {}", self),
            ErrorCategory::Concurrency => {
                "The system is busy processing another registration".to_string()
            }
            ErrorCategory::Storage => "The attendance records are unavailable".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Check the configuration file and command line flags"
            }
            Self::DataError { .. } | Self::SerializationError(_) => {
                "Fix the offending row in the sheet and try again"
            }
            Self::LockTimeout { .. } => "Wait a moment and submit the registration again",
            Self::CsvError(_) | Self::IoError(_) | Self::StoreError { .. } => {
                "Verify the data directory exists and is readable and writable"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckinError>;
