use crate::domain::model::RuleOrigin;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlocklistError {
    #[error("Attempted to serialize disallowed type {type_name}")]
    Disallowed {
        type_name: String,
        origin: RuleOrigin,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl BlocklistError {
    pub fn is_disallowed(&self) -> bool {
        matches!(self, BlocklistError::Disallowed { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BlocklistError::Disallowed { type_name, origin } => {
                format!("Type '{}' may not be serialized ({})", type_name, origin)
            }
            BlocklistError::SerializationError(e) => format!("Could not serialize value: {}", e),
            BlocklistError::IoError(e) => format!("File operation failed: {}", e),
            BlocklistError::ConfigError { message } => format!("Configuration problem: {}", message),
            BlocklistError::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            BlocklistError::InvalidConfigValueError { field, value, reason } => {
                format!("'{}' is not a valid value for '{}': {}", value, field, reason)
            }
            BlocklistError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BlocklistError::Disallowed { .. } => {
                "Remove the value from the payload or drop the rule that blocks its type"
            }
            BlocklistError::SerializationError(_) => {
                "Check the Serialize implementation of the value being written"
            }
            BlocklistError::IoError(_) => "Check that the file exists and is readable",
            BlocklistError::ConfigError { .. } | BlocklistError::ConfigValidationError { .. } => {
                "Check the TOML syntax of the configuration file"
            }
            BlocklistError::InvalidConfigValueError { .. } => {
                "Use Rust module paths such as `my_app::models` and non-empty type names"
            }
            BlocklistError::MissingConfigError { .. } => "Add the missing field to the configuration",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            BlocklistError::Disallowed { .. } => 3,
            BlocklistError::ConfigError { .. }
            | BlocklistError::ConfigValidationError { .. }
            | BlocklistError::InvalidConfigValueError { .. }
            | BlocklistError::MissingConfigError { .. } => 2,
            BlocklistError::SerializationError(_) | BlocklistError::IoError(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, BlocklistError>;
