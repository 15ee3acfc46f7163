use crate::utils::error::{BlocklistError, Result};
use regex::Regex;
use std::sync::LazyLock;

static MODULE_PATH: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$"));

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_module_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BlocklistError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Module path cannot be empty".to_string(),
        });
    }

    let re = MODULE_PATH.as_ref().map_err(|e| BlocklistError::ConfigError {
        message: format!("Invalid module path pattern: {}", e),
    })?;

    if !re.is_match(path) {
        return Err(BlocklistError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Expected a Rust module path such as `my_app::models`".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BlocklistError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
        return Err(BlocklistError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Expected one of: {}", allowed.join(", ")),
        });
    }
    Ok(())
}
