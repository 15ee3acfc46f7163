use crate::core::blocklist::{Blocklist, Builder};
use crate::core::catalog::TypeCatalog;
use crate::core::RuleSource;
use crate::domain::model::normalize_type_path;
use crate::utils::error::{BlocklistError, Result};
use crate::utils::validation::{
    validate_module_path, validate_non_empty_string, validate_one_of, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["compact", "json"];

static ENV_PLACEHOLDER: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocklistConfig {
    pub blocklist: Option<RulesConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl BlocklistConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BlocklistError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BlocklistError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${APP_CRATE})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = ENV_PLACEHOLDER.as_ref().map_err(|e| BlocklistError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn rules(&self) -> Result<&RulesConfig> {
        self.blocklist
            .as_ref()
            .ok_or_else(|| BlocklistError::MissingConfigError {
                field: "blocklist".to_string(),
            })
    }

    pub fn name(&self) -> &str {
        self.blocklist
            .as_ref()
            .and_then(|b| b.name.as_deref())
            .unwrap_or("blocklist")
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    /// Builder seeded with the configured rules.
    pub fn builder(&self, catalog: TypeCatalog) -> Result<Builder> {
        let rules = self.rules()?;
        Ok(Blocklist::builder().catalog(catalog).rules_from(rules))
    }

    pub fn build(&self, catalog: TypeCatalog) -> Result<Blocklist> {
        self.validate()?;
        self.builder(catalog)?.build()
    }
}

impl RuleSource for RulesConfig {
    fn type_names(&self) -> &[String] {
        &self.types
    }

    fn packages(&self) -> &[String] {
        &self.packages
    }

    fn annotation_names(&self) -> &[String] {
        &self.annotations
    }
}

impl Validate for BlocklistConfig {
    fn validate(&self) -> Result<()> {
        let rules = self.rules()?;

        for name in &rules.types {
            validate_non_empty_string("blocklist.types", name)?;
            if name.contains("::") {
                validate_module_path("blocklist.types", &normalize_type_path(name))?;
            }
        }

        for package in &rules.packages {
            validate_module_path("blocklist.packages", package)?;
        }

        for annotation in &rules.annotations {
            validate_non_empty_string("blocklist.annotations", annotation)?;
        }

        if let Some(logging) = &self.logging {
            if let Some(level) = &logging.level {
                validate_one_of("logging.level", level, &LOG_LEVELS)?;
            }
            if let Some(format) = &logging.format {
                validate_one_of("logging.format", format, &LOG_FORMATS)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[blocklist]
name = "pii"
types = ["Point", "geo::Polygon"]
packages = ["my_app::secrets"]
annotations = ["DisableSerialization"]

[logging]
level = "debug"
format = "json"
"#;

        let config = BlocklistConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.name(), "pii");
        assert_eq!(config.rules().unwrap().types.len(), 2);
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BLOCKLIST_TEST_CRATE", "billing");

        let toml_content = r#"
[blocklist]
packages = ["${BLOCKLIST_TEST_CRATE}::cards"]
"#;

        let config = BlocklistConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.rules().unwrap().packages, vec!["billing::cards"]);

        std::env::remove_var("BLOCKLIST_TEST_CRATE");
    }

    #[test]
    fn test_missing_blocklist_section() {
        let config = BlocklistConfig::from_toml_str("[logging]\nlevel = \"info\"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(BlocklistError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let bad_package = BlocklistConfig::from_toml_str(
            r#"
[blocklist]
packages = ["net.kilink"]
"#,
        )
        .unwrap();
        assert!(bad_package.validate().is_err());

        let bad_format = BlocklistConfig::from_toml_str(
            r#"
[blocklist]
types = ["Point"]

[logging]
format = "xml"
"#,
        )
        .unwrap();
        assert!(bad_format.validate().is_err());
    }

    #[test]
    fn test_generic_type_paths_validate() {
        let config = BlocklistConfig::from_toml_str(
            r#"
[blocklist]
types = ["geo::Polygon<T>", "&geo::Line"]
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());

        let blocklist = config.build(TypeCatalog::new()).unwrap();
        assert!(blocklist.is_blocked("Polygon"));
        assert!(blocklist.is_path_blocked("geo::Polygon"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = BlocklistConfig::from_toml_str("[blocklist\ntypes = 1").unwrap_err();
        assert!(matches!(err, BlocklistError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[blocklist]
name = "file-test"
types = ["Point"]
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = BlocklistConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.name(), "file-test");

        let blocklist = config.build(TypeCatalog::new()).unwrap();
        assert!(blocklist.is_blocked("Point"));
    }
}
