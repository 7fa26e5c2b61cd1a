use crate::adapters::filesystem::{DEFAULT_BUCKET_SIZE, DEFAULT_SUBFOLDER};
use crate::core::ConfigProvider;
use crate::domain::model::OutputFormat;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    normalize_since_date, validate_non_empty_string, validate_path, validate_positive_number,
    validate_required_field, validate_table_name, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_SINCE_DATE: &str = "2023.11.01";
pub const DEFAULT_DOCUMENTS_ROOT: &str = "projects";
pub const DEFAULT_OUTPUT_PATH: &str = "data";
pub const DEFAULT_CSV_FILE: &str = "output.csv";
pub const DEFAULT_SQLITE_FILE: &str = "dmp_data.db";
pub const DEFAULT_TABLE: &str = "projects";

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub documents: DocumentsConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: Option<String>,
    pub since_date: String,
    pub verify_tls: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            since_date: DEFAULT_SINCE_DATE.to_string(),
            verify_tls: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    pub root: String,
    pub bucket_size: i64,
    pub subfolder: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_DOCUMENTS_ROOT.to_string(),
            bucket_size: DEFAULT_BUCKET_SIZE,
            subfolder: DEFAULT_SUBFOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    /// 未設定時依格式決定：`output.csv` 或 `dmp_data.db`
    pub output_file: Option<String>,
    pub format: OutputFormat,
    pub table: String,
    pub incremental: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            output_file: None,
            format: OutputFormat::Csv,
            table: DEFAULT_TABLE.to_string(),
            incremental: false,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DMP_API_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let endpoint = validate_required_field("source.endpoint", &self.source.endpoint)?;
        validate_url("source.endpoint", endpoint)?;
        normalize_since_date("source.since_date", &self.source.since_date)?;

        validate_path("documents.root", &self.documents.root)?;
        validate_positive_number("documents.bucket_size", self.documents.bucket_size, 1)?;
        validate_non_empty_string("documents.subfolder", &self.documents.subfolder)?;

        validate_path("load.output_path", &self.load.output_path)?;
        validate_path("load.output_file", self.output_file())?;
        if self.load.format == OutputFormat::Sqlite {
            validate_table_name("load.table", &self.load.table)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> &str {
        self.source.endpoint.as_deref().unwrap_or_default()
    }

    fn since_date(&self) -> &str {
        &self.source.since_date
    }

    fn verify_tls(&self) -> bool {
        self.source.verify_tls
    }

    fn documents_root(&self) -> &str {
        &self.documents.root
    }

    fn bucket_size(&self) -> i64 {
        self.documents.bucket_size
    }

    fn subfolder(&self) -> &str {
        &self.documents.subfolder
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_file(&self) -> &str {
        match (&self.load.output_file, self.load.format) {
            (Some(file), _) => file.as_str(),
            (None, OutputFormat::Csv) => DEFAULT_CSV_FILE,
            (None, OutputFormat::Sqlite) => DEFAULT_SQLITE_FILE,
        }
    }

    fn output_format(&self) -> OutputFormat {
        self.load.format
    }

    fn table_name(&self) -> &str {
        &self.load.table
    }

    fn incremental(&self) -> bool {
        self.load.incremental
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[source]
endpoint = "https://fnc.example.com/api/dmp"
since_date = "2024-01-15"
verify_tls = true

[documents]
root = "/mnt/projects"
bucket_size = 1000
subfolder = "B. Plans"

[load]
output_path = "./out"
format = "sqlite"
table = "dmp_scores"
incremental = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api_endpoint(), "https://fnc.example.com/api/dmp");
        assert!(config.verify_tls());
        assert_eq!(config.bucket_size(), 1000);
        assert_eq!(config.subfolder(), "B. Plans");
        assert_eq!(config.output_format(), OutputFormat::Sqlite);
        assert_eq!(config.output_file(), DEFAULT_SQLITE_FILE);
        assert_eq!(config.table_name(), "dmp_scores");
        assert!(config.incremental());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config = TomlConfig::from_toml_str(
            r#"
[source]
endpoint = "http://localhost:8080/dmp"
"#,
        )
        .unwrap();

        assert_eq!(config.since_date(), DEFAULT_SINCE_DATE);
        assert!(!config.verify_tls());
        assert_eq!(config.documents_root(), DEFAULT_DOCUMENTS_ROOT);
        assert_eq!(config.bucket_size(), DEFAULT_BUCKET_SIZE);
        assert_eq!(config.output_path(), DEFAULT_OUTPUT_PATH);
        assert_eq!(config.output_file(), DEFAULT_CSV_FILE);
        assert_eq!(config.output_format(), OutputFormat::Csv);
        assert!(!config.incremental());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DMP_TOML_TEST_ENDPOINT", "https://test.api.com/dmp");

        let config = TomlConfig::from_toml_str(
            r#"
[source]
endpoint = "${DMP_TOML_TEST_ENDPOINT}"
since_date = "${DMP_TOML_TEST_UNSET}"
"#,
        )
        .unwrap();
        assert_eq!(config.api_endpoint(), "https://test.api.com/dmp");
        assert_eq!(config.source.since_date, "${DMP_TOML_TEST_UNSET}");

        std::env::remove_var("DMP_TOML_TEST_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let missing = TomlConfig::default();
        assert!(matches!(
            missing.validate(),
            Err(EtlError::MissingConfigError { .. })
        ));

        let mut config = TomlConfig::default();
        config.source.endpoint = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());

        config.source.endpoint = Some("https://example.com".to_string());
        config.source.since_date = "01/11/2023".to_string();
        assert!(config.validate().is_err());

        config.source.since_date = DEFAULT_SINCE_DATE.to_string();
        config.documents.bucket_size = 0;
        assert!(config.validate().is_err());

        config.documents.bucket_size = DEFAULT_BUCKET_SIZE;
        config.load.format = OutputFormat::Sqlite;
        config.load.table = "projects; DROP".to_string();
        assert!(config.validate().is_err());

        config.load.table = DEFAULT_TABLE.to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[source]
endpoint = "https://api.example.com"

[load]
output_file = "scores.csv"
"#,
            )
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output_file(), "scores.csv");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result = TomlConfig::from_toml_str(
            r#"
[load]
format = "parquet"
"#,
        );
        assert!(matches!(
            result,
            Err(EtlError::ConfigValidationError { .. })
        ));
    }
}
