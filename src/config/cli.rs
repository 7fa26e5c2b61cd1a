use crate::config::toml_config::TomlConfig;
use crate::domain::model::OutputFormat;
use crate::utils::error::Result;
use clap::builder::BoolishValueParser;
use clap::Parser;
use std::path::PathBuf;

/// 命令列與環境變數；有設定的值覆蓋 TOML 檔，其餘用預設值
#[derive(Debug, Clone, Parser)]
#[command(name = "dmp-score")]
#[command(about = "Score data management plans of recent projects and export the results")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "DMP_API_URL")]
    pub api_endpoint: Option<String>,

    #[arg(long, env = "DMP_SINCE_DATE", help = "yyyy.mm.dd or yyyy-mm-dd")]
    pub since_date: Option<String>,

    #[arg(
        long,
        env = "DMP_VERIFY_TLS",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub verify_tls: Option<bool>,

    #[arg(long, env = "DMP_DOCUMENTS_ROOT")]
    pub documents_root: Option<String>,

    #[arg(long, env = "DMP_OUTPUT_PATH")]
    pub output_path: Option<String>,

    #[arg(long, env = "DMP_OUTPUT_FILE")]
    pub output_file: Option<String>,

    #[arg(long, value_enum, env = "DMP_OUTPUT_FORMAT")]
    pub format: Option<OutputFormat>,

    #[arg(long, help = "SQLite table name")]
    pub table: Option<String>,

    #[arg(long, help = "Reuse unchanged scores from the previous output")]
    pub incremental: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// TOML 檔（若有）→ 命令列覆蓋
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        if let Some(endpoint) = &self.api_endpoint {
            config.source.endpoint = Some(endpoint.clone());
        }
        if let Some(since_date) = &self.since_date {
            config.source.since_date = since_date.clone();
        }
        if let Some(verify_tls) = self.verify_tls {
            config.source.verify_tls = verify_tls;
        }
        if let Some(root) = &self.documents_root {
            config.documents.root = root.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.load.output_path = output_path.clone();
        }
        if let Some(output_file) = &self.output_file {
            config.load.output_file = Some(output_file.clone());
        }
        if let Some(format) = self.format {
            config.load.format = format;
        }
        if let Some(table) = &self.table {
            config.load.table = table.clone();
        }
        if self.incremental {
            config.load.incremental = true;
        }

        Ok(config)
    }
}
