use clap::Parser;
use dmp_score::core::ConfigProvider;
use dmp_score::domain::model::OutputFormat;
use dmp_score::utils::error::{ErrorSeverity, EtlError};
use dmp_score::utils::{logger, validation::Validate};
use dmp_score::{CliConfig, CsvSink, DmpPipeline, EtlEngine, LocalStorage, SqliteSink, TomlConfig};
use std::path::Path;

fn exit_code(e: &EtlError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 重試錯誤
        ErrorSeverity::High => 1,     // 處理錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

fn report_failure(stage: &str, e: &EtlError) {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let code = exit_code(e);
    if code > 0 {
        std::process::exit(code);
    }
}

async fn run(config: TomlConfig) -> dmp_score::Result<String> {
    match config.output_format() {
        OutputFormat::Csv => {
            let storage = LocalStorage::new(config.output_path().to_string());
            let sink = CsvSink::new(storage, config.output_path(), config.output_file());
            EtlEngine::new(DmpPipeline::new(sink, config)).run().await
        }
        OutputFormat::Sqlite => {
            let db_path = Path::new(config.output_path()).join(config.output_file());
            let sink = SqliteSink::new(db_path, config.table_name());
            EtlEngine::new(DmpPipeline::new(sink, config)).run().await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting dmp-score");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            report_failure("Configuration loading", &e);
            return;
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        report_failure("Configuration validation", &e);
        return;
    }

    match run(config).await {
        Ok(output_path) => {
            tracing::info!("✅ DMP scoring completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ DMP scoring completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => report_failure("DMP scoring run", &e),
    }
}
