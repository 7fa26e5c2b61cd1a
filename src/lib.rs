pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::sink::{CsvSink, SqliteSink};
pub use adapters::storage::LocalStorage;
pub use core::{etl::EtlEngine, pipeline::DmpPipeline};
pub use utils::error::{EtlError, Result};
