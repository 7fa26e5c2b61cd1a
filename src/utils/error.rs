use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::ZipError(_) | EtlError::IoError(_) | EtlError::DatabaseError(_) => {
                ErrorCategory::Storage
            }
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the API endpoint and network access, then rerun",
            ErrorCategory::Storage => {
                "Check that the output location exists and is writable, and that no other process holds the file"
            }
            ErrorCategory::Data => "Inspect the previous output and the API response for unexpected content",
            ErrorCategory::Configuration => {
                "Check the command line flags, environment variables and the TOML file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::IoError(e) => format!("Could not read or write a file: {}", e),
            EtlError::DatabaseError(e) => format!("Could not write the output table: {}", e),
            EtlError::MissingConfigError { field } => {
                format!("'{}' must be set before running", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

/// 讀取 .docx 失敗的原因
#[derive(Error, Debug)]
pub enum DocumentReadError {
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a word document container: {path}: {source}")]
    NotADocument {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("malformed document body in {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 單一文件的評分失敗；只影響該文件，不中斷整批
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("no version number found in filename: {filename}")]
    VersionNotFound { filename: String },

    #[error("unsupported DMP template version v{major}.{minor}")]
    UnsupportedVersion { major: u32, minor: u32 },

    #[error("table {index} is missing from the document")]
    MissingTable { index: usize },

    #[error("section {key} is missing from the document")]
    MissingSection { key: String },

    #[error(transparent)]
    Document(#[from] DocumentReadError),
}
