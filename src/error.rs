use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("No month sheets (e.g. DEC2025.csv) found under {}", .0.display())]
    NoMonthSheets(PathBuf),

    #[error("Sheet '{sheet}' has no '{column}' column")]
    MissingColumn { sheet: String, column: &'static str },

    #[error("'{0}' is not a month label (expected MONYYYY, e.g. DEC2025)")]
    InvalidMonthLabel(String),

    #[error("Smoother error: {0}")]
    Smoother(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
