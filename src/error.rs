use std::path::PathBuf;

use thiserror::Error;

pub type SheetMapResult<T> = Result<T, SheetMapError>;

#[derive(Error, Debug)]
pub enum SheetMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata parsing error: {0}")]
    Metadata(#[from] serde_yaml::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot convert {value} into {target}")]
    Conversion { value: String, target: &'static str },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Import error: {0}")]
    Import(String),
}

impl SheetMapError {
    /// Shorthand for a [`SheetMapError::Conversion`] naming the target type.
    pub fn conversion(value: impl ToString, target: &'static str) -> Self {
        SheetMapError::Conversion {
            value: value.to_string(),
            target,
        }
    }
}
