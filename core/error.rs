use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("TOML Serialization Error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON Serialization Error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("YAML Parsing/Serialization Error: {0}")]
    YamlError(#[from] serde_yml::Error),

    #[error("XML Serialization Error: {0}")]
    XmlSerialize(String),

    #[error("Invalid Input: {0}")]
    Input(String),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Too Large: Path '{path}' is {size} bytes (limit {limit} bytes)")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Not A Text File: Path '{path}'")]
    NotText { path: PathBuf },

    #[error("Glob Pattern Error: {0}")]
    Glob(String),

    #[error("Bundle Format Error: line {line}: {message}")]
    BundleFormat { line: usize, message: String },

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    #[error("TikToken Error: {0}")]
    TikToken(String),
}

impl AppError {
    /// HTTP-equivalent status for the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Input(_) | AppError::InvalidArgument(_) | AppError::BundleFormat { .. } => {
                400
            }
            _ => 500,
        }
    }
}

impl From<quick_xml::se::SeError> for AppError {
    fn from(err: quick_xml::se::SeError) -> Self {
        AppError::XmlSerialize(err.to_string())
    }
}

impl From<globset::Error> for AppError {
    fn from(err: globset::Error) -> Self {
        AppError::Glob(format!("Globset error: {}", err))
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Glob(format!("Pattern compile error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_map_to_400() {
        assert_eq!(AppError::Input("no root".into()).status_code(), 400);
        assert_eq!(AppError::InvalidArgument("bad".into()).status_code(), 400);
    }

    #[test]
    fn io_errors_map_to_500() {
        let err = AppError::FileRead {
            path: PathBuf::from("a.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.status_code(), 500);
        let too_large = AppError::FileTooLarge {
            path: PathBuf::from("big.txt"),
            size: 10,
            limit: 5,
        };
        assert_eq!(too_large.status_code(), 500);
    }
}
