use std::io::Error as IoError;
use std::path::PathBuf;
use thiserror::Error as ThisError;
use yaml_rust::ScanError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Unknown or missing key, wrong type or an out-of-range value.
    #[error("schema error at `{key}`: {message}")]
    Schema { key: String, message: String },

    /// A key points at an asset the site does not have.
    #[error("reference error at `{}`: {} does not exist", .key, .path.display())]
    Reference { key: String, path: PathBuf },

    #[error("bibliography error: {0}")]
    Bibliography(String),

    #[error("cv error: {0}")]
    Cv(String),

    #[error("failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] ScanError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("failed to minify HTML: {0}")]
    Minify(String),
}

impl Error {
    pub fn schema<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Error::Schema {
            key: key.into(),
            message: message.into(),
        }
    }

    /// The key path the error is attached to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::Schema { key, .. } | Error::Reference { key, .. } => Some(key.as_str()),
            _ => None,
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Error::Reference { .. })
    }
}
