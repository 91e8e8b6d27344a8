use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;


/// Everything that can go wrong while building, querying or materializing
/// a resolved configuration tree.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigurationError {
    /// The raw document (or one of its blocks) does not have the expected shape.
    #[error("Invalid configuration format at `{key_path}`: {reason}")]
    #[diagnostic(code(pathtree::format))]
    Format { key_path: String, reason: String },

    /// A location string could not be turned into an absolute, normalized path.
    #[error("Could not resolve location `{raw}` at `{key_path}`: {reason}")]
    #[diagnostic(
        code(pathtree::path_resolution),
        help("Location strings must be valid paths on this platform.")
    )]
    PathResolution {
        key_path: String,
        raw: String,
        reason: String,
    },

    /// The filesystem rejected a directory creation request.
    #[error("Failed to create directory {} for `{key_path}`", .location.display())]
    #[diagnostic(code(pathtree::directory_creation))]
    DirectoryCreation {
        key_path: String,
        location: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No configuration entry named `{key}` in `{node_path}`")]
    #[diagnostic(code(pathtree::key_not_found))]
    KeyNotFound { node_path: String, key: String },

    #[error("Configuration entry `{key_path}` is {found}, expected {expected}")]
    #[diagnostic(code(pathtree::unexpected_value_type))]
    UnexpectedValueType {
        key_path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Could not parse configuration document")]
    #[diagnostic(code(pathtree::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigurationError {
    pub(crate) fn format<K, R>(key_path: K, reason: R) -> Self
    where
        K: Into<String>,
        R: Into<String>,
    {
        Self::Format {
            key_path: key_path.into(),
            reason: reason.into(),
        }
    }
}


pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
