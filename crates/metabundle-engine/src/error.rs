//! Error types
//!
//! Data problems in the metadata never show up here: they are embedded in the bundle as
//! `error` nodes. These types cover broken internal invariants, configuration files, and
//! serialization of the finished bundle.

use std::path::PathBuf;

use thiserror::Error;

use crate::options::Diagnostic;

/// Errors that abort a bundling run
#[derive(Debug, Error)]
pub enum BundleError {
    /// A phase read state that an earlier phase had not produced yet
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A bundled reference had no name when names were finalized
    #[error("Unresolved reference to {module}:{name}")]
    UnresolvedHandle {
        /// Module of the canonical symbol
        module: String,
        /// Name of the canonical symbol
        name: String,
    },

    /// The finished bundle could not be serialized
    #[error("Failed to serialize bundle: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for bundling
pub type BundleResult<T> = Result<T, BundleError>;

/// Errors loading a bundle configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse bundle config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid bundle config: {0}")]
    Validation(String),
}

/// Errors producing a flat-module index
#[derive(Debug, Error)]
pub enum IndexError {
    /// The options were rejected before any module was resolved
    #[error("{}", format_diagnostics(.0))]
    Config(Vec<Diagnostic>),

    /// Bundling failed
    #[error(transparent)]
    Bundle(#[from] BundleError),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(Diagnostic::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
