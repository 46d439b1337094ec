//! Engine error type

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot read config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Two file nodes share a path in one analysis run.
    #[error("duplicate file in analysis: {0}")]
    DuplicateFile(String),

    /// An edge endpoint is not part of the file set.
    #[error("edge {from} -> {to} references a file outside the graph")]
    UnknownEndpoint { from: String, to: String },
}
