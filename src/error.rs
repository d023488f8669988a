//! Crate-wide error taxonomy.
//!
//! Mirrors the error taxonomy in spec.md §7: ROM problems are fatal at
//! startup, D64 problems leave existing state untouched, server parse
//! errors are reported without dropping the connection.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum EmulatorError {
    #[error("required ROM '{name}' not found on search path {searched:?}")]
    RomMissing {
        name: &'static str,
        searched: Vec<PathBuf>,
    },

    #[error("ROM '{name}' has size {actual} bytes, expected {expected}")]
    RomSizeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("failed to read ROM file {path:?}: {source}")]
    RomIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid d64: {0}")]
    D64Malformed(String),

    #[error("failed to read d64 image {path:?}: {source}")]
    D64Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    ServerParse(String),
}

pub type Result<T> = std::result::Result<T, EmulatorError>;
