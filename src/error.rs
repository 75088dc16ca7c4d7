//! Error types for indexing and file loading

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a position index
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Offsets are stored as `u32`, so longer buffers cannot be indexed
    #[error("buffer of {len} bytes exceeds the indexable maximum of {max} bytes")]
    BufferTooLarge { len: usize, max: usize },
}

/// Errors raised while loading a file into memory
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not open file '{}': {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read file '{}': {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not allocate {len} bytes")]
    AllocFailed { len: usize },
}
