//! Error types for the defpool-core library.
//!
//! Every recoverable failure of the pool surfaces as an [`Error`] carrying
//! the offending file or symbol name. Internal invariant violations panic
//! instead of returning an error.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all pool operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A file with the same name is already loaded
    #[error("duplicate file name '{name}'")]
    DuplicateFile {
        /// Name of the file that was already present
        name: String,
    },

    /// A table or arena could not grow
    #[error("out of memory")]
    OutOfMemory,

    /// A builder rejected part of the descriptor
    #[error("invalid descriptor for file '{file}': {details}")]
    InvalidDescriptor {
        /// Name of the file being built
        file: String,
        /// What was wrong with it
        details: String,
    },

    /// Failed to parse FileDescriptorProto
    #[error("failed to parse FileDescriptorProto: {0}")]
    DescriptorParse(#[from] prost::DecodeError),

    /// Loading a bundled dependency closure failed
    #[error("failed to load bundled descriptor '{file}': {details}")]
    BundleLoad {
        /// Bundled file that could not be loaded
        file: String,
        /// Underlying failure
        details: String,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new duplicate file error
    pub fn duplicate_file(name: impl Into<String>) -> Self {
        Self::DuplicateFile { name: name.into() }
    }

    /// Creates a new invalid descriptor error
    pub fn invalid_descriptor(file: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            file: file.into(),
            details: details.into(),
        }
    }

    /// Creates a new bundle load error
    pub fn bundle_load(file: impl Into<String>, details: impl Into<String>) -> Self {
        Self::BundleLoad {
            file: file.into(),
            details: details.into(),
        }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if the pool is unchanged and the caller may carry on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateFile { .. } | Self::InvalidDescriptor { .. } | Self::DescriptorParse(_)
        )
    }
}
