//! Error taxonomy for a patch run.
//!
//! Every variant is fatal to the run it occurs in. Non-fatal conditions
//! (an unreadable text resource, a missing optional key) never become a
//! `PatchError`; they are logged through the observer and processing goes on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    /// A required external tool or credential is absent (pre-flight only).
    #[error("missing dependency: {what} ({hint})")]
    DependencyMissing { what: String, hint: String },

    /// An expected file or directory is missing from the extracted tree.
    #[error("{what} not found under {}", .searched.display())]
    TargetNotFound { what: String, searched: PathBuf },

    /// A binary replacement would change the literal's byte length.
    #[error("replacement {replacement:?} is {new_len} bytes, original literal is only {old_len}")]
    ReplacementTooLong {
        replacement: String,
        old_len: usize,
        new_len: usize,
    },

    /// A collaborator failed to start or exited non-zero.
    #[error("{tool} failed: {reason}")]
    SubprocessFailed { tool: String, reason: String },

    /// A file could not be opened, read or written.
    #[error("cannot access {}: {source}", .path.display())]
    IoUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Zip container could not be read or written.
    #[error("archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The extracted-tree location would make the run delete something it
    /// does not own.
    #[error("refusing to use {} as the extracted tree: {reason}", .tree.display())]
    UnsafeTree { tree: PathBuf, reason: String },

    /// An endpoint argument was empty after trimming.
    #[error("{which} endpoint must not be empty")]
    EmptyEndpoint { which: &'static str },
}

impl PatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatchError::IoUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>, searched: impl Into<PathBuf>) -> Self {
        PatchError::TargetNotFound {
            what: what.into(),
            searched: searched.into(),
        }
    }
}

pub type PatchResult<T> = Result<T, PatchError>;
