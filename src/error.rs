use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;

use crate::classfile::ClassDecodeError;

/// A non-fatal failure recorded while scanning one archive or one of its entries.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
    #[error("failed to read entry {entry} in {path}: {source}")]
    EntryRead {
        path: PathBuf,
        entry: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode class {entry} in {path}: {source}")]
    Decode {
        path: PathBuf,
        entry: String,
        #[source]
        source: ClassDecodeError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// The whole archive contributed nothing.
    Archive,
    /// A single entry was skipped; the rest of its archive was processed.
    Entry,
}

impl ScanError {
    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::Open { .. } | Self::Archive { .. } => ErrorScope::Archive,
            Self::EntryRead { .. } | Self::Decode { .. } => ErrorScope::Entry,
        }
    }

    pub fn archive(&self) -> &Path {
        match self {
            Self::Open { path, .. }
            | Self::Archive { path, .. }
            | Self::EntryRead { path, .. }
            | Self::Decode { path, .. } => path,
        }
    }

    pub fn entry(&self) -> Option<&str> {
        match self {
            Self::EntryRead { entry, .. } | Self::Decode { entry, .. } => Some(entry),
            Self::Open { .. } | Self::Archive { .. } => None,
        }
    }
}
