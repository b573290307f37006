use std::path::PathBuf;

use dmi_host::{CodecError, HostError, SurfaceId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("an editor needs a source path or an already decoded document")]
    MissingSource,

    #[error("failed to open {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("failed to save {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("failed to prepare temporary directory under {path}: {source}")]
    TempDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a file is still being opened")]
    OpenInFlight,

    #[error("no icon is loaded")]
    NoDocument,

    #[error("editor is closed")]
    Closed,

    #[error("editor is busy with another operation")]
    Busy,

    #[error("state '{name}' does not exist")]
    UnknownState { name: String },

    #[error("a state named '{name}' already exists")]
    DuplicateState { name: String },

    #[error("{surface} is already being edited by another editor")]
    SurfaceClaimed { surface: SurfaceId },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl EditorError {
    #[must_use]
    pub fn decode(path: impl Into<PathBuf>, source: CodecError) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn encode(path: impl Into<PathBuf>, source: CodecError) -> Self {
        Self::Encode {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn temp_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TempDir {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn unknown_state(name: impl Into<String>) -> Self {
        Self::UnknownState { name: name.into() }
    }
}
