use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or parsing deployment descriptors.
///
/// Parse failures always carry the descriptor name and the archive or file
/// location; a missing descriptor is not an error.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read {entry} from archive [{archive}]: {source}")]
    Io {
        entry: String,
        archive: PathBuf,
        source: anyhow::Error,
    },

    #[error("error parsing {entry} for archive [{archive}]: {source}")]
    Xml {
        entry: String,
        archive: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("invalid descriptor {entry} in archive [{archive}]: {reason}")]
    Invalid {
        entry: String,
        archive: PathBuf,
        reason: String,
    },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error parsing {path}: {source}")]
    FileXml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("invalid descriptor {path}: {reason}")]
    FileInvalid { path: PathBuf, reason: String },
}
