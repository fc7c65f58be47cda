//! Read-only access to web application archives.
//!
//! A WAR reaches the deployment handler either as an exploded directory tree
//! or as a packed zip. Descriptor parsing only needs existence checks and
//! whole-entry reads, so both shapes hide behind one type.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use zip::ZipArchive;

/// A readable web application archive, exploded or packed.
///
/// The archive is treated as read-only for the duration of a deployment.
#[derive(Clone, Debug)]
pub struct WarArchive {
    path: PathBuf,
}

impl WarArchive {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the archive is an exploded directory rather than a packed zip.
    #[must_use]
    pub fn is_exploded(&self) -> bool {
        self.path.is_dir()
    }

    /// Whether the named entry exists in the archive.
    ///
    /// Entry names use forward slashes relative to the archive root, e.g.
    /// `WEB-INF/sun-web.xml`. Any I/O failure while probing reports `false`.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        if self.path.is_dir() {
            return self.path.join(name).exists();
        }
        let Ok(file) = File::open(&self.path) else {
            return false;
        };
        let Ok(mut zip) = ZipArchive::new(file) else {
            return false;
        };
        let found = zip.by_name(name).is_ok();
        found
    }

    /// Read an entry from the archive.
    ///
    /// Returns `Ok(None)` when the entry isn't present.
    pub fn read(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        if self.path.is_dir() {
            let candidate = self.path.join(name);
            if !candidate.exists() {
                return Ok(None);
            }
            let mut buf = Vec::new();
            File::open(&candidate)
                .with_context(|| format!("failed to open {}", candidate.display()))?
                .read_to_end(&mut buf)
                .with_context(|| format!("failed to read {}", candidate.display()))?;
            return Ok(Some(buf));
        }

        let file = File::open(&self.path)
            .with_context(|| format!("failed to open archive {}", self.path.display()))?;
        let mut zip = ZipArchive::new(file)
            .with_context(|| format!("failed to read zip {}", self.path.display()))?;
        let result = match zip.by_name(name) {
            Ok(mut entry) => {
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf).with_context(|| {
                    format!("failed to read {} from {}", name, self.path.display())
                })?;
                Ok(Some(buf))
            }
            Err(zip::result::ZipError::FileNotFound) => Ok(None),
            Err(err) => Err(err).with_context(|| {
                format!("failed to read {} from zip {}", name, self.path.display())
            }),
        };
        result
    }
}
