//! The web class-loader model.
//!
//! During assembly the loader is a mutable accumulation of repositories and
//! policy settings; `start` consumes it and hands back an immutable loader.
//! Actual class resolution happens elsewhere and is out of scope here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use war_descriptor::DELEGATE_DEFAULT;

/// A searchable source of classes or resources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repository {
    /// A directory repository with a logical path, e.g. `WEB-INF/classes/`.
    Dir { logical_path: String, dir: PathBuf },
    /// A repository addressed by its URL string form.
    Url(String),
    /// A jar file with a logical path relative to the archive root.
    Jar { logical_path: String, file: PathBuf },
}

/// A web application class loader under assembly.
#[derive(Clone, Debug)]
pub struct WebappClassLoader {
    parent: String,
    delegate: bool,
    doc_base: Option<PathBuf>,
    repositories: Vec<Repository>,
    work_dir: Option<PathBuf>,
    use_bundled_jsf: bool,
    clear_references_static: Option<bool>,
}

impl WebappClassLoader {
    /// Create a loader whose parent is the named loader.
    #[must_use]
    pub fn new(parent: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            delegate: DELEGATE_DEFAULT,
            doc_base: None,
            repositories: Vec::new(),
            work_dir: None,
            use_bundled_jsf: false,
            clear_references_static: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: bool) {
        self.delegate = delegate;
    }

    /// Install the resource root: the absolute doc base of the web app.
    pub fn set_doc_base(&mut self, doc_base: impl Into<PathBuf>) {
        self.doc_base = Some(doc_base.into());
    }

    pub fn add_dir_repository(&mut self, logical_path: impl Into<String>, dir: impl Into<PathBuf>) {
        self.repositories.push(Repository::Dir {
            logical_path: logical_path.into(),
            dir: dir.into(),
        });
    }

    pub fn add_url_repository(&mut self, url: impl Into<String>) {
        self.repositories.push(Repository::Url(url.into()));
    }

    pub fn add_jar(&mut self, logical_path: impl Into<String>, file: impl Into<PathBuf>) {
        self.repositories.push(Repository::Jar {
            logical_path: logical_path.into(),
            file: file.into(),
        });
    }

    pub fn set_work_dir(&mut self, work_dir: impl Into<PathBuf>) {
        self.work_dir = Some(work_dir.into());
    }

    pub fn set_use_bundled_jsf(&mut self, use_bundled_jsf: bool) {
        self.use_bundled_jsf = use_bundled_jsf;
    }

    /// Set the clear-static-references shutdown policy. Unset means the
    /// loader default.
    pub fn set_clear_references_static(&mut self, value: bool) {
        self.clear_references_static = Some(value);
    }

    /// Finish assembly. The returned loader is immutable.
    #[must_use]
    pub fn start(self) -> StartedWebappClassLoader {
        StartedWebappClassLoader { inner: self }
    }
}

/// A started, immutable web class loader.
#[derive(Clone, Debug)]
pub struct StartedWebappClassLoader {
    inner: WebappClassLoader,
}

impl StartedWebappClassLoader {
    #[must_use]
    pub fn parent(&self) -> &str {
        &self.inner.parent
    }

    #[must_use]
    pub fn delegate(&self) -> bool {
        self.inner.delegate
    }

    #[must_use]
    pub fn doc_base(&self) -> Option<&Path> {
        self.inner.doc_base.as_deref()
    }

    #[must_use]
    pub fn repositories(&self) -> &[Repository] {
        &self.inner.repositories
    }

    /// URL repositories in the order they were added.
    pub fn url_repositories(&self) -> impl Iterator<Item = &str> {
        self.inner.repositories.iter().filter_map(|repo| match repo {
            Repository::Url(url) => Some(url.as_str()),
            _ => None,
        })
    }

    #[must_use]
    pub fn work_dir(&self) -> Option<&Path> {
        self.inner.work_dir.as_deref()
    }

    #[must_use]
    pub fn use_bundled_jsf(&self) -> bool {
        self.inner.use_bundled_jsf
    }

    /// The clear-static-references policy, or `None` for the loader default.
    #[must_use]
    pub fn clear_references_static(&self) -> Option<bool> {
        self.inner.clear_references_static
    }
}
