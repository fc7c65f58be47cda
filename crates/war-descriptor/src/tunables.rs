use serde::{Deserialize, Serialize};

/// Default class-loader delegation mode: ask the parent loader first.
pub const DELEGATE_DEFAULT: bool = true;

/// Class-loader tunables extracted from a vendor web descriptor.
///
/// Exactly one vendor parser populates this record per deployment; an archive
/// without its descriptor file leaves every field at its default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderTunables {
    /// Delegation mode for the web class loader.
    pub delegate: bool,
    /// Skip `WEB-INF/lib` entries whose names start with `.`.
    pub ignore_hidden_jar_files: bool,
    /// Prefer the JSF implementation bundled with the application.
    pub use_bundled_jsf: bool,
    /// Extra classpath in the descriptor's `;`/`:` separated form.
    pub extra_class_path: Option<String>,
    /// Application version identifier, when declared.
    pub version_identifier: Option<String>,
}

impl Default for LoaderTunables {
    fn default() -> Self {
        Self {
            delegate: DELEGATE_DEFAULT,
            ignore_hidden_jar_files: false,
            use_bundled_jsf: false,
            extra_class_path: None,
            version_identifier: None,
        }
    }
}
