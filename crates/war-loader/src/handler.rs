//! The WAR deployment handler: assembles a web class loader from an archive,
//! its vendor descriptor, and the server configuration.

use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use war_archive::WarArchive;
use war_descriptor::{
    parse_context_xml, parse_web_xml, select_dialect, DescriptorError, DescriptorFlags,
    LoaderTunables,
};

use crate::context::{
    parse_virtual_server_ids, DeploymentContext, ServerConfig, ServerEnvironment,
    CONTEXT_XML_DEFAULT_PROPERTY,
};
use crate::loader::{StartedWebappClassLoader, WebappClassLoader};
use crate::reconcile::{reconcile_clear_references, Reconciliation};

/// Component type handled by this handler.
pub const ARCHIVE_TYPE: &str = "war";

/// Archive entry holding the application's own context descriptor.
pub const WAR_CONTEXT_XML: &str = "META-INF/context.xml";
/// Domain-wide context descriptor, relative to the instance root.
pub const DEFAULT_CONTEXT_XML: &str = "config/context.xml";

const WEB_INF_CLASSES: &str = "WEB-INF/classes/";
const WEB_INF_LIB: &str = "WEB-INF/lib";

/// URL schemes the class loader accepts as repositories. Anything else is
/// interpreted as a filesystem path.
const LOADER_URL_SCHEMES: [&str; 5] = ["http", "https", "file", "jar", "ftp"];

/// Fatal deployment failures.
///
/// A vendor-descriptor parse failure aborts the deployment, as does a
/// permission-installation failure. Context descriptor failures are logged
/// and the loader keeps its default policy.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("failed to install permissions for archive [{archive}]: {source}")]
    Security {
        archive: PathBuf,
        source: anyhow::Error,
    },
}

/// Component type passed to the permission installer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    War,
}

/// Ambient-authority boundary around permission installation.
///
/// The host supplies whatever privileged scope it has; an installer failure
/// aborts the deployment as a security error.
pub trait PermissionInstaller: Send + Sync {
    fn install(
        &self,
        component: ComponentType,
        context: &DeploymentContext,
        loader: &WebappClassLoader,
    ) -> anyhow::Result<()>;
}

/// Default installer for hosts without a security boundary.
pub struct NoPermissions;

impl PermissionInstaller for NoPermissions {
    fn install(
        &self,
        _component: ComponentType,
        _context: &DeploymentContext,
        _loader: &WebappClassLoader,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The deployment handler for web archives.
///
/// Long-lived and stateless across deployments: all per-deployment state
/// lives in locals and in the returned class loader.
pub struct WarHandler {
    flags: DescriptorFlags,
    server_config: ServerConfig,
    server_environment: ServerEnvironment,
    permissions: Box<dyn PermissionInstaller>,
}

impl WarHandler {
    #[must_use]
    pub fn new(
        flags: DescriptorFlags,
        server_config: ServerConfig,
        server_environment: ServerEnvironment,
    ) -> Self {
        Self {
            flags,
            server_config,
            server_environment,
            permissions: Box::new(NoPermissions),
        }
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: Box<dyn PermissionInstaller>) -> Self {
        self.permissions = permissions;
        self
    }

    #[must_use]
    pub fn archive_type(&self) -> &'static str {
        ARCHIVE_TYPE
    }

    /// Probe the deployment's archive for its declared version identifier.
    #[must_use]
    pub fn version_identifier(&self, context: &DeploymentContext) -> Option<String> {
        war_descriptor::version_identifier(
            &context.source,
            self.flags,
            context.runtime_alt_dd.as_deref(),
        )
    }

    /// Build, configure, and start the web class loader for a deployment.
    ///
    /// A vendor-descriptor parse failure is fatal, as is a
    /// permission-installation failure. Context descriptor failures are
    /// logged and the loader still starts with its default policy.
    pub fn web_class_loader(
        &self,
        parent: impl Into<String>,
        context: &DeploymentContext,
    ) -> Result<StartedWebappClassLoader, DeployError> {
        let mut loader = WebappClassLoader::new(parent);
        self.assemble(&mut loader, context)?;
        Ok(loader.start())
    }

    fn assemble(
        &self,
        loader: &mut WebappClassLoader,
        context: &DeploymentContext,
    ) -> Result<(), DeployError> {
        let base = absolute(context.source.path());
        loader.set_doc_base(&base);
        loader.add_dir_repository(WEB_INF_CLASSES, base.join(WEB_INF_CLASSES));

        if let Some(dir) = context.scratch_dir("ejb") {
            match file_url(&absolute(dir)) {
                Some(mut url) => {
                    if !url.ends_with('/') {
                        url.push('/');
                    }
                    loader.add_url_repository(url);
                }
                None => tracing::error!(
                    dir = %dir.display(),
                    "skipping non-representable ejb scratch dir"
                ),
            }
        }
        if let Some(dir) = context.scratch_dir("jsp") {
            loader.set_work_dir(dir);
        }

        for url in &context.manifest_libraries {
            loader.add_url_repository(url.clone());
        }

        let dialect = select_dialect(&context.source, self.flags, context.runtime_alt_dd.as_deref());
        let tunables = parse_web_xml(&context.source, dialect)?;
        self.configure_loader_attributes(loader, &tunables, &base);
        self.configure_loader_properties(loader, &tunables, &base);
        if let Err(err) = self.apply_clear_references_policy(loader, &base, context) {
            tracing::error!(
                archive = %context.source.path().display(),
                error = %err,
                "failed to apply context.xml policy"
            );
        }

        self.permissions
            .install(ComponentType::War, context, loader)
            .map_err(|source| DeployError::Security {
                archive: context.source.path().to_path_buf(),
                source,
            })?;
        Ok(())
    }

    fn configure_loader_attributes(
        &self,
        loader: &mut WebappClassLoader,
        tunables: &LoaderTunables,
        base: &Path,
    ) {
        loader.set_delegate(tunables.delegate);
        tracing::debug!(
            module = %base.display(),
            delegate = tunables.delegate,
            "setting delegate"
        );

        let Some(extra) = tunables.extra_class_path.as_deref() else {
            return;
        };
        for element in split_extra_class_path(extra) {
            tracing::debug!(module = %base.display(), path = %element, "adding to the classpath");
            if is_loader_url(&element) {
                loader.add_url_repository(element);
                continue;
            }
            // Not a URL, interpret as a file; relative paths resolve against
            // the docroot.
            let resolved = if is_absolute_element(&element) {
                PathBuf::from(&element)
            } else {
                base.join(&element)
            };
            match file_url(&resolved) {
                Some(url) => loader.add_url_repository(url),
                None => {
                    tracing::error!(path = %element, "ignoring malformed classpath element");
                }
            }
        }
    }

    fn configure_loader_properties(
        &self,
        loader: &mut WebappClassLoader,
        tunables: &LoaderTunables,
        base: &Path,
    ) {
        loader.set_use_bundled_jsf(tunables.use_bundled_jsf);

        let lib_dir = base.join(WEB_INF_LIB);
        if !lib_dir.is_dir() {
            return;
        }
        let mut entries = match std::fs::read_dir(&lib_dir) {
            Ok(entries) => entries.filter_map(Result::ok).collect::<Vec<_>>(),
            Err(err) => {
                tracing::trace!(dir = %lib_dir.display(), error = %err, "could not list lib dir");
                return;
            }
        };
        entries.sort_by_key(std::fs::DirEntry::file_name);

        for entry in entries {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.ends_with(".jar") && !name.ends_with(".zip") {
                continue;
            }
            if tunables.ignore_hidden_jar_files && name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            match entry.file_type() {
                // An entry directory is an exploded jar.
                Ok(kind) if kind.is_dir() => {
                    loader.add_dir_repository(format!("{WEB_INF_LIB}/{name}/"), path);
                }
                Ok(_) => {
                    let logical = match path.strip_prefix(base) {
                        Ok(rel) => format!("/{}", rel.display()),
                        Err(_) => path.display().to_string(),
                    };
                    loader.add_jar(logical, path);
                }
                Err(err) => {
                    tracing::trace!(file = %path.display(), error = %err, "could not add file");
                }
            }
        }
    }

    fn apply_clear_references_policy(
        &self,
        loader: &mut WebappClassLoader,
        base: &Path,
        context: &DeploymentContext,
    ) -> Result<(), DescriptorError> {
        let archive_signal = parse_context_xml(&base.join(WAR_CONTEXT_XML))?;
        let result = if archive_signal.is_some() {
            Reconciliation::Consistent(archive_signal)
        } else {
            let domain_signal = parse_context_xml(
                &self.server_environment.instance_root.join(DEFAULT_CONTEXT_XML),
            )?;
            let signals = self.virtual_server_signals(context, domain_signal)?;
            reconcile_clear_references(archive_signal, &signals)
        };

        match result {
            Reconciliation::Consistent(Some(value)) => loader.set_clear_references_static(value),
            Reconciliation::Consistent(None) => {}
            Reconciliation::Inconsistent => {
                tracing::warn!(
                    archive = %context.source.path().display(),
                    "inconsistent clearReferencesStatic in virtual-server configuration, \
                     keeping the loader default"
                );
            }
        }
        Ok(())
    }

    /// One signal per hosting virtual server: its own `contextXmlDefault`
    /// override when defined and present, otherwise the domain default.
    fn virtual_server_signals(
        &self,
        context: &DeploymentContext,
        domain_signal: Option<bool>,
    ) -> Result<Vec<Option<bool>>, DescriptorError> {
        let Some(http_service) = self.server_config.http_service.as_ref() else {
            return Ok(Vec::new());
        };
        let hosts = parse_virtual_server_ids(context.virtual_servers.as_deref().unwrap_or(""));
        if hosts.is_empty() {
            return Ok(Vec::new());
        }

        let mut signals = Vec::new();
        for virtual_server in &http_service.virtual_servers {
            if !hosts.iter().any(|id| *id == virtual_server.id) {
                continue;
            }
            let mut signal = None;
            if let Some(rel) = virtual_server.property(CONTEXT_XML_DEFAULT_PROPERTY) {
                let path = self.server_environment.instance_root.join(rel);
                if path.exists() {
                    signal = parse_context_xml(&path)?;
                }
            }
            signals.push(signal.or(domain_signal));
        }
        Ok(signals)
    }

    /// Classpath URIs for the archive: the archive itself plus, for exploded
    /// archives, `WEB-INF/classes/` and every jar in `WEB-INF/lib`.
    #[must_use]
    pub fn class_path_uris(&self, archive: &WarArchive) -> Vec<Url> {
        let mut uris = Vec::new();
        let path = absolute(archive.path());

        if archive.is_exploded() {
            let Ok(base) = Url::from_directory_path(&path) else {
                tracing::warn!(archive = %path.display(), "archive path is not a valid URL base");
                return uris;
            };
            uris.push(base.clone());
            match base.join(WEB_INF_CLASSES) {
                Ok(url) => uris.push(url),
                Err(err) => {
                    tracing::warn!(archive = %path.display(), error = %err, "bad classes URI");
                }
            }
            let lib_dir = path.join(WEB_INF_LIB);
            if lib_dir.exists() {
                match lib_directory_jar_uris(&lib_dir) {
                    Ok(jars) => uris.extend(jars),
                    Err(err) => {
                        tracing::warn!(dir = %lib_dir.display(), error = %err, "could not list jars");
                    }
                }
            }
        } else if let Ok(url) = Url::from_file_path(&path) {
            uris.push(url);
        } else {
            tracing::warn!(archive = %path.display(), "archive path is not a valid URL");
        }
        uris
    }
}

/// URLs of the `*.jar` files directly under a library directory.
pub fn lib_directory_jar_uris(lib_dir: &Path) -> std::io::Result<Vec<Url>> {
    let mut entries = std::fs::read_dir(lib_dir)?
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    let mut uris = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "jar") && path.is_file() {
            if let Ok(url) = Url::from_file_path(&path) {
                uris.push(url);
            }
        }
    }
    Ok(uris)
}

/// Split an extra-classpath value into its elements.
///
/// Separators are `;` and `:`, except that a `:` directly preceded by `\` is
/// a literal, escaped colon; `\:` is unescaped in the returned elements.
/// Trailing empty elements are dropped.
#[must_use]
pub fn split_extra_class_path(extra: &str) -> Vec<String> {
    let mut elements = Vec::new();
    let mut current = String::new();
    for ch in extra.chars() {
        match ch {
            ';' => elements.push(std::mem::take(&mut current)),
            ':' if !current.ends_with('\\') => elements.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    elements.push(current);
    while elements.last().is_some_and(String::is_empty) {
        elements.pop();
    }
    elements
        .into_iter()
        .map(|element| element.replace("\\:", ":"))
        .collect()
}

fn is_loader_url(element: &str) -> bool {
    Url::parse(element).is_ok_and(|url| LOADER_URL_SCHEMES.contains(&url.scheme()))
}

/// Absolute either by platform rules or in the Windows drive-letter form a
/// descriptor may carry regardless of host platform.
fn is_absolute_element(element: &str) -> bool {
    if Path::new(element).is_absolute() {
        return true;
    }
    let bytes = element.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// `file:` URL in the single-slash form the original loader records.
///
/// The path is percent-encoded by round-tripping it through `Url`, which
/// also keeps Windows drive-letter paths representable on any host.
fn file_url(path: &Path) -> Option<String> {
    let text = path.to_str()?.replace('\\', "/");
    let spec = if text.starts_with('/') {
        format!("file:{text}")
    } else {
        format!("file:/{text}")
    };
    let url = Url::parse(&spec).ok()?;
    Some(format!("file:{}", url.path()))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons_and_unescaped_colons() {
        assert_eq!(
            split_extra_class_path("C\\:/a.jar;relative/b.jar:http\\://x/c.jar"),
            vec!["C:/a.jar", "relative/b.jar", "http://x/c.jar"]
        );
        assert_eq!(split_extra_class_path("a:b;c"), vec!["a", "b", "c"]);
        assert_eq!(split_extra_class_path(""), Vec::<String>::new());
        assert_eq!(split_extra_class_path("a;;b"), vec!["a", "", "b"]);
        assert_eq!(split_extra_class_path("a;;"), vec!["a"]);
    }

    #[test]
    fn split_round_trips_escaped_elements() {
        let elements = ["plain.jar", "dir/with.jar", "drive:relative.jar"];
        let joined = elements
            .iter()
            .map(|e| e.replace(':', "\\:"))
            .collect::<Vec<_>>()
            .join(";");
        assert_eq!(split_extra_class_path(&joined), elements);
    }

    #[test]
    fn loader_urls_require_a_known_scheme() {
        assert!(is_loader_url("http://repo/x.jar"));
        assert!(is_loader_url("file:/app/x.jar"));
        assert!(is_loader_url("jar:file:/app/x.jar!/"));
        // A drive letter parses as a URL scheme but is not one the loader
        // accepts; it must fall through to file handling.
        assert!(!is_loader_url("C:/a.jar"));
        assert!(!is_loader_url("relative/b.jar"));
    }

    #[test]
    fn drive_letter_elements_are_absolute() {
        assert!(is_absolute_element("/opt/lib.jar"));
        assert!(is_absolute_element("C:/a.jar"));
        assert!(is_absolute_element("c:\\a.jar"));
        assert!(!is_absolute_element("relative/b.jar"));
    }

    #[test]
    fn file_urls_use_the_single_slash_form() {
        assert_eq!(
            file_url(Path::new("/app/lib/x.jar")).as_deref(),
            Some("file:/app/lib/x.jar")
        );
        assert_eq!(
            file_url(Path::new("C:/a.jar")).as_deref(),
            Some("file:/C:/a.jar")
        );
    }

    #[test]
    fn file_urls_percent_encode_reserved_characters() {
        assert_eq!(
            file_url(Path::new("/opt/my libs/a.jar")).as_deref(),
            Some("file:/opt/my%20libs/a.jar")
        );
    }
}
