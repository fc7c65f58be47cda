//! Collaborator types consumed by the deployment handler.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use war_archive::WarArchive;

/// Virtual-server property naming its `context.xml` override, relative to
/// the instance root.
pub const CONTEXT_XML_DEFAULT_PROPERTY: &str = "contextXmlDefault";

/// Per-deployment inputs supplied by the deployment framework.
#[derive(Clone, Debug)]
pub struct DeploymentContext {
    /// The archive being deployed.
    pub source: WarArchive,
    /// Scratch directories keyed by purpose (`"ejb"`, `"jsp"`, ...).
    pub scratch_dirs: BTreeMap<String, PathBuf>,
    /// Whitespace/comma separated ids of the virtual servers hosting this
    /// deployment, as given on the deploy command.
    pub virtual_servers: Option<String>,
    /// Library URLs declared in manifest `Class-Path` entries.
    pub manifest_libraries: Vec<String>,
    /// Runtime alternate deployment descriptor, when supplied.
    pub runtime_alt_dd: Option<PathBuf>,
}

impl DeploymentContext {
    #[must_use]
    pub fn new(source: WarArchive) -> Self {
        Self {
            source,
            scratch_dirs: BTreeMap::new(),
            virtual_servers: None,
            manifest_libraries: Vec::new(),
            runtime_alt_dd: None,
        }
    }

    #[must_use]
    pub fn scratch_dir(&self, purpose: &str) -> Option<&Path> {
        self.scratch_dirs.get(purpose).map(PathBuf::as_path)
    }
}

/// Filesystem layout of the server instance.
#[derive(Clone, Debug)]
pub struct ServerEnvironment {
    pub instance_root: PathBuf,
}

impl ServerEnvironment {
    #[must_use]
    pub fn new(instance_root: impl Into<PathBuf>) -> Self {
        Self {
            instance_root: instance_root.into(),
        }
    }
}

/// Read-only view of the server configuration.
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    pub http_service: Option<HttpService>,
}

#[derive(Clone, Debug, Default)]
pub struct HttpService {
    pub virtual_servers: Vec<VirtualServer>,
}

/// A named HTTP listener scope hosting deployed applications.
#[derive(Clone, Debug)]
pub struct VirtualServer {
    pub id: String,
    pub properties: BTreeMap<String, String>,
}

impl VirtualServer {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

/// Tokenize a deploy command's virtual-server list on spaces and commas.
#[must_use]
pub fn parse_virtual_server_ids(list: &str) -> Vec<String> {
    list.split([' ', ',', '\t', '\n', '\r'])
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_virtual_server_ids;

    #[test]
    fn tokenizes_on_spaces_and_commas() {
        assert_eq!(
            parse_virtual_server_ids("server1, server2 server3"),
            vec!["server1", "server2", "server3"]
        );
        assert!(parse_virtual_server_ids("").is_empty());
        assert!(parse_virtual_server_ids(" , ").is_empty());
    }
}
