//! WAR deployment handling: build a web application's class loader from its
//! archive, vendor descriptor, and the hosting server's configuration.
//!
//! The handler is driven once per deployment: it probes the archive, selects
//! and runs one vendor descriptor parser, installs repositories and
//! tunables on the loader, reconciles the `clearReferencesStatic` shutdown
//! policy across every configuration source, installs permissions, and
//! starts the loader.

mod context;
mod handler;
mod loader;
mod reconcile;

pub use context::{
    parse_virtual_server_ids, DeploymentContext, HttpService, ServerConfig, ServerEnvironment,
    VirtualServer, CONTEXT_XML_DEFAULT_PROPERTY,
};
pub use handler::{
    lib_directory_jar_uris, split_extra_class_path, ComponentType, DeployError, NoPermissions,
    PermissionInstaller, WarHandler, ARCHIVE_TYPE, DEFAULT_CONTEXT_XML, WAR_CONTEXT_XML,
};
pub use loader::{Repository, StartedWebappClassLoader, WebappClassLoader};
pub use reconcile::{reconcile_clear_references, Reconciliation};
