//! Vendor deployment-descriptor parsing for web archives.
//!
//! A WAR may carry up to three vendor descriptors (`sun-web.xml`,
//! `glassfish-web.xml`, `weblogic.xml`) plus `context.xml` files. This crate
//! selects exactly one vendor dialect per deployment, parses it into the
//! class-loader tunables, and extracts the tri-state
//! `clearReferencesStatic` signal from context descriptors.

mod error;
mod parse;
mod tunables;

use std::path::Path;

use war_archive::WarArchive;

pub use error::DescriptorError;
pub use parse::{parse_context_xml, parse_web_xml};
pub use tunables::{LoaderTunables, DELEGATE_DEFAULT};

/// Archive entry holding the GlassFish descriptor.
pub const GLASSFISH_WEB_XML: &str = "WEB-INF/glassfish-web.xml";
/// Archive entry holding the Sun descriptor.
pub const SUN_WEB_XML: &str = "WEB-INF/sun-web.xml";
/// Archive entry holding the WebLogic descriptor.
pub const WEBLOGIC_XML: &str = "WEB-INF/weblogic.xml";

/// The vendor descriptor dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WebXmlDialect {
    GlassFish,
    Sun,
    WebLogic,
}

impl WebXmlDialect {
    /// Archive entry name of this dialect's descriptor.
    #[must_use]
    pub fn entry_name(self) -> &'static str {
        match self {
            WebXmlDialect::GlassFish => GLASSFISH_WEB_XML,
            WebXmlDialect::Sun => SUN_WEB_XML,
            WebXmlDialect::WebLogic => WEBLOGIC_XML,
        }
    }

    /// Expected root element of this dialect's descriptor.
    #[must_use]
    pub fn root_element(self) -> &'static str {
        match self {
            WebXmlDialect::GlassFish => "glassfish-web-app",
            WebXmlDialect::Sun => "sun-web-app",
            WebXmlDialect::WebLogic => "weblogic-web-app",
        }
    }
}

/// Process-wide descriptor precedence flags.
///
/// Captured once at startup and passed by value; tests inject flags instead
/// of mutating process state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DescriptorFlags {
    /// Prefer the GlassFish/Sun descriptor over `weblogic.xml` when both are
    /// present (`gfdd.over.wlsdd`).
    pub gf_over_wls: bool,
    /// Never use `weblogic.xml` (`ignore.wlsdd`).
    pub ignore_wls: bool,
}

impl DescriptorFlags {
    /// Read the flags from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            gf_over_wls: env_flag("gfdd.over.wlsdd"),
            ignore_wls: env_flag("ignore.wlsdd"),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

/// Choose the vendor dialect for an archive.
///
/// The first matching rule wins; the selector always returns a dialect, and
/// the chosen parser no-ops when the descriptor file turns out to be absent.
#[must_use]
pub fn select_dialect(
    archive: &WarArchive,
    flags: DescriptorFlags,
    runtime_alt_dd: Option<&Path>,
) -> WebXmlDialect {
    let has_wls_dd = archive.exists(WEBLOGIC_XML);
    if runtime_alt_dd.is_some_and(|alt| {
        alt.file_name().is_some_and(|name| name == "glassfish-web.xml") && alt.is_file()
    }) {
        WebXmlDialect::GlassFish
    } else if !flags.gf_over_wls && !flags.ignore_wls && has_wls_dd {
        WebXmlDialect::WebLogic
    } else if archive.exists(GLASSFISH_WEB_XML) {
        WebXmlDialect::GlassFish
    } else if archive.exists(SUN_WEB_XML) {
        WebXmlDialect::Sun
    } else if flags.gf_over_wls && !flags.ignore_wls && has_wls_dd {
        WebXmlDialect::WebLogic
    } else if flags.gf_over_wls || flags.ignore_wls {
        WebXmlDialect::GlassFish
    } else {
        WebXmlDialect::WebLogic
    }
}

/// Probe the archive for its declared version identifier.
///
/// XML or I/O failures are logged and mapped to `None`; deployment proceeds
/// without a version.
#[must_use]
pub fn version_identifier(
    archive: &WarArchive,
    flags: DescriptorFlags,
    runtime_alt_dd: Option<&Path>,
) -> Option<String> {
    let dialect = select_dialect(archive, flags, runtime_alt_dd);
    match parse_web_xml(archive, dialect) {
        Ok(tunables) => tunables.version_identifier,
        Err(err) => {
            tracing::error!(
                archive = %archive.path().display(),
                error = %err,
                "failed to read version identifier"
            );
            None
        }
    }
}
