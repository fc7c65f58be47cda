//! Pull parsers for the vendor web descriptors and `context.xml`.
//!
//! All dialects share the same skeleton: skip to the expected root element,
//! walk start elements, and skip any subtree the dialect doesn't recognize.
//! The readers run to completion; a malformed document fails the whole parse
//! and no partial tunables are kept.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use war_archive::WarArchive;

use crate::error::DescriptorError;
use crate::tunables::LoaderTunables;
use crate::WebXmlDialect;

/// Parse failure before it is attached to a descriptor name and location.
enum ParseFailure {
    Xml(quick_xml::Error),
    Invalid(String),
}

impl From<quick_xml::Error> for ParseFailure {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err)
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseFailure {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.into())
    }
}

/// Parse the dialect's descriptor out of the archive.
///
/// A missing descriptor entry is not an error: the returned tunables are the
/// defaults. Any read or parse failure is wrapped with the descriptor name
/// and the archive path.
pub fn parse_web_xml(
    archive: &WarArchive,
    dialect: WebXmlDialect,
) -> Result<LoaderTunables, DescriptorError> {
    let entry = dialect.entry_name();
    let bytes = archive.read(entry).map_err(|source| DescriptorError::Io {
        entry: entry.to_string(),
        archive: archive.path().to_path_buf(),
        source,
    })?;

    let mut tunables = LoaderTunables::default();
    let Some(bytes) = bytes else {
        return Ok(tunables);
    };

    let text = String::from_utf8(bytes).map_err(|_| DescriptorError::Invalid {
        entry: entry.to_string(),
        archive: archive.path().to_path_buf(),
        reason: "descriptor is not valid UTF-8".to_string(),
    })?;

    let result = match dialect {
        WebXmlDialect::Sun | WebXmlDialect::GlassFish => {
            run_sun_dialect(&text, dialect.root_element(), &mut tunables)
        }
        WebXmlDialect::WebLogic => run_weblogic_dialect(&text, &mut tunables),
    };

    match result {
        Ok(()) => Ok(tunables),
        Err(ParseFailure::Xml(source)) => Err(DescriptorError::Xml {
            entry: entry.to_string(),
            archive: archive.path().to_path_buf(),
            source,
        }),
        Err(ParseFailure::Invalid(reason)) => Err(DescriptorError::Invalid {
            entry: entry.to_string(),
            archive: archive.path().to_path_buf(),
            reason,
        }),
    }
}

/// Parse a `context.xml` file and extract the global `clearReferencesStatic`
/// attribute.
///
/// Only the first `Context` element without a `path` attribute is consulted;
/// path-bound contexts are per-URL overrides and are ignored. A missing file
/// yields `Ok(None)`.
pub fn parse_context_xml(path: &Path) -> Result<Option<bool>, DescriptorError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::FileIo {
        path: path.to_path_buf(),
        source,
    })?;

    match run_context(&text) {
        Ok(value) => Ok(value),
        Err(ParseFailure::Xml(source)) => Err(DescriptorError::FileXml {
            path: path.to_path_buf(),
            source,
        }),
        Err(ParseFailure::Invalid(reason)) => Err(DescriptorError::FileInvalid {
            path: path.to_path_buf(),
            reason,
        }),
    }
}

fn run_sun_dialect(
    text: &str,
    root_element: &str,
    tunables: &mut LoaderTunables,
) -> Result<(), ParseFailure> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    skip_root(&mut reader, root_element)?;

    let mut in_class_loader = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"class-loader" => {
                    read_class_loader_attributes(&e, tunables)?;
                    in_class_loader = true;
                }
                b"property" => {
                    read_property(&e, in_class_loader, tunables)?;
                    reader.read_to_end(e.name())?;
                }
                b"version-identifier" => {
                    let value = reader.read_text(e.name())?;
                    tunables.version_identifier = Some(value.trim().to_string());
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"class-loader" => {
                    // Self-closing element carries attributes but no body.
                    read_class_loader_attributes(&e, tunables)?;
                }
                b"property" => read_property(&e, in_class_loader, tunables)?,
                b"version-identifier" => tunables.version_identifier = Some(String::new()),
                _ => {}
            },
            Event::End(e) => {
                if in_class_loader && e.local_name().as_ref() == b"class-loader" {
                    in_class_loader = false;
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

fn run_weblogic_dialect(text: &str, tunables: &mut LoaderTunables) -> Result<(), ParseFailure> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    skip_root(&mut reader, "weblogic-web-app")?;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"prefer-web-inf-classes" => {
                    // WebLogic models the inverse of the delegation flag.
                    let value = reader.read_text(e.name())?;
                    tunables.delegate = !parse_java_boolean(&value);
                    return Ok(());
                }
                b"container-descriptor" => {}
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"prefer-web-inf-classes" {
                    tunables.delegate = true;
                    return Ok(());
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

fn run_context(text: &str) -> Result<Option<bool>, ParseFailure> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"Context" {
                    let (path, clear_references) = context_attributes(&e)?;
                    // Only the global, path-less context applies here;
                    // children of a path-bound one are skipped individually.
                    if path.is_none() {
                        return Ok(clear_references);
                    }
                } else {
                    reader.read_to_end(e.name())?;
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"Context" {
                    let (path, clear_references) = context_attributes(&e)?;
                    if path.is_none() {
                        return Ok(clear_references);
                    }
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn context_attributes(e: &BytesStart<'_>) -> Result<(Option<String>, Option<bool>), ParseFailure> {
    let mut path = None;
    let mut clear_references = None;
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.local_name().as_ref() {
            b"path" => path = Some(value.into_owned()),
            b"clearReferencesStatic" => clear_references = Some(parse_java_boolean(&value)),
            _ => {}
        }
    }
    Ok((path, clear_references))
}

fn read_class_loader_attributes(
    e: &BytesStart<'_>,
    tunables: &mut LoaderTunables,
) -> Result<(), ParseFailure> {
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.local_name().as_ref() {
            b"delegate" => tunables.delegate = parse_java_boolean(&value),
            b"extra-class-path" => tunables.extra_class_path = Some(value.into_owned()),
            b"dynamic-reload-interval" => {
                // Recognized but unsupported.
                tracing::warn!(
                    value = %value,
                    "dynamic-reload-interval is not supported and will be ignored"
                );
            }
            _ => {}
        }
    }
    Ok(())
}

fn read_property(
    e: &BytesStart<'_>,
    in_class_loader: bool,
    tunables: &mut LoaderTunables,
) -> Result<(), ParseFailure> {
    let mut name = None;
    let mut value = None;
    for attr in e.attributes() {
        let attr = attr?;
        let text = attr.unescape_value()?;
        match attr.key.local_name().as_ref() {
            b"name" => name = Some(text.into_owned()),
            b"value" => value = Some(text.into_owned()),
            _ => {}
        }
    }
    let (Some(name), Some(value)) = (name, value) else {
        return Err(ParseFailure::Invalid(
            "property element is missing a name or value attribute".to_string(),
        ));
    };

    if in_class_loader {
        if name == "ignoreHiddenJarFiles" {
            tunables.ignore_hidden_jar_files = parse_java_boolean(&value);
        } else {
            tracing::warn!(
                property = %name,
                value = %value,
                "unrecognized class-loader property"
            );
        }
    } else if name.eq_ignore_ascii_case("useMyFaces") || name.eq_ignore_ascii_case("useBundledJsf")
    {
        tunables.use_bundled_jsf = parse_java_boolean(&value);
    }
    Ok(())
}

fn skip_root(reader: &mut Reader<&[u8]>, expected: &str) -> Result<(), ParseFailure> {
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.local_name();
                if name.as_ref() == expected.as_bytes() {
                    return Ok(());
                }
                return Err(ParseFailure::Invalid(format!(
                    "unexpected root element <{}>, expected <{}>",
                    String::from_utf8_lossy(name.as_ref()),
                    expected
                )));
            }
            Event::Eof => {
                return Err(ParseFailure::Invalid(
                    "unexpected end of document".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Permissive boolean parse matching `Boolean.valueOf`: case-insensitive
/// `"true"` is true, everything else is false.
fn parse_java_boolean(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
