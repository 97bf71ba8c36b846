//! Package metadata parsing: the properties descriptor and the filter
//! declaration, both XML.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("<filter> element #{0} has no root attribute")]
    MissingRoot(usize),
}

impl From<quick_xml::events::attributes::AttrError> for MetadataError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.into())
    }
}

/// Fields read from the package descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageProperties {
    pub name: Option<String>,
    pub group: Option<String>,
    pub version: Option<String>,
}

/// Parse a Java-style XML properties document:
///
/// ```xml
/// <properties>
///   <entry key="name">site-content</entry>
///   <entry key="group">my_packages</entry>
/// </properties>
/// ```
pub fn parse_properties(xml: &str) -> Result<PackageProperties, MetadataError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut props = PackageProperties::default();
    let mut current: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"entry" => {
                current = attribute(&e, b"key")?;
                text.clear();
            }
            Event::Text(t) if current.is_some() => text.push_str(&t.unescape()?),
            Event::CData(c) if current.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Event::End(e) if e.name().as_ref() == b"entry" => {
                let value = non_empty(&text);
                match current.take().as_deref() {
                    Some("name") => props.name = value,
                    Some("group") => props.group = value,
                    Some("version") => props.version = value,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(props)
}

/// Parse filter roots from a workspace filter document, in document order:
///
/// ```xml
/// <workspaceFilter version="1.0">
///   <filter root="/content/site"/>
/// </workspaceFilter>
/// ```
pub fn parse_filter_roots(xml: &str) -> Result<Vec<String>, MetadataError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut roots = Vec::new();
    let mut index = 0;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"filter" => {
                index += 1;
                let root = attribute(&e, b"root")?.ok_or(MetadataError::MissingRoot(index))?;
                roots.push(root);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(roots)
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, MetadataError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
