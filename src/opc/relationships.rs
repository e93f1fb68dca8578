//! Package relationship metadata
//!
//! Parses `_rels/.rels`. The template engine only reads relationships, as
//! a fallback route to the main document part when the content-type table
//! does not declare one; nothing here is ever written back.

use crate::error::{Error, Result};
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;

/// A single relationship entry
#[derive(Clone, Debug)]
pub struct Relationship {
    /// Relationship id, e.g. "rId1"
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target part, package-relative
    pub target: String,
}

/// Parsed relationship part, in document order
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut items = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::InvalidPackage(format!("relationships: {}", e)))?
            {
                Event::Start(e) | Event::Empty(e)
                    if e.name().local_name().as_ref() == b"Relationship" =>
                {
                    items.push(read_relationship(&e)?);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { items })
    }

    /// First relationship of the given type
    pub fn by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn read_relationship(e: &BytesStart) -> Result<Relationship> {
    let mut id = None;
    let mut rel_type = None;
    let mut target = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::InvalidPackage(format!("relationships: {}", e)))?;
        let value = || String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.local_name().as_ref() {
            b"Id" => id = Some(value()),
            b"Type" => rel_type = Some(value()),
            b"Target" => target = Some(value()),
            _ => {}
        }
    }

    let missing =
        |attr: &str| Error::InvalidPackage(format!("Relationship missing attribute '{}'", attr));
    Ok(Relationship {
        id: id.ok_or_else(|| missing("Id"))?,
        rel_type: rel_type.ok_or_else(|| missing("Type"))?,
        target: target.ok_or_else(|| missing("Target"))?,
    })
}

/// Relationship type URIs the engine recognizes
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const HEADER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const FOOTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
}
