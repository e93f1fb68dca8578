//! Content type table
//!
//! Parses `[Content_Types].xml` to resolve which parts carry the main
//! document, header, and footer content types. Producers vary in how they
//! name these parts, so resolution goes through this metadata instead of
//! assuming fixed names.

use crate::error::{Error, Result};
use crate::opc::PartUri;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Parsed content type table: extension defaults plus per-part overrides
#[derive(Clone, Debug, Default)]
pub struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<PartUri, String>,
}

impl ContentTypes {
    /// Parse a `[Content_Types].xml` part
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut ct = Self::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf).map_err(invalid)? {
                Event::Empty(e) | Event::Start(e) => match e.name().local_name().as_ref() {
                    b"Default" => {
                        let ext = required_attr(&e, "Extension")?;
                        ct.defaults
                            .insert(ext.to_lowercase(), required_attr(&e, "ContentType")?);
                    }
                    b"Override" => {
                        let uri = PartUri::new(&required_attr(&e, "PartName")?)?;
                        ct.overrides.insert(uri, required_attr(&e, "ContentType")?);
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(ct)
    }

    /// Content type of a part: override first, extension default second
    pub fn get(&self, uri: &PartUri) -> Option<&str> {
        if let Some(ct) = self.overrides.get(uri) {
            return Some(ct);
        }
        let ext = uri.extension()?.to_lowercase();
        self.defaults.get(&ext).map(String::as_str)
    }

    /// The part declared with the main document content type, if any
    pub fn main_document_part(&self) -> Option<&PartUri> {
        self.overrides
            .iter()
            .find(|(_, ct)| ct.as_str() == MAIN_DOCUMENT)
            .map(|(uri, _)| uri)
    }

    /// All parts declared with the given content type, sorted by name
    pub fn parts_by_type(&self, content_type: &str) -> Vec<&PartUri> {
        let mut uris: Vec<&PartUri> = self
            .overrides
            .iter()
            .filter(|(_, ct)| ct.as_str() == content_type)
            .map(|(uri, _)| uri)
            .collect();
        uris.sort_by_key(|u| u.entry_name());
        uris
    }
}

fn required_attr(e: &BytesStart, name: &str) -> Result<String> {
    e.try_get_attribute(name)
        .map_err(invalid)?
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
        .ok_or_else(|| {
            Error::InvalidPackage(format!(
                "[Content_Types].xml: '{}' without '{}' attribute",
                String::from_utf8_lossy(e.name().as_ref()),
                name
            ))
        })
}

fn invalid(e: impl std::fmt::Display) -> Error {
    Error::InvalidPackage(format!("[Content_Types].xml: {}", e))
}

// WordprocessingML content types the engine resolves parts by
pub const MAIN_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
pub const FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
