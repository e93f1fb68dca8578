//! Small owned XML tree with round-trip parse and serialization
//!
//! The transform adapter hands stylesheets a parsed part instead of raw
//! markup text. Whitespace, comments, and unknown elements are kept intact
//! so a transform that touches nothing serializes back unchanged in
//! structure.

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Cursor};

/// XML node
#[derive(Clone, Debug)]
pub enum XmlNode {
    /// Element node
    Element(XmlElement),
    /// Text node (unescaped content)
    Text(String),
    /// Comment node
    Comment(String),
}

/// XML element with attributes and children
#[derive(Clone, Debug)]
pub struct XmlElement {
    /// Full element name with prefix, e.g. "w:tbl"
    pub name: String,
    /// Attributes as (name, value) pairs, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes
    pub children: Vec<XmlNode>,
    /// Whether this was a self-closing element
    pub self_closing: bool,
}

/// A parsed XML part: optional declaration plus the root element
#[derive(Clone, Debug)]
pub struct XmlDocument {
    decl: Option<BytesDecl<'static>>,
    /// Root element
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parse a part's XML text into a tree.
    ///
    /// Fails with [`Error::XmlLoad`] if the text is not well-formed.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut decl = None;
        let mut root = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf).map_err(xml_load)? {
                Event::Decl(d) => decl = Some(d.into_owned()),
                Event::Start(e) => {
                    root = Some(XmlElement::from_reader(&mut reader, &e)?);
                }
                Event::Empty(e) => root = Some(XmlElement::from_empty(&e)?),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let root = root.ok_or_else(|| Error::XmlLoad("no root element".into()))?;
        Ok(Self { decl, root })
    }

    /// Serialize the tree back to XML text
    pub fn to_xml_string(&self) -> Result<String> {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = Writer::new(&mut buffer);

        if let Some(decl) = &self.decl {
            writer.write_event(Event::Decl(decl.clone())).map_err(write_err)?;
        }
        self.root.write_to(&mut writer)?;

        String::from_utf8(buffer.into_inner()).map_err(|e| Error::XmlLoad(e.to_string()))
    }
}

impl XmlElement {
    /// Read a complete element (start tag already consumed)
    fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let attributes = read_attributes(start)?;

        let mut children = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf).map_err(xml_load)? {
                Event::Start(e) => {
                    let child = Self::from_reader(reader, &e)?;
                    children.push(XmlNode::Element(child));
                }
                Event::Empty(e) => {
                    children.push(XmlNode::Element(Self::from_empty(&e)?));
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(xml_load)?.to_string();
                    children.push(XmlNode::Text(text));
                }
                Event::CData(c) => {
                    children.push(XmlNode::Text(
                        String::from_utf8_lossy(c.as_ref()).to_string(),
                    ));
                }
                Event::Comment(c) => {
                    children.push(XmlNode::Comment(String::from_utf8_lossy(&c).to_string()));
                }
                Event::End(e) => {
                    if e.name().as_ref() == name.as_bytes() {
                        break;
                    }
                }
                Event::Eof => return Err(Error::XmlLoad(format!("unclosed element '{}'", name))),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self {
            name,
            attributes,
            children,
            self_closing: false,
        })
    }

    fn from_empty(e: &BytesStart) -> Result<Self> {
        Ok(Self {
            name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
            attributes: read_attributes(e)?,
            children: Vec::new(),
            self_closing: true,
        })
    }

    /// Concatenated text content of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
                XmlNode::Comment(_) => {}
            }
        }
    }

    /// Child elements of this element
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Write element to XML writer
    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(&self.name);
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.self_closing {
            writer.write_event(Event::Empty(start)).map_err(write_err)?;
        } else {
            writer.write_event(Event::Start(start)).map_err(write_err)?;
            for child in &self.children {
                child.write_to(writer)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(&self.name)))
                .map_err(write_err)?;
        }

        Ok(())
    }
}

impl XmlNode {
    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            XmlNode::Element(e) => e.write_to(writer),
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(write_err),
            XmlNode::Comment(c) => writer
                .write_event(Event::Comment(BytesText::from_escaped(c.as_str())))
                .map_err(write_err),
        }
    }
}

fn read_attributes(e: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::XmlLoad(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(xml_load)?.to_string();
        attributes.push((key, value));
    }
    Ok(attributes)
}

fn xml_load<E: std::fmt::Display>(e: E) -> Error {
    Error::XmlLoad(e.to_string())
}

fn write_err<E: std::fmt::Display>(e: E) -> Error {
    Error::XmlLoad(e.to_string())
}
