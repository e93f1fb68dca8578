//! Owned XML tree used by the transform adapter

mod tree;

pub use tree::{XmlDocument, XmlElement, XmlNode};
