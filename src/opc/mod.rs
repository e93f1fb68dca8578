//! Open Packaging Convention (OPC) layer
//!
//! Loads the ZIP-based package into an in-memory part map, resolves the
//! main document / header / footer parts from package metadata, and writes
//! the package back with untouched entries preserved byte-for-byte.

mod content_types;
mod package;
mod part;
mod part_uri;
mod relationships;

pub use content_types::{ContentTypes, FOOTER, HEADER, MAIN_DOCUMENT};
pub use package::TemplatePackage;
pub use part::Part;
pub use part_uri::PartUri;
pub use relationships::{rel_types, Relationship, Relationships};
