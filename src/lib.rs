//! # docx-templater
//!
//! Mail-merge template processing for DOCX packages.
//!
//! A DOCX file is a ZIP package of XML parts. This crate treats such a
//! package as a template: `${placeholder}` tokens embedded in the document,
//! header, and footer parts are located (even when Word has fragmented them
//! across run boundaries), substituted, and repeating table rows or
//! `${NAME}`...`${/NAME}` blocks are duplicated. Untouched package entries
//! round-trip byte-for-byte.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docx_templater::TemplateProcessor;
//!
//! let mut processor = TemplateProcessor::open("invoice-template.docx")?;
//!
//! processor.set_value("customer.name", "ACME Corp");
//! processor.clone_row("item.description", 3);
//! processor.set_value("item.description#1", "Widgets");
//! processor.delete_block("OPTIONAL_SECTION");
//!
//! processor.save_as("invoice.docx")?;
//! ```

pub mod error;
pub mod opc;
pub mod template;
pub mod transform;
pub mod xml;

pub use error::{Error, Result};
pub use opc::{Part, TemplatePackage};
pub use template::{fix_broken_macros, TemplateProcessor, VariableIndex};
pub use transform::{PruneByNeedle, Stylesheet};
