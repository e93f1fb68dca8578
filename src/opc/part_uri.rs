//! Part URI handling
//!
//! `[Content_Types].xml` names parts with a leading slash
//! (`/word/document.xml`) while zip entries carry none
//! (`word/document.xml`). `PartUri` normalizes either spelling and hands
//! out the entry form, which is what every archive lookup wants.

use crate::error::{Error, Result};
use std::fmt;

/// Normalized location of a part within the package, stored in zip entry
/// form (no leading slash).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartUri {
    entry: String,
}

impl PartUri {
    /// Normalize a part name from either spelling.
    ///
    /// Rejects empty names and names with empty path segments.
    pub fn new(path: &str) -> Result<Self> {
        let entry = path.trim().trim_start_matches('/').trim_end_matches('/');

        if entry.is_empty() {
            return Err(Error::InvalidPackage("empty part URI".into()));
        }
        if entry.split('/').any(str::is_empty) {
            return Err(Error::InvalidPackage(format!(
                "part URI '{}' has an empty path segment",
                path
            )));
        }

        Ok(Self {
            entry: entry.to_string(),
        })
    }

    /// The zip entry name, e.g. `word/document.xml`
    pub fn entry_name(&self) -> &str {
        &self.entry
    }

    /// Extension of the final path segment, if any
    pub fn extension(&self) -> Option<&str> {
        let file = self.entry.rsplit('/').next()?;
        match file.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }
}

impl fmt::Display for PartUri {
    // The OPC part-name form, leading slash included
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.entry)
    }
}
