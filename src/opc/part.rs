//! Part representation for template packages

/// An XML part held in memory for template processing.
///
/// Only the parts the template engine edits (main document, headers,
/// footers) are materialized as `Part`s; everything else in the package
/// stays in the source archive and is copied through untouched on save.
#[derive(Clone, Debug)]
pub struct Part {
    /// Zip entry name, e.g. `word/document.xml`
    name: String,
    /// Part XML text
    text: String,
    /// Whether this part has been modified since load
    modified: bool,
    /// Whether the macro scanner has run since the last text change
    scanned: bool,
}

impl Part {
    /// Create a new part from its zip entry name and XML text
    pub fn new(name: impl Into<String>, text: String) -> Self {
        Self {
            name: name.into(),
            text,
            modified: false,
            scanned: false,
        }
    }

    /// Get the zip entry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the XML text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the XML text, marking the part dirty and in need of a re-scan
    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.modified = true;
        self.scanned = false;
    }

    /// Store scanner-normalized text.
    ///
    /// Marks the part dirty only if normalization changed anything, so an
    /// untouched part still round-trips byte-for-byte.
    pub(crate) fn store_scanned(&mut self, normalized: String) {
        if normalized != self.text {
            self.text = normalized;
            self.modified = true;
        }
        self.scanned = true;
    }

    /// Check if the part has been modified
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Check if the current text is scanner-normalized
    pub fn is_scanned(&self) -> bool {
        self.scanned
    }
}
