//! Template processing - the mail-merge engine
//!
//! A [`TemplateProcessor`] owns one in-memory package and mutates its part
//! text directly: placeholder substitution, table-row cloning, block
//! cloning/replacement, and caller-supplied tree transforms. Every search
//! runs over scanner-normalized text; raw text is never searched.

mod blocks;
mod placeholder;
mod rows;
mod scanner;

pub use placeholder::VariableIndex;
pub use scanner::fix_broken_macros;

use crate::error::{Error, Result};
use crate::opc::TemplatePackage;
use crate::transform::{self, Stylesheet};
use crate::xml::XmlDocument;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mail-merge processor over a DOCX template package.
///
/// Not safe for concurrent use; one processor owns one package for its
/// whole lifetime, from load to save.
#[derive(Debug)]
pub struct TemplateProcessor {
    package: TemplatePackage,
}

impl TemplateProcessor {
    /// Open a template from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(TemplatePackage::open(path)?))
    }

    /// Open a template from bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(Self::new(TemplatePackage::from_bytes(bytes)?))
    }

    fn new(package: TemplatePackage) -> Self {
        let mut processor = Self { package };
        processor.ensure_scanned();
        processor
    }

    /// Get the underlying package
    pub fn package(&self) -> &TemplatePackage {
        &self.package
    }

    /// Get the underlying package mutably
    pub fn package_mut(&mut self) -> &mut TemplatePackage {
        &mut self.package
    }

    /// Distinct base placeholder names across all template parts, in
    /// first-encountered order (main document, then headers, then footers).
    /// Block markers are excluded.
    pub fn variables(&mut self) -> Vec<String> {
        self.index().names().to_vec()
    }

    /// Base placeholder name -> occurrence count across all template
    /// parts, `#index` variants merged into their base
    pub fn variable_count(&mut self) -> HashMap<String, usize> {
        self.index().counts().clone()
    }

    fn index(&mut self) -> VariableIndex {
        self.ensure_scanned();
        let texts: Vec<&str> = self
            .package
            .template_parts()
            .filter_map(|name| self.package.part_text(name))
            .collect();
        VariableIndex::build(texts.into_iter())
    }

    /// Replace every occurrence of a placeholder with an XML-escaped value.
    ///
    /// A bare `name` also matches its `#index` variants; an indexed name
    /// (`name#2`) matches only that variant. No occurrence is a no-op.
    pub fn set_value(&mut self, name: &str, value: &str) {
        self.set_value_limited(name, value, usize::MAX);
    }

    /// Like [`set_value`](Self::set_value), replacing at most `limit`
    /// occurrences in document order across all parts combined
    pub fn set_value_limited(&mut self, name: &str, value: &str, limit: usize) {
        self.ensure_scanned();
        let re = placeholder::target_re(name);
        let escaped = placeholder::escape_value(value);

        let mut remaining = limit;
        for part_name in self.part_names() {
            if remaining == 0 {
                break;
            }
            let (new_text, matched) = match self.package.part_text(&part_name) {
                Some(text) => {
                    let matched = re.find_iter(text).take(remaining).count();
                    if matched == 0 {
                        continue;
                    }
                    let new_text = re
                        .replacen(text, remaining, regex::NoExpand(&escaped))
                        .into_owned();
                    (new_text, matched)
                }
                None => continue,
            };
            self.package.set_part_text(&part_name, new_text);
            remaining -= matched;
        }
    }

    /// Set several placeholders at once
    pub fn set_values(&mut self, pairs: &[(&str, &str)]) {
        for &(name, value) in pairs {
            self.set_value(name, value);
        }
    }

    /// Clone the table row containing the named placeholder.
    ///
    /// Produces `count` clones in place of the original row; within clone
    /// `i` every placeholder carries the suffix `#i`, and the bare row does
    /// not survive. `count == 0` removes the row. Clone numbering restarts
    /// at 1 on every call. Fails with [`Error::RowNotFound`] if the
    /// placeholder occurs in no table row of any part.
    pub fn clone_row(&mut self, name: &str, count: usize) -> Result<()> {
        self.ensure_scanned();
        let base = placeholder::strip_wrapper(name).to_string();
        let token = placeholder::wrap(&base);

        for part_name in self.part_names() {
            let cloned = self
                .package
                .part_text(&part_name)
                .and_then(|text| rows::clone_row(text, &token, count));
            if let Some(new_text) = cloned {
                debug!("cloneRow '{}' x{} in part '{}'", base, count, part_name);
                self.package.set_part_text(&part_name, new_text);
                return Ok(());
            }
        }

        Err(Error::RowNotFound(base))
    }

    /// Clone the `${name}` ... `${/name}` delimited block.
    ///
    /// Emits `count` copies of the enclosed content; the marker-bearing
    /// paragraphs are removed. With `index_variables`, placeholders inside
    /// copy `i` carry the suffix `#i`. With `replace` (the usual mode) the
    /// copies stand in for the original content; otherwise they are
    /// appended after it. Fails with [`Error::TemplateSyntax`] on missing,
    /// unmatched, or overlapping markers.
    pub fn clone_block(
        &mut self,
        name: &str,
        count: usize,
        replace: bool,
        index_variables: bool,
    ) -> Result<()> {
        self.ensure_scanned();
        let base = placeholder::strip_wrapper(name).to_string();

        for part_name in self.part_names() {
            let cloned = match self.package.part_text(&part_name) {
                Some(text) => blocks::clone_block(text, &base, count, replace, index_variables)?,
                None => None,
            };
            if let Some(new_text) = cloned {
                debug!("cloneBlock '{}' x{} in part '{}'", base, count, part_name);
                self.package.set_part_text(&part_name, new_text);
                return Ok(());
            }
        }

        Err(block_not_found(&base))
    }

    /// Replace the `${name}` ... `${/name}` delimited region, markers
    /// included, with the caller-supplied markup fragment
    pub fn replace_block(&mut self, name: &str, fragment: &str) -> Result<()> {
        self.ensure_scanned();
        let base = placeholder::strip_wrapper(name).to_string();

        for part_name in self.part_names() {
            let replaced = match self.package.part_text(&part_name) {
                Some(text) => blocks::replace_block(text, &base, fragment)?,
                None => None,
            };
            if let Some(new_text) = replaced {
                debug!("replaceBlock '{}' in part '{}'", base, part_name);
                self.package.set_part_text(&part_name, new_text);
                return Ok(());
            }
        }

        Err(block_not_found(&base))
    }

    /// Delete the `${name}` ... `${/name}` delimited region, markers
    /// included
    pub fn delete_block(&mut self, name: &str) -> Result<()> {
        self.replace_block(name, "")
    }

    /// Apply a stylesheet to the main document part
    pub fn apply_stylesheet(&mut self, sheet: &dyn Stylesheet, params: &[(&str, &str)]) -> Result<()> {
        let main = self.package.main_part().to_string();
        self.apply_stylesheet_to(&main, sheet, params)
    }

    /// Apply a stylesheet to one template part.
    ///
    /// Parses the part as a tree ([`Error::XmlLoad`] if not well-formed),
    /// binds the supplied parameters ([`Error::XslParameter`] on failure),
    /// and replaces the part's stored text with the serialized result.
    pub fn apply_stylesheet_to(
        &mut self,
        part: &str,
        sheet: &dyn Stylesheet,
        params: &[(&str, &str)],
    ) -> Result<()> {
        self.ensure_scanned();
        let bound = transform::bind_parameters(sheet, params)?;

        let text = self
            .package
            .part_text(part)
            .ok_or_else(|| Error::XmlLoad(format!("no such template part '{}'", part)))?;
        let mut doc = XmlDocument::parse(text)?;
        sheet.transform(&mut doc, &bound)?;
        let new_text = doc.to_xml_string()?;

        self.package.set_part_text(part, new_text);
        Ok(())
    }

    /// Save to a fresh temporary file and return its path
    pub fn save(&self) -> Result<PathBuf> {
        self.package.save()
    }

    /// Save to a caller-chosen path, atomically
    pub fn save_as<P: AsRef<Path>>(&self, target: P) -> Result<()> {
        self.package.save_as(target)
    }

    /// Re-run the macro scanner over any part whose text changed since its
    /// last scan. Idempotent on already-normalized text.
    fn ensure_scanned(&mut self) {
        for name in self.part_names() {
            let pending = self
                .package
                .part(&name)
                .map(|p| !p.is_scanned())
                .unwrap_or(false);
            if !pending {
                continue;
            }
            let fixed = match self.package.part_text(&name) {
                Some(text) => scanner::fix_broken_macros(text),
                None => continue,
            };
            if let Some(part) = self.package.part_mut(&name) {
                part.store_scanned(fixed);
            }
        }
    }

    fn part_names(&self) -> Vec<String> {
        self.package.template_parts().map(String::from).collect()
    }
}

fn block_not_found(name: &str) -> Error {
    Error::TemplateSyntax(format!("block '{}' not found in any part", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

    fn package(document_body: &str, header_body: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buf));
        let options: FileOptions<()> = FileOptions::default();
        let entries = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            (
                "word/document.xml",
                format!("<w:document><w:body>{}</w:body></w:document>", document_body),
            ),
            ("word/header1.xml", format!("<w:hdr>{}</w:hdr>", header_body)),
        ];
        for (name, data) in entries {
            zip.start_file(name, options).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        buf
    }

    fn para(text: &str) -> String {
        format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
    }

    #[test]
    fn test_broken_macros_fixed_at_load() {
        let bytes = package("<w:p><w:r><w:t>$</w:t><w:t>{name}</w:t></w:r></w:p>", "");
        let mut processor = TemplateProcessor::from_bytes(bytes).unwrap();
        assert_eq!(processor.variables(), vec!["name".to_string()]);
    }

    #[test]
    fn test_set_value_limit_spans_parts() {
        let bytes = package(&para("${v} and ${v}"), &para("${v}"));
        let mut processor = TemplateProcessor::from_bytes(bytes).unwrap();

        // Two replacements are used up in the document, none left for the header
        processor.set_value_limited("v", "x", 2);

        let doc = processor.package().part_text("word/document.xml").unwrap();
        let hdr = processor.package().part_text("word/header1.xml").unwrap();
        assert!(!doc.contains("${v}"));
        assert!(hdr.contains("${v}"));
    }

    #[test]
    fn test_set_value_escapes_xml() {
        let bytes = package(&para("${v}"), "");
        let mut processor = TemplateProcessor::from_bytes(bytes).unwrap();
        processor.set_value("v", "a < b & c");

        let doc = processor.package().part_text("word/document.xml").unwrap();
        assert!(doc.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_set_value_accepts_wrapped_name() {
        let bytes = package(&para("${v}"), "");
        let mut processor = TemplateProcessor::from_bytes(bytes).unwrap();
        processor.set_value("${v}", "x");
        assert!(processor.variables().is_empty());
    }

    #[test]
    fn test_set_value_without_match_is_noop() {
        let bytes = package(&para("plain"), "");
        let mut processor = TemplateProcessor::from_bytes(bytes).unwrap();
        processor.set_value("missing", "x");
        assert!(processor.package().part_text("word/document.xml").unwrap().contains("plain"));
    }

    #[test]
    fn test_clone_row_not_found() {
        let bytes = package(&para("${v}"), "");
        let mut processor = TemplateProcessor::from_bytes(bytes).unwrap();
        let err = processor.clone_row("v", 2).unwrap_err();
        assert!(matches!(err, Error::RowNotFound(name) if name == "v"));
    }

    #[test]
    fn test_mutated_part_is_rescanned_before_next_search() {
        let body = format!("{}{}{}", para("${R}"), para("old"), para("${/R}"));
        let bytes = package(&body, "");
        let mut processor = TemplateProcessor::from_bytes(bytes).unwrap();

        // Fragment arrives with a macro split across two leaves
        let fragment = "<w:p><w:r><w:t>$</w:t><w:t>{merged}</w:t></w:r></w:p>";
        processor.replace_block("R", fragment).unwrap();

        assert_eq!(processor.variables(), vec!["merged".to_string()]);
        processor.set_value("merged", "done");
        let doc = processor.package().part_text("word/document.xml").unwrap();
        assert!(doc.contains("done"));
        assert!(!doc.contains("${merged}"));
    }
}
