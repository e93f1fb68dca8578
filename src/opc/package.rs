//! Template package implementation
//!
//! Loads a DOCX ZIP package into an in-memory map of editable XML parts and
//! writes it back. Entries the engine never touched are raw-copied from the
//! source archive, byte-identical and without recompression.

use crate::error::{Error, Result};
use crate::opc::content_types::{self, ContentTypes};
use crate::opc::relationships::{rel_types, Relationships};
use crate::opc::{Part, PartUri};
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use zip::read::ZipArchive;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// A DOCX package opened for template processing.
///
/// Holds the raw source archive plus the template parts (main document,
/// headers, footers) extracted as XML text. Saving rebuilds the archive from
/// the source, substituting only the parts that were modified.
#[derive(Debug)]
pub struct TemplatePackage {
    /// Raw bytes of the source archive
    source: Vec<u8>,
    /// Zip entry name of the main document part
    main_part: String,
    /// Header part names, sorted
    headers: Vec<String>,
    /// Footer part names, sorted
    footers: Vec<String>,
    /// Editable parts by zip entry name
    parts: HashMap<String, Part>,
}

impl TemplatePackage {
    /// Open a package from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read(path).map_err(|source| Error::PackageNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(source)
    }

    /// Open a package from bytes
    pub fn from_bytes(source: Vec<u8>) -> Result<Self> {
        let (main_part, headers, footers, parts) = {
            let mut archive = ZipArchive::new(Cursor::new(source.as_slice()))
                .map_err(|e| Error::InvalidPackage(e.to_string()))?;

            // Required structural metadata
            let ct_xml = read_entry_text(&mut archive, "[Content_Types].xml")?
                .ok_or_else(|| Error::InvalidPackage("missing [Content_Types].xml".into()))?;
            let content_types = ContentTypes::from_xml(&ct_xml)?;

            let rels = match read_entry_text(&mut archive, "_rels/.rels")? {
                Some(xml) => Relationships::from_xml(&xml)?,
                None => Relationships::new(),
            };

            let main_part = resolve_main_part(&content_types, &rels)?;
            let headers = discover_parts(&content_types, &archive, content_types::HEADER, "header");
            let footers = discover_parts(&content_types, &archive, content_types::FOOTER, "footer");

            let mut parts = HashMap::new();
            let main_text = read_entry_text(&mut archive, &main_part)?
                .ok_or(Error::MainPartNotFound)?;
            parts.insert(main_part.clone(), Part::new(main_part.clone(), main_text));

            for name in headers.iter().chain(footers.iter()) {
                if let Some(text) = read_entry_text(&mut archive, name)? {
                    parts.insert(name.clone(), Part::new(name.clone(), text));
                }
            }

            (main_part, headers, footers, parts)
        };

        debug!(
            "opened package: main part '{}', {} header(s), {} footer(s)",
            main_part,
            headers.len(),
            footers.len()
        );

        Ok(Self {
            source,
            main_part,
            headers,
            footers,
            parts,
        })
    }

    /// Zip entry name of the main document part
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Header part names
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Footer part names
    pub fn footers(&self) -> &[String] {
        &self.footers
    }

    /// All template part names in processing order: main document, then
    /// headers, then footers
    pub fn template_parts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.main_part.as_str())
            .chain(self.headers.iter().map(|s| s.as_str()))
            .chain(self.footers.iter().map(|s| s.as_str()))
    }

    /// Get a part by zip entry name
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.get(name)
    }

    /// Get a part's XML text
    pub fn part_text(&self, name: &str) -> Option<&str> {
        self.parts.get(name).map(|p| p.text())
    }

    /// Replace a part's XML text, marking it dirty for write-back.
    ///
    /// Names of parts that are not in the template set are ignored.
    pub fn set_part_text(&mut self, name: &str, text: String) {
        match self.parts.get_mut(name) {
            Some(part) => part.set_text(text),
            None => log::warn!("set_part_text: unknown part '{}'", name),
        }
    }

    pub(crate) fn part_mut(&mut self, name: &str) -> Option<&mut Part> {
        self.parts.get_mut(name)
    }

    /// Write the package to a writer.
    ///
    /// Source entries without a dirty in-memory part are raw-copied with
    /// their original compressed data.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut archive = ZipArchive::new(Cursor::new(self.source.as_slice()))
            .map_err(|e| Error::Write(e.into()))?;
        let mut zip = ZipWriter::new(writer);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut rewritten = 0usize;
        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i).map_err(|e| Error::Write(e.into()))?;
            let name = entry.name().to_string();

            match self.parts.get(&name).filter(|p| p.is_modified()) {
                Some(part) => {
                    drop(entry);
                    zip.start_file(name, options)
                        .map_err(|e| Error::Write(e.into()))?;
                    zip.write_all(part.text().as_bytes()).map_err(Error::Write)?;
                    rewritten += 1;
                }
                None => {
                    zip.raw_copy_file(entry).map_err(|e| Error::Write(e.into()))?;
                }
            }
        }

        zip.finish().map_err(|e| Error::Write(e.into()))?;
        debug!(
            "wrote package: {} entries, {} rewritten from memory",
            archive.len(),
            rewritten
        );
        Ok(())
    }

    /// Save the package to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(Cursor::new(&mut buf))?;
        Ok(buf)
    }

    /// Save the package to a fresh temporary file and return its path.
    ///
    /// The file is kept; the caller owns it from here on.
    pub fn save(&self) -> Result<PathBuf> {
        let tmp = tempfile::Builder::new()
            .prefix("docx-templater-")
            .suffix(".docx")
            .tempfile()
            .map_err(Error::Write)?;
        self.write_to(tmp.as_file())?;
        let (_, path) = tmp.keep().map_err(|e| Error::Write(e.error))?;
        Ok(path)
    }

    /// Save the package to a caller-chosen path.
    ///
    /// Writes to a temporary file in the target directory and renames it
    /// into place only after the archive is fully written, so a failed save
    /// never clobbers a pre-existing file at the target. The temporary file
    /// is removed on every failure path.
    pub fn save_as<P: AsRef<Path>>(&self, target: P) -> Result<()> {
        let target = target.as_ref();
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(Error::Write)?;
        self.write_to(tmp.as_file())?;
        tmp.persist(target).map_err(|e| Error::Write(e.error))?;
        Ok(())
    }
}

/// Resolve the main document part name: content-type override first, then
/// the package-level officeDocument relationship. Producers vary, so the
/// name is never assumed.
fn resolve_main_part(content_types: &ContentTypes, rels: &Relationships) -> Result<String> {
    if let Some(uri) = content_types.main_document_part() {
        return Ok(uri.entry_name().to_string());
    }

    rels.by_type(rel_types::OFFICE_DOCUMENT)
        .and_then(|rel| PartUri::new(&rel.target).ok())
        .map(|uri| uri.entry_name().to_string())
        .ok_or(Error::MainPartNotFound)
}

/// Discover header or footer parts: content-type overrides first, falling
/// back to the conventional `word/headerN.xml` name pattern.
fn discover_parts<R: Read + Seek>(
    content_types: &ContentTypes,
    archive: &ZipArchive<R>,
    content_type: &str,
    kind: &str,
) -> Vec<String> {
    let from_types: Vec<String> = content_types
        .parts_by_type(content_type)
        .iter()
        .map(|uri| uri.entry_name().to_string())
        .collect();

    if !from_types.is_empty() {
        return from_types;
    }

    let re = part_name_pattern(kind);
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| re.is_match(name))
        .map(|name| name.to_string())
        .collect();
    names.sort();
    names
}

fn part_name_pattern(kind: &str) -> &'static Regex {
    static HEADER_RE: OnceLock<Regex> = OnceLock::new();
    static FOOTER_RE: OnceLock<Regex> = OnceLock::new();
    let (cell, pattern) = match kind {
        "header" => (&HEADER_RE, r"^word/header\d+\.xml$"),
        _ => (&FOOTER_RE, r"^word/footer\d+\.xml$"),
    };
    cell.get_or_init(|| Regex::new(pattern).expect("valid pattern"))
}

fn read_entry_text<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut text = String::new();
            file.read_to_string(&mut text)
                .map_err(|e| Error::InvalidPackage(format!("entry '{}': {}", name, e)))?;
            Ok(Some(text))
        }
        Err(_) => Ok(None),
    }
}
