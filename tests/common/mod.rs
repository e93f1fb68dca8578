//! Shared fixture builder: assembles minimal DOCX packages in memory
#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::ZipArchive;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>
  <Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>
</Types>"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

pub const STYLES: &str = "<w:styles><w:docDefaults/></w:styles>";

/// Build a package with the given body content for document, header, and
/// footer parts, plus an untouched styles part
pub fn build_package(doc_body: &str, header_body: &str, footer_body: &str) -> Vec<u8> {
    let entries = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", RELS.to_string()),
        (
            "word/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
                doc_body
            ),
        ),
        ("word/header1.xml", format!("<w:hdr>{}</w:hdr>", header_body)),
        ("word/footer1.xml", format!("<w:ftr>{}</w:ftr>", footer_body)),
        ("word/styles.xml", STYLES.to_string()),
    ];
    build_zip(&entries)
}

/// Build an arbitrary zip from (entry name, content) pairs
pub fn build_zip(entries: &[(&str, String)]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buf));
    let options: FileOptions<()> = FileOptions::default();
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    buf
}

/// Read one entry of a zip package back as text
pub fn read_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut text = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text
}

/// A paragraph holding a single run of text
pub fn para(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
}

/// A one-cell table row
pub fn table_row(text: &str) -> String {
    format!(
        "<w:tr><w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc></w:tr>",
        text
    )
}

/// A table from pre-built rows
pub fn table(rows: &str) -> String {
    format!("<w:tbl><w:tblPr/><w:tblGrid/>{}</w:tbl>", rows)
}
