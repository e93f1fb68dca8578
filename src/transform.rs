//! Transform adapter: caller-supplied tree transforms over template parts
//!
//! A [`Stylesheet`] declares the parameters it accepts and rewrites a
//! parsed part tree. The processor parses the part, binds the supplied
//! parameters, runs the transform, and stores the serialized result back
//! into the part.

use crate::error::{Error, Result};
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use std::collections::HashMap;

/// A generic tree transform with named parameters.
pub trait Stylesheet {
    /// Names of the parameters this stylesheet accepts
    fn parameter_names(&self) -> &[&str];

    /// Rewrite the document in place
    fn transform(&self, doc: &mut XmlDocument, params: &HashMap<String, String>) -> Result<()>;
}

/// Bind caller-supplied parameters against a stylesheet's declared names.
///
/// Fails with [`Error::XslParameter`] for a name the stylesheet does not
/// declare or one that is not a well-formed parameter name.
pub(crate) fn bind_parameters(
    sheet: &dyn Stylesheet,
    params: &[(&str, &str)],
) -> Result<HashMap<String, String>> {
    let mut bound = HashMap::new();
    for &(name, value) in params {
        if !is_valid_name(name) || !sheet.parameter_names().contains(&name) {
            return Err(Error::XslParameter(name.to_string()));
        }
        bound.insert(name.to_string(), value.to_string());
    }
    Ok(bound)
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Removes every element of a given name whose text content contains the
/// bound `needle` parameter.
///
/// With element name `w:tbl` this strips whole tables whose cells still
/// carry a matching macro, e.g. after an optional section went unfilled.
pub struct PruneByNeedle {
    element: String,
}

impl PruneByNeedle {
    /// Prune elements named `element` (full prefixed name, e.g. "w:tbl")
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
        }
    }

    fn prune(&self, elem: &mut XmlElement, needle: &str) {
        elem.children.retain(|child| match child {
            XmlNode::Element(e) => !(e.name == self.element && e.text().contains(needle)),
            _ => true,
        });
        for child in &mut elem.children {
            if let XmlNode::Element(e) = child {
                self.prune(e, needle);
            }
        }
    }
}

impl Stylesheet for PruneByNeedle {
    fn parameter_names(&self) -> &[&str] {
        &["needle"]
    }

    fn transform(&self, doc: &mut XmlDocument, params: &HashMap<String, String>) -> Result<()> {
        let needle = params
            .get("needle")
            .ok_or_else(|| Error::XslParameter("needle".into()))?;
        self.prune(&mut doc.root, needle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bind_rejects_undeclared_parameter() {
        let sheet = PruneByNeedle::new("w:tbl");
        let err = bind_parameters(&sheet, &[("haystack", "x")]).unwrap_err();
        assert!(matches!(err, Error::XslParameter(_)));
    }

    #[test]
    fn test_bind_rejects_malformed_name() {
        let sheet = PruneByNeedle::new("w:tbl");
        assert!(bind_parameters(&sheet, &[("1", "x")]).is_err());
        assert!(bind_parameters(&sheet, &[("", "x")]).is_err());
    }

    #[test]
    fn test_bind_accepts_declared_parameter() {
        let sheet = PruneByNeedle::new("w:tbl");
        let bound = bind_parameters(&sheet, &[("needle", "${employee.")]).unwrap();
        assert_eq!(bound.get("needle").map(|s| s.as_str()), Some("${employee."));
    }

    #[test]
    fn test_prune_removes_matching_tables() {
        let xml = r#"<w:body><w:tbl><w:tr><w:tc><w:p><w:r><w:t>${employee.name}</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:tbl><w:tr><w:tc><w:p><w:r><w:t>static</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body>"#;
        let mut doc = XmlDocument::parse(xml).unwrap();

        let sheet = PruneByNeedle::new("w:tbl");
        let params = bind_parameters(&sheet, &[("needle", "${employee.")]).unwrap();
        sheet.transform(&mut doc, &params).unwrap();

        let out = doc.to_xml_string().unwrap();
        assert!(!out.contains("${employee.name}"));
        assert!(out.contains("static"));
        assert_eq!(out.matches("<w:tbl>").count(), 1);
    }

    #[test]
    fn test_transform_without_needle_bound_fails() {
        let mut doc = XmlDocument::parse("<w:body/>").unwrap();
        let sheet = PruneByNeedle::new("w:tbl");
        let err = sheet.transform(&mut doc, &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::XslParameter(_)));
    }
}
