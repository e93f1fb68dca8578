//! Placeholder grammar and the derived variable index
//!
//! A placeholder is `${path}` or `${path#index}`: a dot-segmented path of
//! alphanumeric/underscore segments, optionally suffixed with a positive
//! clone index. Placeholders sharing a base path but differing in `#index`
//! are the same logical variable for counting, but distinct addressable
//! targets for substitution. `${/NAME}` is the closing half of a block
//! marker pair, never a variable.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Matches any `${...}` token; group 1 is the inner name
pub(crate) fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^{}]*)\}").expect("valid pattern"))
}

/// Strip a `${...}` wrapper if the caller supplied one
pub(crate) fn strip_wrapper(name: &str) -> &str {
    name.strip_prefix("${")
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(name)
}

/// Wrap a bare name into its `${...}` token form
pub(crate) fn wrap(name: &str) -> String {
    format!("${{{}}}", name)
}

/// Base path of a placeholder name: `${x#2}` and `${x}` share base `x`
pub(crate) fn base_name(name: &str) -> &str {
    match name.rsplit_once('#') {
        Some((base, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
            base
        }
        _ => name,
    }
}

/// Regex matching the substitution targets for a caller-supplied name:
/// the exact token when the name carries a `#index`, otherwise the base
/// token plus every indexed variant.
pub(crate) fn target_re(name: &str) -> Regex {
    let name = strip_wrapper(name);
    let pattern = if name.contains('#') {
        format!(r"\$\{{{}\}}", regex::escape(name))
    } else {
        format!(r"\$\{{{}(?:#\d+)?\}}", regex::escape(name))
    };
    Regex::new(&pattern).expect("escaped pattern is valid")
}

/// Rewrite every placeholder in `xml` to carry the clone index `i`
pub(crate) fn index_macros(xml: &str, i: usize) -> String {
    token_re()
        .replace_all(xml, |caps: &regex::Captures| {
            format!("${{{}#{}}}", &caps[1], i)
        })
        .into_owned()
}

/// XML-escape a substitution value
pub(crate) fn escape_value(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

/// Read-only view over the placeholders of a set of scanned parts.
#[derive(Debug, Default)]
pub struct VariableIndex {
    /// Distinct base names, first-encountered order
    names: Vec<String>,
    /// Base name -> occurrence count
    counts: HashMap<String, usize>,
}

impl VariableIndex {
    /// Build the index from part texts in processing order (main document,
    /// then headers, then footers).
    pub fn build<'a>(parts: impl Iterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        let mut closer_counts: HashMap<String, usize> = HashMap::new();
        let mut opener_order: Vec<(String, usize)> = Vec::new();

        for text in parts {
            for caps in token_re().captures_iter(text) {
                let inner = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                if let Some(closed) = inner.strip_prefix('/') {
                    *closer_counts.entry(closed.to_string()).or_insert(0) += 1;
                } else {
                    let base = base_name(inner).to_string();
                    match opener_order.iter_mut().find(|(name, _)| *name == base) {
                        Some((_, count)) => *count += 1,
                        None => opener_order.push((base, 1)),
                    }
                }
            }
        }

        // A name used only as a block opener/closer pair is a marker, not a
        // variable; occurrences beyond the matched openers still count.
        for (base, total) in opener_order {
            let closers = closer_counts.get(&base).copied().unwrap_or(0);
            let plain = total.saturating_sub(closers);
            if plain > 0 {
                index.names.push(base.clone());
                index.counts.insert(base, plain);
            }
        }

        index
    }

    /// Distinct base placeholder names, in first-encountered order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Base name -> total occurrence count, `#index` variants merged
    pub fn counts(&self) -> &HashMap<String, usize> {
        &self.counts
    }
}
