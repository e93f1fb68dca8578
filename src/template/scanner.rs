//! Macro scanner: repairs placeholder tokens fragmented across runs
//!
//! Word splits a logical run of text into several adjacent text leaves for
//! spelling and formatting bookkeeping, so a `${name}` token can arrive as
//! `<w:t>$</w:t>` ... `<w:t>{name}</w:t>` with arbitrary run boundaries and
//! proofing markup in between. The scanner merges such fragments into a
//! single contiguous token while leaving every non-placeholder `$`
//! character-for-character untouched.
//!
//! The scan is a small token grammar (text char / complete tag) rather than
//! pattern matching over raw markup, so a rewrite can never split a tag.

/// Merge placeholder tokens split across run boundaries.
///
/// Idempotent: running it on already-normalized text is a no-op.
pub fn fix_broken_macros(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(dollar) = rest.find('$') {
        match parse_candidate(&rest[dollar..]) {
            Some(candidate) => {
                out.push_str(&rest[..dollar]);
                out.push_str("${");
                out.push_str(&candidate.name);
                out.push('}');
                rest = &rest[dollar + candidate.consumed..];
            }
            None => {
                // '$' is one byte, so the slice below stays on a char boundary
                out.push_str(&rest[..=dollar]);
                rest = &rest[dollar + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

struct Candidate {
    /// Merged token name (text content between the braces)
    name: String,
    /// Bytes consumed from the '$' through the closing '}'
    consumed: usize,
}

/// Try to read a placeholder candidate from `s`, which starts at a '$'.
///
/// A candidate holds only complete tags between the '$' and the '{', and
/// only name text and complete tags between the braces. Any stray text
/// character, another '$', a paragraph boundary, or end of input disqualifies
/// it, in which case the caller copies the '$' through unchanged.
fn parse_candidate(s: &str) -> Option<Candidate> {
    debug_assert!(s.starts_with('$'));
    let mut pos = 1;

    // Between '$' and '{': structural markup only.
    loop {
        match s[pos..].chars().next()? {
            '{' => {
                pos += 1;
                break;
            }
            '<' => pos += skip_tag(&s[pos..])?,
            _ => return None,
        }
    }

    // Between '{' and '}': accumulate the token name, splicing out markup.
    let mut name = String::new();
    loop {
        let c = s[pos..].chars().next()?;
        match c {
            '}' => {
                pos += 1;
                return Some(Candidate {
                    name,
                    consumed: pos,
                });
            }
            '$' => return None,
            '<' => pos += skip_tag(&s[pos..])?,
            _ => {
                name.push(c);
                pos += c.len_utf8();
            }
        }
    }
}

/// Consume one complete tag starting at '<', returning its byte length.
///
/// Returns `None` for an unterminated tag or a paragraph boundary; a
/// placeholder never spans paragraphs.
fn skip_tag(s: &str) -> Option<usize> {
    debug_assert!(s.starts_with('<'));
    let end = s.find('>')?;
    let inner = s[1..end].strip_prefix('/').unwrap_or(&s[1..end]);
    let tag_name: &str = inner
        .split(|c: char| c.is_ascii_whitespace() || c == '/')
        .next()
        .unwrap_or("");
    if tag_name == "w:p" {
        return None;
    }
    Some(end + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_untouched() {
        let xml = "<w:r><w:t>normal text</w:t></w:r>";
        assert_eq!(fix_broken_macros(xml), xml);
    }

    #[test]
    fn test_intact_macro_untouched() {
        let xml = "<w:r><w:t>${documentContent}</w:t></w:r>";
        assert_eq!(fix_broken_macros(xml), xml);
    }

    #[test]
    fn test_merges_split_macro() {
        let fixed = fix_broken_macros("<w:r><w:t>$</w:t><w:t>{documentContent}</w:t></w:r>");
        assert_eq!(fixed, "<w:r><w:t>${documentContent}</w:t></w:r>");
    }

    #[test]
    fn test_currency_amount_untouched() {
        let fixed =
            fix_broken_macros("<w:r><w:t>$1500</w:t><w:t>${documentContent}</w:t></w:r>");
        assert_eq!(
            fixed,
            "<w:r><w:t>$1500</w:t><w:t>${documentContent}</w:t></w:r>"
        );
    }

    #[test]
    fn test_currency_amount_next_to_split_macro() {
        let fixed =
            fix_broken_macros("<w:r><w:t>$1500</w:t><w:t>$</w:t><w:t>{documentContent}</w:t></w:r>");
        assert_eq!(
            fixed,
            "<w:r><w:t>$1500</w:t><w:t>${documentContent}</w:t></w:r>"
        );
    }

    #[test]
    fn test_unrelated_braces_untouched() {
        let xml = "<w:r><w:t>25$ plus some info {hint}</w:t></w:r>";
        assert_eq!(fix_broken_macros(xml), xml);
    }

    #[test]
    fn test_heavily_fragmented_macro() {
        let broken = concat!(
            r#"<w:t>$</w:t></w:r>"#,
            r#"<w:bookmarkStart w:id="0" w:name="_GoBack"/><w:bookmarkEnd w:id="0"/>"#,
            r#"<w:r><w:t xml:space="preserve">15,000.00. </w:t></w:r>"#,
            r#"<w:r w:rsidR="0056499B"><w:t>$</w:t></w:r>"#,
            r#"<w:r w:rsidR="00573DFD" w:rsidRPr="00573DFD"><w:rPr><w:iCs/></w:rPr><w:t>{</w:t></w:r>"#,
            r#"<w:proofErr w:type="spellStart"/>"#,
            r#"<w:r w:rsidR="00573DFD" w:rsidRPr="00573DFD"><w:rPr><w:iCs/></w:rPr><w:t>variable_name</w:t></w:r>"#,
            r#"<w:proofErr w:type="spellEnd"/>"#,
            r#"<w:r w:rsidR="00573DFD" w:rsidRPr="00573DFD"><w:rPr><w:iCs/></w:rPr><w:t>}</w:t></w:r>"#,
        );
        let expected = concat!(
            r#"<w:t>$</w:t></w:r>"#,
            r#"<w:bookmarkStart w:id="0" w:name="_GoBack"/><w:bookmarkEnd w:id="0"/>"#,
            r#"<w:r><w:t xml:space="preserve">15,000.00. </w:t></w:r>"#,
            r#"<w:r w:rsidR="0056499B"><w:t>${variable_name}</w:t></w:r>"#,
        );
        assert_eq!(fix_broken_macros(broken), expected);
    }

    #[test]
    fn test_does_not_cross_paragraph_boundary() {
        let xml = "<w:p><w:r><w:t>${broken</w:t></w:r></w:p><w:p><w:r><w:t>}</w:t></w:r></w:p>";
        assert_eq!(fix_broken_macros(xml), xml);
    }

    #[test]
    fn test_text_between_dollar_and_brace_disqualifies() {
        let xml = "<w:r><w:t>$abc</w:t><w:t>{name}</w:t></w:r>";
        assert_eq!(fix_broken_macros(xml), xml);
    }

    #[test]
    fn test_unterminated_candidate_untouched() {
        let xml = "<w:r><w:t>${never closed</w:t></w:r>";
        assert_eq!(fix_broken_macros(xml), xml);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<w:r><w:t>$</w:t><w:t>{documentContent}</w:t></w:r>",
            "<w:r><w:t>$1500</w:t><w:t>$</w:t><w:t>{documentContent}</w:t></w:r>",
            "<w:r><w:t>25$ plus some info {hint}</w:t></w:r>",
            "<w:r><w:t>${never closed</w:t></w:r>",
        ];
        for input in inputs {
            let once = fix_broken_macros(input);
            assert_eq!(fix_broken_macros(&once), once, "input: {}", input);
        }
    }

    #[test]
    fn test_multibyte_text_preserved() {
        let xml = "<w:r><w:t>prix: 15€, $</w:t><w:t>{prénom}</w:t></w:r>";
        assert_eq!(
            fix_broken_macros(xml),
            "<w:r><w:t>prix: 15€, ${prénom}</w:t></w:r>"
        );
    }
}
