//! Block marker location and mutation
//!
//! A block is delimited by a `${NAME}` ... `${/NAME}` marker pair, each
//! marker sitting in its own paragraph. The block content is everything
//! strictly between the two marker paragraphs; the marker-bearing
//! paragraphs themselves never survive a mutation. Overlapping or nested
//! markers of the same name are a fatal syntax error.

use super::placeholder::{index_macros, wrap};
use super::rows::rfind_either;
use crate::error::{Error, Result};

const PARA_END: &str = "</w:p>";

/// Resolved block region within one part's text
pub(crate) struct BlockSpan {
    /// End of the text preceding the opener paragraph
    pub before_end: usize,
    /// Enclosed content, exclusive of both marker paragraphs
    pub content_start: usize,
    pub content_end: usize,
    /// Start of the text following the closer paragraph
    pub after_start: usize,
}

/// Locate the `${name}` ... `${/name}` region in one part's text.
///
/// Returns `Ok(None)` when the opening marker does not occur in this part.
/// Marker misuse inside the part is a `TemplateSyntax` error.
pub(crate) fn find_block(text: &str, name: &str) -> Result<Option<BlockSpan>> {
    let opener = wrap(name);
    let closer = wrap(&format!("/{}", name));

    let opener_pos = match text.find(&opener) {
        Some(pos) => pos,
        None => return Ok(None),
    };

    if text.matches(opener.as_str()).count() > 1 {
        return Err(Error::TemplateSyntax(format!(
            "block '{}' opened more than once; markers must not overlap or nest",
            name
        )));
    }

    let closer_pos = text.find(&closer).ok_or_else(|| {
        Error::TemplateSyntax(format!("block '{}' is never closed", name))
    })?;
    if text.matches(closer.as_str()).count() > 1 {
        return Err(Error::TemplateSyntax(format!(
            "block '{}' closed more than once; markers must not overlap or nest",
            name
        )));
    }
    if closer_pos < opener_pos {
        return Err(Error::TemplateSyntax(format!(
            "closing marker of block '{}' precedes its opening marker",
            name
        )));
    }

    let (opener_para_start, opener_para_end) =
        paragraph_span(text, opener_pos).ok_or_else(|| marker_outside_paragraph(name))?;
    let (closer_para_start, closer_para_end) =
        paragraph_span(text, closer_pos).ok_or_else(|| marker_outside_paragraph(name))?;

    if closer_para_start < opener_para_end {
        return Err(Error::TemplateSyntax(format!(
            "markers of block '{}' share a paragraph",
            name
        )));
    }

    Ok(Some(BlockSpan {
        before_end: opener_para_start,
        content_start: opener_para_end,
        content_end: closer_para_start,
        after_start: closer_para_end,
    }))
}

/// Clone the enclosed content of a block within one part's text.
///
/// Returns `Ok(None)` when the block does not open in this part. With
/// `replace`, the copies stand in for the original content; otherwise they
/// are appended after it. Marker paragraphs are removed either way.
pub(crate) fn clone_block(
    text: &str,
    name: &str,
    count: usize,
    replace: bool,
    index_variables: bool,
) -> Result<Option<String>> {
    let span = match find_block(text, name)? {
        Some(span) => span,
        None => return Ok(None),
    };
    let content = &text[span.content_start..span.content_end];

    let mut out = String::with_capacity(text.len() + content.len().saturating_mul(count));
    out.push_str(&text[..span.before_end]);
    if !replace {
        out.push_str(content);
    }
    for i in 1..=count {
        if index_variables {
            out.push_str(&index_macros(content, i));
        } else {
            out.push_str(content);
        }
    }
    out.push_str(&text[span.after_start..]);
    Ok(Some(out))
}

/// Replace the whole delimited region, markers included, with `fragment`
pub(crate) fn replace_block(text: &str, name: &str, fragment: &str) -> Result<Option<String>> {
    let span = match find_block(text, name)? {
        Some(span) => span,
        None => return Ok(None),
    };

    let mut out = String::with_capacity(
        text.len() - (span.after_start - span.before_end) + fragment.len(),
    );
    out.push_str(&text[..span.before_end]);
    out.push_str(fragment);
    out.push_str(&text[span.after_start..]);
    Ok(Some(out))
}

/// Byte span of the paragraph enclosing `pos`, inclusive of its tags
fn paragraph_span(text: &str, pos: usize) -> Option<(usize, usize)> {
    let start = rfind_either(&text[..pos], "<w:p ", "<w:p>")?;
    let end = text[pos..].find(PARA_END).map(|i| pos + i + PARA_END.len())?;
    Some((start, end))
}

fn marker_outside_paragraph(name: &str) -> Error {
    Error::TemplateSyntax(format!(
        "marker of block '{}' is not inside a paragraph",
        name
    ))
}
