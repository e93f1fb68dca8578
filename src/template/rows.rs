//! Table row cloning
//!
//! Operates on scanner-normalized part text. A row is the minimal clonable
//! unit: the `<w:tr>` element enclosing a macro occurrence, extended over
//! vertically merged continuation rows so a span is never torn apart.

use super::placeholder::index_macros;

const ROW_END: &str = "</w:tr>";
const VMERGE_RESTART: &str = r#"<w:vMerge w:val="restart"/>"#;
const VMERGE_CONTINUE: &str = r#"<w:vMerge w:val="continue"/>"#;
const VMERGE_BARE: &str = "<w:vMerge/>";

/// Clone the row containing `token` within one part's text.
///
/// Returns `None` when the token does not occur inside a table row of this
/// part, so the caller can continue with the next part. Within clone `i`
/// every placeholder is rewritten to carry the suffix `#i`; the bare row
/// does not survive, and `count == 0` removes it entirely.
pub(crate) fn clone_row(text: &str, token: &str, count: usize) -> Option<String> {
    let tag_pos = text.find(token)?;
    let row_start = find_row_start(text, tag_pos)?;
    let mut row_end = find_row_end(text, tag_pos)?;

    // A cell spanning multiple rows drags its continuation rows along.
    if text[row_start..row_end].contains(VMERGE_RESTART) {
        while let Some(next_end) = continuation_row_end(text, row_end) {
            row_end = next_end;
        }
    }

    let row = &text[row_start..row_end];
    let mut out = String::with_capacity(text.len() + row.len().saturating_mul(count));
    out.push_str(&text[..row_start]);
    for i in 1..=count {
        out.push_str(&index_macros(row, i));
    }
    out.push_str(&text[row_end..]);
    Some(out)
}

/// End offset of the next row iff it continues a vertical merge
fn continuation_row_end(text: &str, from: usize) -> Option<usize> {
    let next_start = find_next_row_start(text, from)?;
    let next_end = find_row_end(text, next_start)?;
    let next_row = &text[next_start..next_end];

    if next_row.contains(VMERGE_BARE) || next_row.contains(VMERGE_CONTINUE) {
        Some(next_end)
    } else {
        None
    }
}

fn find_row_start(text: &str, pos: usize) -> Option<usize> {
    rfind_either(&text[..pos], "<w:tr ", "<w:tr>")
}

fn find_next_row_start(text: &str, from: usize) -> Option<usize> {
    let spaced = text[from..].find("<w:tr ");
    let bare = text[from..].find("<w:tr>");
    min_of(spaced, bare).map(|i| from + i)
}

fn find_row_end(text: &str, pos: usize) -> Option<usize> {
    text[pos..].find(ROW_END).map(|i| pos + i + ROW_END.len())
}

pub(crate) fn rfind_either(text: &str, a: &str, b: &str) -> Option<usize> {
    match (text.rfind(a), text.rfind(b)) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

fn min_of(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}
