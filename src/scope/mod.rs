//! Cross-language structural primitives.
//!
//! Instead of parsing, gates reason about local structure with bounded
//! backward/forward scans. Every function here is pure: it takes the text (or
//! its lines) plus a position and returns an answer, with no shared state.

mod body;
mod fuzzy;
mod guard;

pub use body::{
    extract_delimited, extract_indented, extract_keyword_block, find_block, sanitize_line, Block,
    BracePairs, LineIndex,
};
pub use fuzzy::{edit_distance, suggest, MAX_SUGGESTION_DISTANCE};
pub use guard::{is_guarded, is_guarded_at};

/// Default number of lines scanned when looking for an enclosing construct.
pub const DEFAULT_WINDOW: usize = 30;

/// Leading whitespace width, counting a tab as four columns.
pub fn indent_of(line: &str) -> usize {
    let mut width = 0;
    for ch in line.chars() {
        match ch {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => break,
        }
    }
    width
}

/// Whether byte offset `pos` on `line` falls inside a quoted string.
///
/// Handles double, single and backtick quotes with backslash escapes. The
/// scan is per line, so multi-line strings are not tracked.
pub fn is_inside_string_literal(line: &str, pos: usize) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in line.char_indices() {
        if i >= pos {
            break;
        }
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'' | '`') => quote = Some(ch),
            _ => {}
        }
    }
    quote.is_some()
}
