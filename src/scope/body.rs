//! Body extraction for brace, indentation and keyword delimited blocks.

use crate::language::{BlockStyle, Language};

use super::indent_of;

/// How many lines a declaration header may span before its body opens.
const MAX_HEADER_LINES: usize = 8;

/// Byte offsets of line starts, for converting between offsets and line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self {
            starts,
            len: text.len(),
        }
    }

    /// 0-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset.min(self.len)) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// Byte offset where 0-based `line` starts.
    pub fn start_of(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

/// A located block body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    /// 0-based line of the declaration header.
    pub header_line: usize,
    /// 0-based line where the block ends (closing delimiter or last body line).
    pub end_line: usize,
    pub body: &'a str,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LexState {
    Code,
    LineComment,
    BlockComment,
    Str(char),
}

/// Walk `text` from its start, calling `visit` with each character outside
/// string literals and comments. Stops as soon as `visit` returns false.
fn scan_code(text: &str, mut visit: impl FnMut(usize, char) -> bool) {
    let mut state = LexState::Code;
    let mut escaped = false;
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match state {
            LexState::LineComment => {
                if ch == '\n' {
                    state = LexState::Code;
                }
            }
            LexState::BlockComment => {
                if ch == '*' && chars.peek().map(|&(_, c)| c) == Some('/') {
                    chars.next();
                    state = LexState::Code;
                }
            }
            LexState::Str(quote) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote || (ch == '\n' && quote != '`') {
                    state = LexState::Code;
                }
            }
            LexState::Code => {
                if ch == '/' {
                    match chars.peek().map(|&(_, c)| c) {
                        Some('/') => {
                            state = LexState::LineComment;
                            continue;
                        }
                        Some('*') => {
                            chars.next();
                            state = LexState::BlockComment;
                            continue;
                        }
                        _ => {}
                    }
                } else if ch == '"' || ch == '`' {
                    state = LexState::Str(ch);
                    continue;
                } else if ch == '\'' && closes_on_same_line(&text[i + 1..]) {
                    // Lone quotes (lifetimes, apostrophes) are not literals.
                    state = LexState::Str(ch);
                    continue;
                }
                if !visit(i, ch) {
                    return;
                }
            }
        }
    }
}

/// Extract the text between an opening delimiter and its matching close.
///
/// `start` must point just past the opening delimiter. Nested pairs of the same
/// family are balanced; delimiters inside string literals and comments are
/// ignored. Returns `None` when the input ends before the block closes.
pub fn extract_delimited(text: &str, start: usize, open: char, close: char) -> Option<&str> {
    let rest = text.get(start..)?;
    let mut depth = 1usize;
    let mut end = None;
    scan_code(rest, |i, ch| {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                end = Some(i);
                return false;
            }
        }
        true
    });
    end.map(|i| &rest[..i])
}

/// Every matched `{`/`}` pair of a text, found in one pass.
///
/// Lookups are a binary search, so taking many bodies from one text stays
/// linear overall, unclosed braces included.
#[derive(Debug, Clone, Default)]
pub struct BracePairs {
    /// `(open, close)` byte offsets, sorted by `open`.
    pairs: Vec<(usize, usize)>,
}

impl BracePairs {
    pub fn new(text: &str) -> Self {
        let mut open = Vec::new();
        let mut pairs = Vec::new();
        scan_code(text, |i, ch| {
            match ch {
                '{' => open.push(i),
                '}' => {
                    if let Some(o) = open.pop() {
                        pairs.push((o, i));
                    }
                }
                _ => {}
            }
            true
        });
        pairs.sort_unstable();
        Self { pairs }
    }

    /// Offset of the `}` matching the `{` at byte offset `open`.
    pub fn close_of(&self, open: usize) -> Option<usize> {
        self.pairs
            .binary_search_by_key(&open, |&(o, _)| o)
            .ok()
            .map(|idx| self.pairs[idx].1)
    }

    /// Body between the `{` at `open` and its match.
    pub fn body_at<'a>(&self, text: &'a str, open: usize) -> Option<&'a str> {
        self.close_of(open).and_then(|close| text.get(open + 1..close))
    }
}

fn closes_on_same_line(after: &str) -> bool {
    after.split('\n').next().unwrap_or("").contains('\'')
}

/// Extract an indentation-delimited body.
///
/// `start` must point just past the block-introducing colon. The first
/// non-blank, non-comment line fixes the body's indent; the body continues
/// while lines are indented at least that far. A body on the header line
/// itself (`if x: return y`) is returned as-is. Returns `None` when the input
/// ends before any body line appears.
pub fn extract_indented(text: &str, start: usize) -> Option<&str> {
    let index = LineIndex::new(text);
    let header = index.line_of(start.saturating_sub(1));
    let header_start = index.start_of(header)?;
    let header_end = text[start..]
        .find('\n')
        .map(|p| start + p)
        .unwrap_or(text.len());
    let header_indent = indent_of(&text[header_start..header_end]);

    let inline = text.get(start..header_end)?;
    let inline_trimmed = inline.trim();
    if !inline_trimmed.is_empty() && !inline_trimmed.starts_with('#') {
        return Some(inline);
    }

    let body_start = index.start_of(header + 1)?;
    let mut body_indent: Option<usize> = None;
    let mut end = body_start;

    for line_no in header + 1..index.line_count() {
        let line_start = index.start_of(line_no)?;
        let line_end = index
            .start_of(line_no + 1)
            .map(|s| s - 1)
            .unwrap_or(text.len());
        let line = &text[line_start..line_end];
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = indent_of(line);
        match body_indent {
            None => {
                if indent <= header_indent {
                    return Some(&text[body_start..body_start]);
                }
                body_indent = Some(indent);
                end = line_end;
            }
            Some(level) => {
                if indent < level {
                    break;
                }
                end = line_end;
            }
        }
    }

    body_indent.map(|_| &text[body_start..end])
}

const RUBY_OPENERS: &[&str] = &[
    "def ", "class ", "module ", "begin", "if ", "unless ", "while ", "until ", "case ", "for ",
];

fn ruby_opens(trimmed: &str) -> usize {
    let mut opens = 0;
    let starts_block = RUBY_OPENERS.iter().any(|kw| {
        trimmed.starts_with(kw) && (kw.ends_with(' ') || trimmed.len() == kw.len() || {
            let next = trimmed.as_bytes()[kw.len()];
            !(next.is_ascii_alphanumeric() || next == b'_')
        })
    });
    if starts_block {
        opens += 1;
    }
    let ends_with_do = trimmed.ends_with(" do")
        || trimmed == "do"
        || (trimmed.contains(" do |") && trimmed.ends_with('|'));
    if ends_with_do {
        opens += 1;
    }
    // One-liners such as `def x; 1; end` close themselves.
    if opens > 0 && (trimmed.ends_with("; end") || trimmed.ends_with(";end")) {
        opens -= 1;
    }
    opens
}

fn ruby_closes(trimmed: &str) -> bool {
    trimmed == "end"
        || trimmed.starts_with("end ")
        || trimmed.starts_with("end.")
        || trimmed.starts_with("end)")
}

/// Extract a keyword-delimited (`def ... end`) body.
///
/// `start` must point at the first line after the opener. Returns the text up
/// to the line holding the matching `end`, or `None` if it never closes.
pub fn extract_keyword_block(text: &str, start: usize) -> Option<&str> {
    let rest = text.get(start..)?;
    let mut depth = 1usize;
    let mut offset = 0;

    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim();
        if !trimmed.starts_with('#') {
            if ruby_closes(trimmed) {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..offset]);
                }
            } else {
                depth += ruby_opens(trimmed);
            }
        }
        offset += line.len();
    }
    None
}

/// Locate the body of the declaration whose header starts on `header_line`.
pub fn find_block<'a>(
    text: &'a str,
    index: &LineIndex,
    header_line: usize,
    style: BlockStyle,
) -> Option<Block<'a>> {
    let header_start = index.start_of(header_line)?;
    match style {
        BlockStyle::Brace => {
            let open = find_header_terminator(text, header_start, '{')?;
            let body = extract_delimited(text, open + 1, '{', '}')?;
            let end_line = index.line_of(open + 1 + body.len());
            Some(Block {
                header_line,
                end_line,
                body,
            })
        }
        BlockStyle::Indent => {
            let colon = find_header_terminator(text, header_start, ':')?;
            let body = extract_indented(text, colon + 1)?;
            let body_end = colon + 1 + offset_in(text, colon + 1, body) + body.len();
            let end_line = index.line_of(body_end.saturating_sub(1).max(colon));
            Some(Block {
                header_line,
                end_line,
                body,
            })
        }
        BlockStyle::Keyword => {
            let next = index.start_of(header_line + 1)?;
            let body = extract_keyword_block(text, next)?;
            let end_line = index.line_of(next + body.len());
            Some(Block {
                header_line,
                end_line,
                body,
            })
        }
    }
}

/// Offset of `body` relative to `from`, given that it is a slice of `text`.
fn offset_in(text: &str, from: usize, body: &str) -> usize {
    let base = text.as_ptr() as usize + from;
    (body.as_ptr() as usize).saturating_sub(base)
}

/// Find the delimiter that opens a declaration's body, skipping parameter
/// lists and giving up at a statement terminator or after a few lines.
fn find_header_terminator(text: &str, from: usize, target: char) -> Option<usize> {
    let mut depth = 0i32;
    let mut lines = 0;
    let mut state = LexState::Code;
    let mut escaped = false;
    let rest = text.get(from..)?;

    for (i, ch) in rest.char_indices() {
        if ch == '\n' {
            lines += 1;
            if lines >= MAX_HEADER_LINES {
                return None;
            }
        }
        match state {
            LexState::Str(quote) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote || ch == '\n' {
                    state = LexState::Code;
                }
                continue;
            }
            LexState::LineComment => {
                if ch == '\n' {
                    state = LexState::Code;
                }
                continue;
            }
            _ => {}
        }

        match ch {
            '"' | '\'' | '`' => state = LexState::Str(ch),
            '#' if target == ':' => state = LexState::LineComment,
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '{' if target != '{' => depth += 1,
            '}' if target != '{' => depth -= 1,
            ';' if depth <= 0 => return None,
            c if c == target && depth <= 0 => return Some(from + i),
            _ => {}
        }
    }
    None
}

/// Blank out string literal contents and strip trailing line comments.
///
/// Quotes are kept so the line's shape survives; only the characters that
/// could be mistaken for code are replaced.
pub fn sanitize_line(line: &str, language: Language) -> String {
    let hash_comments = matches!(language, Language::Python | Language::Ruby);
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
                out.push(' ');
            } else if ch == '\\' {
                escaped = true;
                out.push(' ');
            } else if ch == q {
                quote = None;
                out.push(ch);
            } else {
                out.push(' ');
            }
            continue;
        }
        match ch {
            '"' | '`' => {
                quote = Some(ch);
                out.push(ch);
            }
            '\'' if hash_comments || closes_on_same_line(chars.clone().collect::<String>().as_str()) => {
                quote = Some(ch);
                out.push(ch);
            }
            '#' if hash_comments => break,
            '/' if !hash_comments && chars.peek() == Some(&'/') => break,
            _ => out.push(ch),
        }
    }
    out
}
