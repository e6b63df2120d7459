//! Enclosing-error-handler detection.
//!
//! `is_guarded` answers "would an error raised on this line be caught by an
//! enclosing handler in the same function?" using a bounded backward scan.
//! Each guard style has its own scan; they share one entry point.

use lazy_static::lazy_static;
use regex::Regex;

use crate::language::{GuardStyle, Language};

use super::body::sanitize_line;
use super::indent_of;

lazy_static! {
    static ref BRACE_TRY: Regex = Regex::new(r"\btry\s*$").unwrap();
    static ref BRACE_FUNCTION: Regex =
        Regex::new(r"(\bfunction\b[^{]*$|=>\s*$|^\s*(public|private|protected|static|async|override|internal)\b[^{=]*\)[^{=]*$)")
            .unwrap();
    static ref GO_ERR_BIND: Regex = Regex::new(r"\berr\b\s*:?=").unwrap();
    static ref GO_ERR_CHECK: Regex =
        Regex::new(r"\berr\s*!=\s*nil\b|errors\.(Is|As)\(\s*err\b|\breturn\b.*\berr\b").unwrap();
}

/// Whether line `index` sits inside an error handler of its language.
pub fn is_guarded(language: Language, lines: &[&str], index: usize, window: usize) -> bool {
    let column = lines.get(index).map(|l| l.len()).unwrap_or(0);
    is_guarded_at(language, lines, index, column, window)
}

/// Like [`is_guarded`], but only the text before `column` on line `index`
/// counts as preceding context. Needed when a handler and the guarded call
/// share one line (`try { risky() } catch (e) {}`).
pub fn is_guarded_at(
    language: Language,
    lines: &[&str],
    index: usize,
    column: usize,
    window: usize,
) -> bool {
    if index >= lines.len() {
        return false;
    }
    match language.guard_style() {
        GuardStyle::Brace => brace_guarded(language, lines, index, column, window),
        GuardStyle::Indent => indent_guarded(lines, index, window),
        GuardStyle::Keyword => keyword_guarded(lines, index, window),
        GuardStyle::ErrorReturn => error_return_checked(lines, index, window),
        GuardStyle::None => false,
    }
}

fn brace_guarded(
    language: Language,
    lines: &[&str],
    index: usize,
    column: usize,
    window: usize,
) -> bool {
    let first = index.saturating_sub(window);
    let mut depth = 0usize;

    for line_no in (first..=index).rev() {
        let raw = lines[line_no];
        let prefix = if line_no == index {
            let mut cut = column.min(raw.len());
            while !raw.is_char_boundary(cut) {
                cut -= 1;
            }
            &raw[..cut]
        } else {
            raw
        };
        let clean = sanitize_line(prefix, language);

        for (pos, ch) in clean.char_indices().rev() {
            match ch {
                '}' => depth += 1,
                '{' if depth > 0 => depth -= 1,
                '{' => {
                    // An unclosed opener encloses the line. Its header is the
                    // text before it, or the previous line for Allman style.
                    let mut header = clean[..pos].trim_end().to_string();
                    if header.is_empty() && line_no > 0 {
                        header = sanitize_line(lines[line_no - 1], language)
                            .trim_end()
                            .to_string();
                    }
                    if BRACE_TRY.is_match(&header) {
                        return true;
                    }
                    if BRACE_FUNCTION.is_match(&header) {
                        // A try outside the function does not cover its body.
                        return false;
                    }
                }
                _ => {}
            }
        }
    }
    false
}

fn indent_guarded(lines: &[&str], index: usize, window: usize) -> bool {
    let own = lines[index].trim_start();
    if own.starts_with("try:") {
        return true;
    }
    let mut level = indent_of(lines[index]);
    let first = index.saturating_sub(window);

    for line_no in (first..index).rev() {
        let line = lines[line_no];
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = indent_of(line);
        if indent >= level {
            continue;
        }
        // An enclosing header.
        level = indent;
        if trimmed.starts_with("try:") {
            return true;
        }
        if trimmed.starts_with("def ")
            || trimmed.starts_with("async def ")
            || trimmed.starts_with("class ")
            || trimmed.starts_with("lambda")
        {
            return false;
        }
        if level == 0 {
            return false;
        }
    }
    false
}

fn keyword_guarded(lines: &[&str], index: usize, window: usize) -> bool {
    let own = sanitize_line(lines[index], Language::Ruby);
    if own.contains(" rescue ") || own.trim_end().ends_with(" rescue") {
        return true;
    }

    let first = index.saturating_sub(window);
    let mut depth = 0usize;

    for line_no in (first..index).rev() {
        let clean = sanitize_line(lines[line_no], Language::Ruby);
        let trimmed = clean.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "end" || trimmed.starts_with("end ") || trimmed.starts_with("end.") {
            depth += 1;
            continue;
        }
        if depth == 0 && (trimmed.starts_with("rescue") || trimmed.starts_with("ensure")) {
            // Inside a handler clause, not inside the protected section.
            return false;
        }
        let opens = trimmed == "begin"
            || trimmed.ends_with("= begin")
            || trimmed.starts_with("def ")
            || trimmed.ends_with(" do")
            || (trimmed.contains(" do |") && trimmed.ends_with('|'))
            || ["if ", "unless ", "while ", "until ", "case ", "class ", "module "]
                .iter()
                .any(|kw| trimmed.starts_with(kw));
        if !opens {
            continue;
        }
        if depth > 0 {
            depth -= 1;
            continue;
        }
        if trimmed == "begin" || trimmed.ends_with("= begin") {
            return true;
        }
        if trimmed.starts_with("def ") || trimmed.ends_with(" do") || trimmed.ends_with('|') {
            // Method and block bodies may carry their own rescue clause.
            return body_has_rescue(lines, line_no, index, window);
        }
    }
    false
}

/// Whether the def/do block opened at `opener` has a `rescue` clause at its
/// own indentation after `index`.
fn body_has_rescue(lines: &[&str], opener: usize, index: usize, window: usize) -> bool {
    let level = indent_of(lines[opener]);
    let last = (index + window).min(lines.len().saturating_sub(1));
    for line in &lines[index + 1..=last.max(index)] {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = indent_of(line);
        if indent == level && trimmed.starts_with("rescue") {
            return true;
        }
        if indent <= level && trimmed.starts_with("end") {
            return false;
        }
    }
    false
}

/// Go has no handler blocks: a call is "guarded" when its error result is
/// bound and checked right after.
fn error_return_checked(lines: &[&str], index: usize, window: usize) -> bool {
    let line = sanitize_line(lines[index], Language::Go);
    if !GO_ERR_BIND.is_match(&line) {
        return false;
    }
    if GO_ERR_CHECK.is_match(&line) {
        return true;
    }
    let last = (index + window.min(5)).min(lines.len().saturating_sub(1));
    for next in lines.iter().take(last + 1).skip(index + 1) {
        let clean = sanitize_line(next, Language::Go);
        if clean.trim().is_empty() {
            continue;
        }
        return GO_ERR_CHECK.is_match(&clean);
    }
    false
}
