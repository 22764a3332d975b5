//! # Text Layout
//!
//! Greedy, width-bounded line breaking shared by the grid and flow
//! renderers.
//!
//! Hard line breaks are honoured first. Each logical line is then split on
//! runs of whitespace and words are accumulated while the candidate line
//! still fits. Blank logical lines are kept: they produce one empty output
//! line so paragraphs keep their vertical spacing. Words are never split;
//! a word wider than the available width gets a line of its own.

use crate::font::MeasureText;

/// Break `text` into lines no wider than `max_width` at `size`.
///
/// Always returns at least one line. The result depends only on the inputs,
/// so wrapping is safe to repeat.
pub fn wrap_to_width<M: MeasureText + ?Sized>(
    font: &M,
    size: f64,
    text: &str,
    max_width: f64,
) -> Vec<String> {
    let mut lines = Vec::new();

    for logical in text.split('\n') {
        let logical = logical.strip_suffix('\r').unwrap_or(logical);
        wrap_logical_line(font, size, logical, max_width, &mut lines);
    }

    lines
}

fn wrap_logical_line<M: MeasureText + ?Sized>(
    font: &M,
    size: f64,
    logical: &str,
    max_width: f64,
    out: &mut Vec<String>,
) {
    let mut words = logical.split_whitespace().peekable();
    if words.peek().is_none() {
        out.push(String::new());
        return;
    }

    let mut line = String::new();
    for word in words {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", line, word);
        if font.width_of_text_at_size(&candidate, size) <= max_width {
            line = candidate;
        } else {
            out.push(std::mem::replace(&mut line, word.to_string()));
        }
    }

    if !line.is_empty() {
        out.push(line);
    }
}
