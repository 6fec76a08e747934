//! Inline color markup for dialogue text.
//!
//! The only supported syntax is `[#RRGGBB]...[/]`: a tag opens a colored
//! run, a tag starting with `/` falls back to the default color. Tag bodies
//! are carried as literal color values; the renderer decides what to do
//! with a string it cannot interpret.

/// A run of characters sharing one color. `color` of `None` means the
/// renderer's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupRun {
    pub text: String,
    pub color: Option<String>,
}

/// Scan a markup string into colored runs. An unterminated tag consumes the
/// rest of the input, matching the original scanner reaching end of string.
pub fn parse_markup(input: &str) -> Vec<MarkupRun> {
    let mut runs: Vec<MarkupRun> = Vec::new();
    let mut current = String::new();
    let mut color: Option<String> = None;
    let mut chars = input.chars();

    let mut flush = |text: &mut String, color: &Option<String>, runs: &mut Vec<MarkupRun>| {
        if !text.is_empty() {
            runs.push(MarkupRun {
                text: std::mem::take(text),
                color: color.clone(),
            });
        }
    };

    while let Some(ch) = chars.next() {
        if ch != '[' {
            current.push(ch);
            continue;
        }
        let mut tag = String::new();
        for tag_ch in chars.by_ref() {
            if tag_ch == ']' {
                break;
            }
            tag.push(tag_ch);
        }
        flush(&mut current, &color, &mut runs);
        if tag.starts_with('/') {
            color = None;
        } else {
            color = Some(tag);
        }
    }
    flush(&mut current, &color, &mut runs);
    runs
}

/// Number of visible glyphs, i.e. characters outside tags.
pub fn visible_len(input: &str) -> usize {
    parse_markup(input)
        .iter()
        .map(|run| run.text.chars().count())
        .sum()
}
