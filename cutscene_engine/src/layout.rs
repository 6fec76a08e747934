//! Word-wrapped glyph layout for dialogue text.
//!
//! Layout is computed once per `set_text` call and is independent of reveal
//! timing: the typewriter only decides how many of these glyphs are drawn.
//! Determinism matters here — the reveal cursor counts glyphs, so the same
//! input, width, and metrics must always produce the same layout.

use cutscene_script::MarkupRun;

/// Pixel advance per character. The dialogue font is measured through this
/// seam so layout stays deterministic and testable without a font asset.
pub trait CharMetrics {
    fn advance(&self, ch: char) -> f32;
}

/// Monospaced metrics: every glyph occupies one fixed cell.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    pub cell: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { cell: 14.0 }
    }
}

impl CharMetrics for FixedAdvance {
    fn advance(&self, _ch: char) -> f32 {
        self.cell
    }
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Full canvas width in pixels.
    pub canvas_width: f32,
    /// Horizontal padding subtracted from each side of the canvas.
    pub padding: f32,
    /// Vertical offset added per wrapped line.
    pub line_height: f32,
    /// Color applied outside markup spans.
    pub default_color: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1024.0,
            padding: 20.0,
            line_height: 40.0,
            default_color: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    /// X offset from the line start.
    pub x: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Vertical offset from the first line.
    pub y: f32,
    pub glyphs: Vec<Glyph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    lines: Vec<Line>,
}

impl TextLayout {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn glyph_count(&self) -> usize {
        self.lines.iter().map(|line| line.glyphs.len()).sum()
    }

    /// Glyphs in reveal order: left to right, top to bottom.
    pub fn iter_glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.lines.iter().flat_map(|line| line.glyphs.iter())
    }
}

/// Lay out colored runs into wrapped lines.
///
/// Wrapping backs up to the most recent space in the current line and moves
/// the overflowing word to a fresh line, recomputing its x offsets. A space
/// never starts a line; it stays behind as a placeholder on the line it
/// ended.
pub fn layout_markup(
    runs: &[MarkupRun],
    config: &LayoutConfig,
    metrics: &dyn CharMetrics,
) -> TextLayout {
    let budget = (config.canvas_width - config.padding * 2.0).max(0.0);
    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Glyph> = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut y = 0.0f32;

    for run in runs {
        let color = run
            .color
            .clone()
            .unwrap_or_else(|| config.default_color.clone());
        for ch in run.text.chars() {
            let advance = metrics.advance(ch);
            if cursor_x + advance > budget && !current.is_empty() {
                // Move the word in progress to the next line.
                let carried = match current.iter().rposition(|glyph| glyph.ch == ' ') {
                    Some(space) if space + 1 < current.len() => current.split_off(space + 1),
                    Some(_) => Vec::new(),
                    None => Vec::new(),
                };
                lines.push(Line {
                    y,
                    glyphs: std::mem::take(&mut current),
                });
                y += config.line_height;
                cursor_x = 0.0;
                for glyph in carried {
                    let w = metrics.advance(glyph.ch);
                    current.push(Glyph {
                        ch: glyph.ch,
                        x: cursor_x,
                        color: glyph.color,
                    });
                    cursor_x += w;
                }
                if ch == ' ' && current.is_empty() {
                    continue;
                }
            }
            current.push(Glyph {
                ch,
                x: cursor_x,
                color: color.clone(),
            });
            cursor_x += advance;
        }
    }

    if !current.is_empty() {
        lines.push(Line { y, glyphs: current });
    }

    TextLayout { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutscene_script::parse_markup;

    fn config(canvas_width: f32) -> LayoutConfig {
        LayoutConfig {
            canvas_width,
            padding: 0.0,
            line_height: 40.0,
            default_color: "#000000".to_string(),
        }
    }

    fn layout(text: &str, canvas_width: f32) -> TextLayout {
        let runs = parse_markup(text);
        layout_markup(&runs, &config(canvas_width), &FixedAdvance { cell: 10.0 })
    }

    fn line_string(line: &Line) -> String {
        line.glyphs.iter().map(|glyph| glyph.ch).collect()
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let layout = layout("Hello", 100.0);
        assert_eq!(layout.lines().len(), 1);
        assert_eq!(line_string(&layout.lines()[0]), "Hello");
        assert_eq!(layout.lines()[0].y, 0.0);
        assert_eq!(layout.glyph_count(), 5);
    }

    #[test]
    fn overflowing_word_moves_whole_to_next_line() {
        // Budget of 8 cells: "Hello " fits, "world!" overflows at the 'd'.
        let layout = layout("Hello world!", 80.0);
        assert_eq!(layout.lines().len(), 2);
        assert_eq!(line_string(&layout.lines()[0]), "Hello ");
        assert_eq!(line_string(&layout.lines()[1]), "world!");
        assert_eq!(layout.lines()[1].y, 40.0);
        // The moved word restarts its x offsets from the line start.
        assert_eq!(layout.lines()[1].glyphs[0].x, 0.0);
        assert_eq!(layout.lines()[1].glyphs[1].x, 10.0);
    }

    #[test]
    fn space_never_starts_a_wrapped_line() {
        // "ab cd " fills the budget exactly; the following space is dropped
        // rather than opening the next line.
        let layout = layout("ab cd ef", 50.0);
        for line in layout.lines() {
            if let Some(first) = line.glyphs.first() {
                assert_ne!(first.ch, ' ');
            }
        }
    }

    #[test]
    fn unbroken_run_hard_wraps() {
        let layout = layout("abcdefgh", 40.0);
        assert_eq!(layout.lines().len(), 2);
        assert_eq!(line_string(&layout.lines()[0]), "abcd");
        assert_eq!(line_string(&layout.lines()[1]), "efgh");
    }

    #[test]
    fn markup_colors_survive_layout() {
        let layout = layout("[#0066CC]AB[/]C", 200.0);
        let glyphs: Vec<&Glyph> = layout.iter_glyphs().collect();
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0].color, "#0066CC");
        assert_eq!(glyphs[1].color, "#0066CC");
        assert_eq!(glyphs[2].color, "#000000");
    }

    #[test]
    fn layout_is_deterministic() {
        let a = layout("The quick brown fox jumps over the lazy dog", 120.0);
        let b = layout("The quick brown fox jumps over the lazy dog", 120.0);
        assert_eq!(a, b);
    }
}
