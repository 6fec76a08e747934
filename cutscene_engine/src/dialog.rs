//! Dialogue box state: laid-out text plus the typewriter reveal cursor.

use cutscene_script::parse_markup;

use crate::layout::{layout_markup, CharMetrics, FixedAdvance, LayoutConfig, TextLayout};

const DEFAULT_CHAR_DELAY: f32 = 0.04;

pub struct DialogRenderer {
    layout: TextLayout,
    config: LayoutConfig,
    metrics: Box<dyn CharMetrics>,
    char_delay: f32,
    revealed: usize,
    accumulator: f32,
    revealing: bool,
    force_stopped: bool,
    prompt_visible: bool,
}

impl DialogRenderer {
    pub fn new(config: LayoutConfig, metrics: Box<dyn CharMetrics>) -> Self {
        Self {
            layout: TextLayout::default(),
            config,
            metrics,
            char_delay: DEFAULT_CHAR_DELAY,
            revealed: 0,
            accumulator: 0.0,
            revealing: false,
            force_stopped: false,
            prompt_visible: false,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(LayoutConfig::default(), Box::new(FixedAdvance::default()))
    }

    pub fn set_char_delay(&mut self, seconds: f32) {
        self.char_delay = seconds.max(f32::EPSILON);
    }

    /// Lay out a fresh markup string and restart the reveal from zero. Any
    /// in-flight reveal is discarded.
    pub fn set_text(&mut self, markup: &str) {
        let runs = parse_markup(markup);
        self.layout = layout_markup(&runs, &self.config, self.metrics.as_ref());
        self.revealed = 0;
        self.accumulator = 0.0;
        self.revealing = self.layout.glyph_count() > 0;
    }

    /// Advance the reveal cursor. Returns how many glyphs were revealed
    /// this tick so the caller can emit a per-glyph type cue; a large `dt`
    /// catches up several glyphs at once but never averages faster than one
    /// per `char_delay`.
    pub fn update(&mut self, dt: f32) -> usize {
        if self.force_stopped || !self.revealing {
            return 0;
        }
        self.accumulator += dt;
        let total = self.layout.glyph_count();
        let mut newly_revealed = 0;
        while self.accumulator >= self.char_delay && self.revealed < total {
            self.accumulator -= self.char_delay;
            self.revealed += 1;
            newly_revealed += 1;
        }
        if self.revealed >= total {
            self.revealing = false;
        }
        newly_revealed
    }

    /// Finish the reveal immediately. By contract the input that triggered
    /// this is consumed here and does not also advance the sequence.
    pub fn skip_to_end(&mut self) {
        self.revealed = self.layout.glyph_count();
        self.revealing = false;
    }

    pub fn is_revealing(&self) -> bool {
        self.revealing
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn layout(&self) -> &TextLayout {
        &self.layout
    }

    /// Text revealed so far, without layout positions. Handy for logs.
    pub fn visible_text(&self) -> String {
        self.layout
            .iter_glyphs()
            .take(self.revealed)
            .map(|glyph| glyph.ch)
            .collect()
    }

    /// While set, `update` does nothing; the fade controller holds this
    /// until the dialogue box has finished fading in.
    pub fn set_force_stopped(&mut self, stopped: bool) {
        self.force_stopped = stopped;
    }

    pub fn is_force_stopped(&self) -> bool {
        self.force_stopped
    }

    pub fn set_prompt_visible(&mut self, visible: bool) {
        self.prompt_visible = visible;
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(char_delay: f32) -> DialogRenderer {
        let mut dialog = DialogRenderer::with_defaults();
        dialog.set_char_delay(char_delay);
        dialog
    }

    #[test]
    fn reveal_is_monotonic_and_terminates() {
        let mut dialog = renderer(0.1);
        dialog.set_text("Hi");
        assert!(dialog.is_revealing());
        assert_eq!(dialog.revealed_count(), 0);

        dialog.update(0.1);
        assert_eq!(dialog.revealed_count(), 1);
        assert_eq!(dialog.visible_text(), "H");
        assert!(dialog.is_revealing());

        dialog.update(0.1);
        assert_eq!(dialog.revealed_count(), 2);
        assert_eq!(dialog.visible_text(), "Hi");
        assert!(!dialog.is_revealing());
    }

    #[test]
    fn large_dt_catches_up_multiple_glyphs() {
        let mut dialog = renderer(0.1);
        dialog.set_text("Hello");
        let revealed = dialog.update(0.35);
        assert_eq!(revealed, 3);
        assert_eq!(dialog.revealed_count(), 3);
    }

    #[test]
    fn skip_to_end_reveals_everything_immediately() {
        let mut dialog = renderer(0.1);
        dialog.set_text("Hello there");
        dialog.update(0.1);
        dialog.skip_to_end();
        assert!(!dialog.is_revealing());
        assert_eq!(dialog.revealed_count(), dialog.layout().glyph_count());
    }

    #[test]
    fn set_text_resets_the_cursor() {
        let mut dialog = renderer(0.1);
        dialog.set_text("Hello");
        dialog.update(0.3);
        dialog.set_text("Bye");
        assert_eq!(dialog.revealed_count(), 0);
        assert!(dialog.is_revealing());
    }

    #[test]
    fn force_stop_suppresses_reveal_until_cleared() {
        let mut dialog = renderer(0.1);
        dialog.set_text("Hi");
        dialog.set_force_stopped(true);
        assert_eq!(dialog.update(1.0), 0);
        assert_eq!(dialog.revealed_count(), 0);

        dialog.set_force_stopped(false);
        dialog.update(0.2);
        assert_eq!(dialog.revealed_count(), 2);
    }

    #[test]
    fn empty_text_never_reveals() {
        let mut dialog = renderer(0.1);
        dialog.set_text("");
        assert!(!dialog.is_revealing());
        assert_eq!(dialog.update(1.0), 0);
    }

    #[test]
    fn markup_glyphs_count_without_tags() {
        let mut dialog = renderer(0.1);
        dialog.set_text("[#0066CC]AB[/]C");
        assert_eq!(dialog.layout().glyph_count(), 3);
    }
}
