//! Sequence registry and beat driver.
//!
//! The manager owns the cursor and fans each beat's side effects out to the
//! injected capabilities; it never reaches through an ambient context. Side
//! effect order within a beat is fixed and observable: advance tick, then
//! expression, then animation, then sound, then text.

use std::collections::BTreeMap;

use cutscene_script::{AnimationKind, Beat};
use log::warn;

use crate::actor::Actor;
use crate::audio::{AudioCueDispatcher, CuePlayback};
use crate::dialog::DialogRenderer;
use crate::fade::FadeController;

/// Short tick played when the script advances past its first beat.
pub const ADVANCE_CUE: &str = "advance";
/// Looping background music cue a beat's `stop_bgm` flag targets.
pub const BGM_CUE: &str = "bgm";
/// Per-glyph typewriter blip.
pub const TYPE_CUE: &str = "type";

const ADVANCE_VOLUME: f32 = 0.7;

/// Capability bundle handed to the driver per call. Borrowing the
/// components explicitly keeps mutation paths visible and makes the driver
/// trivially testable against standalone components.
pub struct Stage<'a> {
    pub actor: &'a mut Actor,
    pub dialog: &'a mut DialogRenderer,
    pub audio: &'a mut AudioCueDispatcher,
    pub fade: &'a mut FadeController,
}

pub struct SequenceManager {
    sequences: BTreeMap<String, Vec<Beat>>,
    current: Option<String>,
    index: usize,
    playing: bool,
}

impl SequenceManager {
    pub fn new() -> Self {
        Self {
            sequences: BTreeMap::new(),
            current: None,
            index: 0,
            playing: false,
        }
    }

    /// Store beats under a name. Last registration wins on collision.
    pub fn register_sequence(&mut self, name: &str, beats: Vec<Beat>) {
        self.sequences.insert(name.to_string(), beats);
    }

    pub fn has_sequence(&self, name: &str) -> bool {
        self.sequences.contains_key(name)
    }

    pub fn sequence(&self, name: &str) -> Option<&[Beat]> {
        self.sequences.get(name).map(Vec::as_slice)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_sequence(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn step_index(&self) -> usize {
        self.index
    }

    /// Start a registered sequence from beat zero, stopping whatever was
    /// playing. Unknown names warn and leave state untouched.
    pub fn play_sequence(&mut self, name: &str, stage: &mut Stage<'_>) -> bool {
        if !self.sequences.contains_key(name) {
            warn!("sequence \"{name}\" not found");
            return false;
        }

        if self.playing {
            self.stop_current_sequence();
        }
        // Anything the previous sequence left in flight must not fire into
        // this one.
        stage.audio.cancel_scheduled();
        stage.actor.invalidate_pending();

        self.current = Some(name.to_string());
        self.index = 0;
        self.playing = true;
        self.play_next_step(stage);
        true
    }

    /// Clear playing state. The cursor index is meaningless afterward.
    pub fn stop_current_sequence(&mut self) {
        self.playing = false;
        self.current = None;
    }

    /// The only advance primitive. Executes the beat at the cursor and
    /// moves it forward; textless beats loop here instead of recursing, so
    /// an arbitrarily long run of them costs constant stack.
    pub fn play_next_step(&mut self, stage: &mut Stage<'_>) {
        loop {
            if !self.playing {
                return;
            }
            let next = self
                .current
                .as_ref()
                .and_then(|name| self.sequences.get(name))
                .map(|beats| beats.get(self.index).cloned());

            let beat = match next {
                // The sequence was re-registered out from under us.
                None => {
                    self.stop_current_sequence();
                    return;
                }
                // Cursor ran past the end: end-of-sequence side effects.
                Some(None) => {
                    stage.dialog.set_prompt_visible(false);
                    stage.fade.fade_out(0.0);
                    stage.audio.cancel_scheduled();
                    stage.actor.invalidate_pending();
                    self.stop_current_sequence();
                    return;
                }
                Some(Some(beat)) => beat,
            };

            let first = self.index == 0;
            self.index += 1;

            if Self::execute_beat(&beat, first, stage) {
                return;
            }
            // No text: fall through and execute the next beat immediately.
        }
    }

    /// Apply one beat's side effects in order. Returns true when the beat
    /// carries text and the driver should wait for the reveal plus an
    /// advance input.
    fn execute_beat(beat: &Beat, first: bool, stage: &mut Stage<'_>) -> bool {
        if !first {
            stage
                .audio
                .play_sound(ADVANCE_CUE, CuePlayback::one_shot(ADVANCE_VOLUME));
        }

        if let Some(expression) = beat.expression.as_ref() {
            if let Some(eyes) = expression.eyes {
                stage.actor.set_eyes(eyes);
            }
            if let Some(mouth) = expression.mouth {
                stage.actor.set_mouth(mouth);
            }
        }

        if let Some(animation) = beat.animation.as_ref() {
            let speed = animation.speed();
            match animation.kind {
                AnimationKind::Wave => stage.actor.wave_once(speed),
                AnimationKind::Dance => stage.actor.dance(speed),
                AnimationKind::Idle => stage.actor.idle(speed),
            };
        }

        if let Some(sound) = beat.sound.as_ref() {
            if sound.stop_bgm {
                stage.audio.stop_sound(BGM_CUE);
            }
            let playback = CuePlayback {
                volume: sound.volume,
                looped: sound.looped,
            };
            match sound.delay {
                Some(delay) if delay > 0.0 => stage.audio.schedule(&sound.id, playback, delay),
                _ => stage.audio.play_sound(&sound.id, playback),
            }
        }

        match beat.text.as_deref() {
            Some(text) => {
                stage.dialog.set_text(text);
                true
            }
            None => false,
        }
    }
}

impl Default for SequenceManager {
    fn default() -> Self {
        Self::new()
    }
}
