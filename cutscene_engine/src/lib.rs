//! Runtime for the scripted cutscene player.
//!
//! Everything here is single-threaded and cooperative: one external tick
//! calls `update(dt)` on each component in a fixed order, and the sequence
//! driver fans beat side effects out to the actor, dialog, audio, and fade
//! subsystems through explicit `&mut` borrows. The two asynchronous hazards
//! (delayed sound triggers and one-shot animation completions) are guarded
//! per request so a superseded callback can never fire late.

pub mod actor;
pub mod audio;
pub mod dialog;
pub mod fade;
pub mod layout;
pub mod player;
pub mod sequence;

pub use actor::{Actor, AnimationController, AnimationState, ClipSet};
pub use audio::{AudioCueDispatcher, AudioSink, CuePlayback};
pub use dialog::DialogRenderer;
pub use fade::{FadeController, FadeEvent};
pub use layout::{layout_markup, CharMetrics, FixedAdvance, Glyph, LayoutConfig, Line, TextLayout};
pub use player::{PlayerError, ScenePlayer};
pub use sequence::{SequenceManager, Stage, ADVANCE_CUE, BGM_CUE, TYPE_CUE};
