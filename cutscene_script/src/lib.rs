//! Script data model for the cutscene player.
//!
//! A script is a set of named sequences, each an ordered list of beats.
//! Beats combine optional dialogue text, facial expression changes, an
//! animation request, and a sound trigger. This crate keeps the authoring
//! surface (serde schema, markup scanner, registration-time validation) in
//! one place so the engine and any tooling agree on what a valid script is.

pub mod beat;
pub mod markup;

pub use beat::{
    validate_beats, AnimationKind, AnimationSpec, Beat, BeatError, CueDef, ExpressionSpec, EyeKey,
    MouthKey, Script, SoundSpec,
};
pub use markup::{parse_markup, visible_len, MarkupRun};
