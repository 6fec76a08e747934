use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markup::visible_len;

/// Eye texture keys the actor model ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeKey {
    Happy,
    Sad,
    Regular,
    Squint,
    Closed,
    Frustrated,
}

/// Mouth texture keys the actor model ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouthKey {
    Regular,
    Open,
    Smile,
}

/// Closed set of animation requests a beat can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    Wave,
    Dance,
    Idle,
}

impl AnimationKind {
    /// Crossfade speed used when the beat does not supply one.
    pub fn default_speed(self) -> f32 {
        match self {
            AnimationKind::Wave => 0.2,
            AnimationKind::Dance => 1.0,
            AnimationKind::Idle => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    #[serde(rename = "type")]
    pub kind: AnimationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl AnimationSpec {
    pub fn speed(&self) -> f32 {
        self.speed.unwrap_or_else(|| self.kind.default_speed())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundSpec {
    pub id: String,
    pub volume: f32,
    #[serde(default, rename = "loop")]
    pub looped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f32>,
    #[serde(default)]
    pub stop_bgm: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyes: Option<EyeKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouth: Option<MouthKey>,
}

/// One scripted step. Every field is optional; a beat with no text
/// auto-advances to the next one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExpressionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<SoundSpec>,
}

/// Sound cue declaration: where the asset lives and how many overlapping
/// playback instances the pool holds. Decoding the asset is the embedding
/// layer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default = "CueDef::default_pool")]
    pub pool: usize,
    #[serde(default = "CueDef::default_duration")]
    pub duration: f32,
}

impl CueDef {
    fn default_pool() -> usize {
        2
    }

    fn default_duration() -> f32 {
        0.5
    }
}

impl Default for CueDef {
    fn default() -> Self {
        Self {
            source: None,
            pool: Self::default_pool(),
            duration: Self::default_duration(),
        }
    }
}

/// On-disk script file: cue table plus named beat sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub cues: BTreeMap<String, CueDef>,
    pub sequences: BTreeMap<String, Vec<Beat>>,
}

impl Script {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

/// Problems caught while registering a sequence, before playback.
#[derive(Debug, Error, PartialEq)]
pub enum BeatError {
    #[error("sequence \"{sequence}\" beat {index}: text has no visible glyphs")]
    EmptyText { sequence: String, index: usize },
    #[error("sequence \"{sequence}\" beat {index}: animation speed {speed} must be positive")]
    InvalidSpeed {
        sequence: String,
        index: usize,
        speed: f32,
    },
    #[error("sequence \"{sequence}\" beat {index}: volume {volume} outside 0.0..=1.0")]
    InvalidVolume {
        sequence: String,
        index: usize,
        volume: f32,
    },
    #[error("sequence \"{sequence}\" beat {index}: sound delay {delay} must not be negative")]
    InvalidDelay {
        sequence: String,
        index: usize,
        delay: f32,
    },
    #[error("sequence \"{sequence}\" beat {index}: unknown sound cue \"{id}\"")]
    UnknownCue {
        sequence: String,
        index: usize,
        id: String,
    },
}

/// Validate a sequence against the registered cue table. The original
/// implementation deferred these checks to playback, where a bad key became
/// a crash mid-cutscene; here a broken beat refuses to register at all.
pub fn validate_beats(
    sequence: &str,
    beats: &[Beat],
    known_cues: &BTreeSet<String>,
) -> Result<(), BeatError> {
    for (index, beat) in beats.iter().enumerate() {
        if let Some(text) = beat.text.as_deref() {
            if visible_len(text) == 0 {
                return Err(BeatError::EmptyText {
                    sequence: sequence.to_string(),
                    index,
                });
            }
        }
        if let Some(animation) = beat.animation.as_ref() {
            let speed = animation.speed();
            if !(speed > 0.0) {
                return Err(BeatError::InvalidSpeed {
                    sequence: sequence.to_string(),
                    index,
                    speed,
                });
            }
        }
        if let Some(sound) = beat.sound.as_ref() {
            if !(0.0..=1.0).contains(&sound.volume) {
                return Err(BeatError::InvalidVolume {
                    sequence: sequence.to_string(),
                    index,
                    volume: sound.volume,
                });
            }
            if let Some(delay) = sound.delay {
                if delay < 0.0 {
                    return Err(BeatError::InvalidDelay {
                        sequence: sequence.to_string(),
                        index,
                        delay,
                    });
                }
            }
            if !known_cues.contains(&sound.id) {
                return Err(BeatError::UnknownCue {
                    sequence: sequence.to_string(),
                    index,
                    id: sound.id.clone(),
                });
            }
        }
    }
    Ok(())
}
