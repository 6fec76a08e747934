//! Wiring layer: owns every component, drives the per-frame tick, and
//! gates advance input at the boundary so the sequence driver can trust
//! its caller.

use cutscene_script::{validate_beats, BeatError, Script};
use thiserror::Error;

use crate::actor::{Actor, ClipSet};
use crate::audio::{AudioCueDispatcher, AudioSink, CuePlayback};
use crate::dialog::DialogRenderer;
use crate::fade::{FadeController, FadeEvent};
use crate::sequence::{SequenceManager, Stage, ADVANCE_CUE, BGM_CUE, TYPE_CUE};

const TYPE_VOLUME: f32 = 0.4;

/// Built-in cue durations for the player's own triggers, used when a
/// script does not declare them itself.
const BUILTIN_CUES: &[(&str, usize, f32)] = &[
    (ADVANCE_CUE, 2, 0.3),
    (TYPE_CUE, 4, 0.05),
    (BGM_CUE, 1, 1.0),
];

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    InvalidBeat(#[from] BeatError),
    #[error("sequence \"{name}\" is not registered")]
    UnknownSequence { name: String },
}

pub struct ScenePlayer {
    manager: SequenceManager,
    actor: Actor,
    dialog: DialogRenderer,
    audio: AudioCueDispatcher,
    fade: FadeController,
    /// Sequence queued behind the fade-in pipeline.
    pending_intro: Option<String>,
}

impl ScenePlayer {
    /// Build a player from a script: register the cue table (built-in cues
    /// first, script declarations may override their pools), then validate
    /// and register every sequence. A broken beat fails here, not mid-
    /// playback.
    pub fn from_script(script: &Script) -> Result<Self, PlayerError> {
        let mut audio = AudioCueDispatcher::new();
        for (name, pool, duration) in BUILTIN_CUES {
            audio.register_cue(name, *pool, *duration);
        }
        for (name, cue) in &script.cues {
            audio.register_cue(name, cue.pool, cue.duration);
        }

        let known_cues = audio.cue_names();
        let mut manager = SequenceManager::new();
        for (name, beats) in &script.sequences {
            validate_beats(name, beats, &known_cues)?;
            manager.register_sequence(name, beats.clone());
        }

        Ok(Self {
            manager,
            actor: Actor::new(ClipSet::default()),
            dialog: DialogRenderer::with_defaults(),
            audio,
            fade: FadeController::new(),
            pending_intro: None,
        })
    }

    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.audio.set_sink(sink);
    }

    /// One cooperative frame. Order matters: fades and animation move
    /// before the reveal so a line that starts this frame is drawn with the
    /// dialogue box already positioned and visible.
    pub fn tick(&mut self, dt: f32) {
        if let Some(event) = self.fade.update(dt) {
            match event {
                FadeEvent::SequenceStart => {
                    self.dialog.set_force_stopped(false);
                    if let Some(name) = self.pending_intro.take() {
                        self.manager.play_sequence(
                            &name,
                            &mut Stage {
                                actor: &mut self.actor,
                                dialog: &mut self.dialog,
                                audio: &mut self.audio,
                                fade: &mut self.fade,
                            },
                        );
                    }
                }
                FadeEvent::FadedOut => {}
            }
        }

        self.actor.update(dt);
        self.audio.update(dt);

        let revealed = self.dialog.update(dt);
        for _ in 0..revealed {
            self.audio
                .play_sound(TYPE_CUE, CuePlayback::one_shot(TYPE_VOLUME));
        }

        let awaiting_input = self.manager.is_playing()
            && !self.dialog.is_revealing()
            && !self.dialog.is_force_stopped();
        self.dialog.set_prompt_visible(awaiting_input);
    }

    /// Entrance flow: pre-set the opening line with the reveal held, fade
    /// the dialogue UI in, and start the sequence once the fade pipeline
    /// signals.
    pub fn intro(
        &mut self,
        sequence: &str,
        fade_delay: f32,
        text_delay: f32,
    ) -> Result<(), PlayerError> {
        let Some(beats) = self.manager.sequence(sequence) else {
            return Err(PlayerError::UnknownSequence {
                name: sequence.to_string(),
            });
        };
        if let Some(text) = beats.first().and_then(|beat| beat.text.as_deref()) {
            let text = text.to_string();
            self.dialog.set_text(&text);
        }
        self.dialog.set_force_stopped(true);
        self.fade.fade_in(fade_delay, text_delay);
        self.pending_intro = Some(sequence.to_string());
        Ok(())
    }

    /// Start a sequence immediately, bypassing the fade pipeline.
    pub fn play_sequence(&mut self, name: &str) -> bool {
        self.manager.play_sequence(
            name,
            &mut Stage {
                actor: &mut self.actor,
                dialog: &mut self.dialog,
                audio: &mut self.audio,
                fade: &mut self.fade,
            },
        )
    }

    /// Advance trigger (tap/click). Ignored while the reveal is running or
    /// held; the gating lives here so the driver itself stays trusting.
    pub fn advance_input(&mut self) -> bool {
        if self.dialog.is_revealing() || self.dialog.is_force_stopped() {
            return false;
        }
        self.manager.play_next_step(&mut Stage {
            actor: &mut self.actor,
            dialog: &mut self.dialog,
            audio: &mut self.audio,
            fade: &mut self.fade,
        });
        true
    }

    /// Skip trigger: finish the current reveal without advancing.
    pub fn skip_input(&mut self) -> bool {
        if !self.dialog.is_revealing() {
            return false;
        }
        self.dialog.skip_to_end();
        true
    }

    /// Stop everything and drop whatever was still scheduled.
    pub fn stop(&mut self) {
        self.manager.stop_current_sequence();
        self.audio.cancel_scheduled();
        self.actor.invalidate_pending();
        self.pending_intro = None;
    }

    pub fn is_playing(&self) -> bool {
        self.manager.is_playing()
    }

    pub fn is_idle(&self) -> bool {
        !self.manager.is_playing() && self.pending_intro.is_none() && !self.fade.is_visible()
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn dialog(&self) -> &DialogRenderer {
        &self.dialog
    }

    pub fn audio(&self) -> &AudioCueDispatcher {
        &self.audio
    }

    pub fn fade(&self) -> &FadeController {
        &self.fade
    }

    pub fn manager(&self) -> &SequenceManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::AnimationState;
    use cutscene_script::{AnimationKind, AnimationSpec, Beat, SoundSpec};
    use std::collections::BTreeMap;

    const DT: f32 = 1.0 / 60.0;

    fn script(sequences: Vec<(&str, Vec<Beat>)>) -> Script {
        let mut map = BTreeMap::new();
        for (name, beats) in sequences {
            map.insert(name.to_string(), beats);
        }
        Script {
            cues: BTreeMap::new(),
            sequences: map,
        }
    }

    fn text_beat(text: &str) -> Beat {
        Beat {
            text: Some(text.to_string()),
            ..Beat::default()
        }
    }

    fn run(player: &mut ScenePlayer, seconds: f32) {
        let mut elapsed = 0.0;
        while elapsed < seconds {
            player.tick(DT);
            elapsed += DT;
        }
    }

    #[test]
    fn invalid_beat_fails_at_construction() {
        let bad = script(vec![(
            "intro",
            vec![Beat {
                sound: Some(SoundSpec {
                    id: "nonexistent".to_string(),
                    volume: 0.5,
                    looped: false,
                    delay: None,
                    stop_bgm: false,
                }),
                ..Beat::default()
            }],
        )]);
        assert!(matches!(
            ScenePlayer::from_script(&bad),
            Err(PlayerError::InvalidBeat(_))
        ));
    }

    #[test]
    fn hi_bye_walkthrough() {
        let script = script(vec![(
            "intro",
            vec![
                text_beat("Hi"),
                Beat {
                    text: Some("Bye".to_string()),
                    animation: Some(AnimationSpec {
                        kind: AnimationKind::Dance,
                        speed: None,
                    }),
                    ..Beat::default()
                },
            ],
        )]);
        let mut player = ScenePlayer::from_script(&script).expect("script valid");
        assert!(player.play_sequence("intro"));

        // Reveal runs progressively: "H" then "Hi".
        run(&mut player, 0.05);
        assert_eq!(player.dialog().visible_text(), "H");
        run(&mut player, 0.2);
        assert_eq!(player.dialog().visible_text(), "Hi");
        assert!(!player.dialog().is_revealing());
        assert!(player.dialog().prompt_visible());

        // Advance: beat 1 plays the tick, dances, resets the reveal.
        assert!(player.advance_input());
        assert_eq!(player.actor().animation_state(), AnimationState::Dance);
        assert!(player
            .audio()
            .history()
            .iter()
            .any(|event| event.starts_with("cue.play advance")));
        assert!(player.dialog().is_revealing());

        run(&mut player, 0.5);
        assert_eq!(player.dialog().visible_text(), "Bye");
        assert!(player.advance_input());
        assert!(!player.is_playing());
    }

    #[test]
    fn advance_input_is_ignored_mid_reveal() {
        let script = script(vec![("intro", vec![text_beat("Hello there"), text_beat("Bye")])]);
        let mut player = ScenePlayer::from_script(&script).expect("script valid");
        player.play_sequence("intro");
        player.tick(DT);
        assert!(player.dialog().is_revealing());
        assert!(!player.advance_input());
        // Still on beat 0's text.
        assert!(player.manager().step_index() == 1);
    }

    #[test]
    fn skip_input_finishes_reveal_without_advancing() {
        let script = script(vec![("intro", vec![text_beat("Hello there"), text_beat("Bye")])]);
        let mut player = ScenePlayer::from_script(&script).expect("script valid");
        player.play_sequence("intro");
        player.tick(DT);
        assert!(player.skip_input());
        assert!(!player.dialog().is_revealing());
        assert_eq!(player.dialog().visible_text(), "Hello there");
        assert_eq!(player.manager().step_index(), 1);
    }

    #[test]
    fn type_cue_fires_per_revealed_glyph() {
        let script = script(vec![("intro", vec![text_beat("Hi")])]);
        let mut player = ScenePlayer::from_script(&script).expect("script valid");
        player.play_sequence("intro");
        run(&mut player, 0.5);
        let blips = player
            .audio()
            .history()
            .iter()
            .filter(|event| event.starts_with("cue.play type"))
            .count();
        assert_eq!(blips, 2);
    }

    #[test]
    fn intro_holds_the_reveal_until_the_fade_signals() {
        let script = script(vec![("intro", vec![text_beat("Hi")])]);
        let mut player = ScenePlayer::from_script(&script).expect("script valid");
        player.intro("intro", 0.5, 0.5).expect("intro starts");

        // Mid-fade: force-stopped, nothing revealed, input ignored.
        run(&mut player, 1.0);
        assert!(player.dialog().is_force_stopped());
        assert_eq!(player.dialog().revealed_count(), 0);
        assert!(!player.advance_input());
        assert!(!player.is_playing());

        // Fade delay (0.5) + ramp (1.0) + text delay (0.5), with margin.
        run(&mut player, 1.5);
        assert!(player.is_playing());
        assert!(!player.dialog().is_force_stopped());

        run(&mut player, 0.5);
        assert_eq!(player.dialog().visible_text(), "Hi");
    }

    #[test]
    fn intro_with_unknown_sequence_fails_fast() {
        let script = script(vec![("intro", vec![text_beat("Hi")])]);
        let mut player = ScenePlayer::from_script(&script).expect("script valid");
        assert!(matches!(
            player.intro("missing", 0.0, 0.0),
            Err(PlayerError::UnknownSequence { .. })
        ));
    }

    #[test]
    fn finished_script_fades_the_dialog_out() {
        let script = script(vec![("intro", vec![text_beat("Hi")])]);
        let mut player = ScenePlayer::from_script(&script).expect("script valid");
        player.intro("intro", 0.0, 0.0).expect("intro starts");
        run(&mut player, 2.0);
        assert!(player.is_playing());
        player.skip_input();
        player.tick(DT);
        assert!(player.advance_input());
        assert!(!player.is_playing());
        run(&mut player, 2.0);
        assert!(player.is_idle());
        assert_eq!(player.fade().opacity(), 0.0);
    }
}
