//! Actor animation state machine and expression state.
//!
//! Three named animations exist: a stable idle loop, a stable dance loop,
//! and a wave one-shot that freezes on its last pose and then hands control
//! back to idle. The one-shot return is the concurrency hazard of this
//! module: its completion must not fire if a later request changed state in
//! the meantime, so every state-changing call takes a fresh token and the
//! completion compares tokens before acting.

use cutscene_script::{EyeKey, MouthKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Wave,
    Dance,
}

/// Which clips the loaded model actually has, plus the wave clip's length.
/// A request for a missing clip is a silent no-op returning `false`.
#[derive(Debug, Clone, Copy)]
pub struct ClipSet {
    pub has_idle: bool,
    pub has_wave: bool,
    pub has_dance: bool,
    pub wave_duration: f32,
}

impl Default for ClipSet {
    fn default() -> Self {
        Self {
            has_idle: true,
            has_wave: true,
            has_dance: true,
            wave_duration: 2.4,
        }
    }
}

/// In-flight crossfade between two actions. Both halves run over the same
/// caller-supplied duration; the new action is reset before fading in, so
/// there are never two full-intensity actions at once.
#[derive(Debug, Clone, Copy)]
struct Crossfade {
    from: AnimationState,
    remaining: f32,
    duration: f32,
}

#[derive(Debug, Clone, Copy)]
struct OneShot {
    token: u64,
    remaining: f32,
    return_speed: f32,
}

#[derive(Debug)]
pub struct AnimationController {
    clips: ClipSet,
    state: AnimationState,
    crossfade: Option<Crossfade>,
    pending: Option<OneShot>,
    live_token: u64,
    next_token: u64,
}

impl AnimationController {
    pub fn new(clips: ClipSet) -> Self {
        Self {
            clips,
            state: AnimationState::Idle,
            crossfade: None,
            pending: None,
            live_token: 0,
            next_token: 1,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_crossfading(&self) -> bool {
        self.crossfade.is_some()
    }

    pub fn has_pending_one_shot(&self) -> bool {
        self.pending.is_some()
    }

    /// Blend weight of the incoming action, 0.0..=1.0.
    pub fn blend_progress(&self) -> f32 {
        match self.crossfade {
            Some(fade) if fade.duration > 0.0 => 1.0 - (fade.remaining / fade.duration).min(1.0),
            Some(_) => 1.0,
            None => 1.0,
        }
    }

    /// Crossfade to the idle loop. No-op if already idle.
    pub fn idle(&mut self, speed: f32) -> bool {
        if !self.clips.has_idle {
            return false;
        }
        if self.state == AnimationState::Idle {
            return true;
        }
        self.transition(AnimationState::Idle, speed);
        true
    }

    /// Crossfade to the dance loop. No-op if already dancing.
    pub fn dance(&mut self, speed: f32) -> bool {
        if !self.clips.has_dance {
            return false;
        }
        if self.state == AnimationState::Dance {
            return true;
        }
        self.transition(AnimationState::Dance, speed);
        true
    }

    /// Play the wave one-shot, then return to idle unless something else
    /// claimed the state first.
    pub fn wave_once(&mut self, speed: f32) -> bool {
        if !self.clips.has_wave {
            return false;
        }
        if self.state == AnimationState::Wave {
            return true;
        }
        let token = self.transition(AnimationState::Wave, speed);
        self.pending = Some(OneShot {
            token,
            remaining: self.clips.wave_duration,
            return_speed: speed,
        });
        true
    }

    /// Drop any outstanding one-shot completion. Used when the owning
    /// sequence stops so a stale return-to-idle cannot fire later.
    pub fn invalidate_pending(&mut self) {
        self.pending = None;
    }

    /// Advance fades and the one-shot clock. The completion only acts if
    /// its token is still the live one; an intervening `dance`/`idle`/
    /// second `wave_once` bumped the token and the stale completion is
    /// dropped here.
    pub fn update(&mut self, dt: f32) {
        if let Some(fade) = self.crossfade.as_mut() {
            fade.remaining -= dt;
            if fade.remaining <= 0.0 {
                self.crossfade = None;
            }
        }

        if let Some(one_shot) = self.pending {
            let remaining = one_shot.remaining - dt;
            if remaining <= 0.0 {
                self.pending = None;
                if one_shot.token == self.live_token && self.state == AnimationState::Wave {
                    // The clip has frozen on its last pose; blend back home.
                    self.transition(AnimationState::Idle, one_shot.return_speed);
                }
            } else {
                self.pending = Some(OneShot { remaining, ..one_shot });
            }
        }
    }

    fn transition(&mut self, to: AnimationState, speed: f32) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        self.live_token = token;
        self.pending = None;
        self.crossfade = Some(Crossfade {
            from: self.state,
            remaining: speed,
            duration: speed,
        });
        self.state = to;
        token
    }
}

/// The on-screen character: animation state machine plus the swappable
/// eye/mouth textures.
#[derive(Debug)]
pub struct Actor {
    animation: AnimationController,
    eyes: EyeKey,
    mouth: MouthKey,
}

impl Actor {
    pub fn new(clips: ClipSet) -> Self {
        Self {
            animation: AnimationController::new(clips),
            eyes: EyeKey::Happy,
            mouth: MouthKey::Regular,
        }
    }

    pub fn set_eyes(&mut self, eyes: EyeKey) {
        self.eyes = eyes;
    }

    pub fn set_mouth(&mut self, mouth: MouthKey) {
        self.mouth = mouth;
    }

    pub fn eyes(&self) -> EyeKey {
        self.eyes
    }

    pub fn mouth(&self) -> MouthKey {
        self.mouth
    }

    pub fn animation_state(&self) -> AnimationState {
        self.animation.state()
    }

    pub fn idle(&mut self, speed: f32) -> bool {
        self.animation.idle(speed)
    }

    pub fn dance(&mut self, speed: f32) -> bool {
        self.animation.dance(speed)
    }

    pub fn wave_once(&mut self, speed: f32) -> bool {
        self.animation.wave_once(speed)
    }

    pub fn invalidate_pending(&mut self) {
        self.animation.invalidate_pending();
    }

    pub fn update(&mut self, dt: f32) {
        self.animation.update(dt);
    }

    pub fn controller(&self) -> &AnimationController {
        &self.animation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AnimationController {
        AnimationController::new(ClipSet {
            wave_duration: 1.0,
            ..ClipSet::default()
        })
    }

    fn run(controller: &mut AnimationController, seconds: f32) {
        let mut elapsed = 0.0;
        while elapsed < seconds {
            controller.update(1.0 / 60.0);
            elapsed += 1.0 / 60.0;
        }
    }

    #[test]
    fn wave_returns_to_idle_after_completion() {
        let mut anim = controller();
        assert!(anim.wave_once(0.2));
        assert_eq!(anim.state(), AnimationState::Wave);
        run(&mut anim, 1.5);
        assert_eq!(anim.state(), AnimationState::Idle);
        assert!(!anim.has_pending_one_shot());
    }

    #[test]
    fn dance_preempts_wave_completion() {
        let mut anim = controller();
        assert!(anim.wave_once(0.2));
        run(&mut anim, 0.5);
        assert!(anim.dance(1.0));
        // Run long past the wave clip's end: the stale completion must not
        // force a transition back to idle.
        run(&mut anim, 3.0);
        assert_eq!(anim.state(), AnimationState::Dance);
    }

    #[test]
    fn second_wave_supersedes_the_first() {
        let mut anim = controller();
        assert!(anim.wave_once(0.2));
        run(&mut anim, 0.5);
        anim.idle(0.1);
        assert!(anim.wave_once(0.2));
        // Only the second wave's clock should matter.
        run(&mut anim, 0.6);
        assert_eq!(anim.state(), AnimationState::Wave);
        run(&mut anim, 0.6);
        assert_eq!(anim.state(), AnimationState::Idle);
    }

    #[test]
    fn missing_clip_is_a_silent_no_op() {
        let mut anim = AnimationController::new(ClipSet {
            has_dance: false,
            ..ClipSet::default()
        });
        assert!(!anim.dance(1.0));
        assert_eq!(anim.state(), AnimationState::Idle);
    }

    #[test]
    fn repeated_requests_do_not_restart_the_fade() {
        let mut anim = controller();
        assert!(anim.dance(1.0));
        run(&mut anim, 2.0);
        assert!(!anim.is_crossfading());
        assert!(anim.dance(1.0));
        assert!(!anim.is_crossfading());
    }

    #[test]
    fn invalidate_pending_drops_the_return_transition() {
        let mut anim = controller();
        assert!(anim.wave_once(0.2));
        anim.invalidate_pending();
        run(&mut anim, 2.0);
        assert_eq!(anim.state(), AnimationState::Wave);
    }

    #[test]
    fn expressions_are_stored_on_the_actor() {
        let mut actor = Actor::new(ClipSet::default());
        assert_eq!(actor.eyes(), EyeKey::Happy);
        actor.set_eyes(EyeKey::Squint);
        actor.set_mouth(MouthKey::Open);
        assert_eq!(actor.eyes(), EyeKey::Squint);
        assert_eq!(actor.mouth(), MouthKey::Open);
    }
}
