//! Opacity fades for the dialogue UI.
//!
//! The fade-in pipeline decouples "the box becomes visible" from "the
//! script starts talking": an optional start delay, the opacity ramp, then
//! a further hold before signaling that the sequence may begin. The fade
//! out runs the ramp in reverse at end of sequence.

/// Seconds the opacity ramp itself takes, in either direction.
const RAMP_SECS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeEvent {
    /// The fade-in pipeline finished; clear the dialog force-stop and start
    /// the opening sequence.
    SequenceStart,
    /// The fade-out ramp reached zero opacity.
    FadedOut,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Hidden,
    DelayIn { remaining: f32, text_delay: f32 },
    RampIn { text_delay: f32 },
    HoldText { remaining: f32 },
    Visible,
    DelayOut { remaining: f32 },
    RampOut,
}

#[derive(Debug)]
pub struct FadeController {
    phase: Phase,
    opacity: f32,
}

impl FadeController {
    pub fn new() -> Self {
        Self {
            phase: Phase::Hidden,
            opacity: 0.0,
        }
    }

    /// Begin the entrance: wait `fade_delay`, ramp 0 to 1, wait
    /// `text_delay`, then emit `SequenceStart` from `update`.
    pub fn fade_in(&mut self, fade_delay: f32, text_delay: f32) {
        self.opacity = 0.0;
        self.phase = if fade_delay > 0.0 {
            Phase::DelayIn {
                remaining: fade_delay,
                text_delay,
            }
        } else {
            Phase::RampIn { text_delay }
        };
    }

    /// Begin the exit ramp after `delay` seconds.
    pub fn fade_out(&mut self, delay: f32) {
        self.phase = if delay > 0.0 {
            Phase::DelayOut { remaining: delay }
        } else {
            Phase::RampOut
        };
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    /// Advance the pipeline. Each event is emitted exactly once.
    pub fn update(&mut self, dt: f32) -> Option<FadeEvent> {
        match self.phase {
            Phase::Hidden | Phase::Visible => None,
            Phase::DelayIn {
                remaining,
                text_delay,
            } => {
                let remaining = remaining - dt;
                self.phase = if remaining <= 0.0 {
                    Phase::RampIn { text_delay }
                } else {
                    Phase::DelayIn {
                        remaining,
                        text_delay,
                    }
                };
                None
            }
            Phase::RampIn { text_delay } => {
                self.opacity = (self.opacity + dt / RAMP_SECS).min(1.0);
                if self.opacity >= 1.0 {
                    self.phase = if text_delay > 0.0 {
                        Phase::HoldText {
                            remaining: text_delay,
                        }
                    } else {
                        Phase::Visible
                    };
                    if text_delay <= 0.0 {
                        return Some(FadeEvent::SequenceStart);
                    }
                }
                None
            }
            Phase::HoldText { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.phase = Phase::Visible;
                    Some(FadeEvent::SequenceStart)
                } else {
                    self.phase = Phase::HoldText { remaining };
                    None
                }
            }
            Phase::DelayOut { remaining } => {
                let remaining = remaining - dt;
                self.phase = if remaining <= 0.0 {
                    Phase::RampOut
                } else {
                    Phase::DelayOut { remaining }
                };
                None
            }
            Phase::RampOut => {
                self.opacity = (self.opacity - dt / RAMP_SECS).max(0.0);
                if self.opacity <= 0.0 {
                    self.phase = Phase::Hidden;
                    Some(FadeEvent::FadedOut)
                } else {
                    None
                }
            }
        }
    }
}

impl Default for FadeController {
    fn default() -> Self {
        Self::new()
    }
}
