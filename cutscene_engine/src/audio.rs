//! Sound cue dispatch over fixed instance pools.
//!
//! Each cue owns a small pool of playback instances sharing one decoded
//! buffer, so rapid retriggers overlap instead of cutting each other off.
//! The dispatcher tracks pool state and timing; actual output goes through
//! the `AudioSink` observer so the embedding layer can route events to a
//! real device. Delayed triggers live in a pending list ticked by
//! `update(dt)` and are dropped wholesale when the owning sequence stops.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use log::warn;

/// Receives playback events. Default methods ignore everything, so headless
/// hosts and tests can observe only what they care about.
pub trait AudioSink {
    fn cue_started(&mut self, _name: &str, _instance: usize, _playback: CuePlayback) {}
    fn cue_stopped(&mut self, _name: &str) {}
}

/// Sink used when no observer is attached.
struct NullSink;

impl AudioSink for NullSink {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuePlayback {
    pub volume: f32,
    pub looped: bool,
}

impl CuePlayback {
    pub fn one_shot(volume: f32) -> Self {
        Self {
            volume,
            looped: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CueInstance {
    playing: bool,
    looped: bool,
    volume: f32,
    /// Seconds until a one-shot instance frees itself. Looping instances
    /// play until stopped.
    remaining: f32,
}

#[derive(Debug, Clone)]
struct CuePool {
    duration: f32,
    instances: Vec<CueInstance>,
}

#[derive(Debug, Clone)]
struct PendingCue {
    name: String,
    playback: CuePlayback,
    remaining: f32,
}

pub struct AudioCueDispatcher {
    pools: BTreeMap<String, CuePool>,
    pending: Vec<PendingCue>,
    sink: Box<dyn AudioSink>,
    history: Vec<String>,
}

impl AudioCueDispatcher {
    pub fn new() -> Self {
        Self {
            pools: BTreeMap::new(),
            pending: Vec::new(),
            sink: Box::new(NullSink),
            history: Vec::new(),
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.sink = sink;
    }

    /// Register a cue with a fixed pool size and its one-shot duration.
    /// Re-registering replaces the pool.
    pub fn register_cue(&mut self, name: &str, pool_size: usize, duration: f32) {
        self.pools.insert(
            name.to_string(),
            CuePool {
                duration: duration.max(0.0),
                instances: vec![CueInstance::default(); pool_size.max(1)],
            },
        );
    }

    pub fn cue_names(&self) -> BTreeSet<String> {
        self.pools.keys().cloned().collect()
    }

    /// Start a cue on a free instance, or steal the first instance if the
    /// whole pool is busy (audibly interrupting it). Unknown names warn and
    /// no-op.
    pub fn play_sound(&mut self, name: &str, playback: CuePlayback) {
        let Some(pool) = self.pools.get_mut(name) else {
            warn!("sound cue \"{name}\" not registered");
            return;
        };
        let slot = pool
            .instances
            .iter()
            .position(|instance| !instance.playing)
            .unwrap_or(0);
        pool.instances[slot] = CueInstance {
            playing: true,
            looped: playback.looped,
            volume: playback.volume,
            remaining: pool.duration,
        };
        self.history.push(format!(
            "cue.play {name} #{slot} vol={:.2}{}",
            playback.volume,
            if playback.looped { " loop" } else { "" }
        ));
        self.sink.cue_started(name, slot, playback);
    }

    /// Stop every instance in the cue's pool.
    pub fn stop_sound(&mut self, name: &str) {
        let Some(pool) = self.pools.get_mut(name) else {
            warn!("sound cue \"{name}\" not registered");
            return;
        };
        for instance in &mut pool.instances {
            instance.playing = false;
        }
        self.history.push(format!("cue.stop {name}"));
        self.sink.cue_stopped(name);
    }

    /// Schedule a trigger `delay_secs` into the future. Fires from
    /// `update(dt)` unless canceled first.
    pub fn schedule(&mut self, name: &str, playback: CuePlayback, delay_secs: f32) {
        self.history
            .push(format!("cue.schedule {name} +{delay_secs:.2}s"));
        self.pending.push(PendingCue {
            name: name.to_string(),
            playback,
            remaining: delay_secs,
        });
    }

    /// Drop all pending delayed triggers. Called when the owning sequence
    /// stops or a new one starts, so no stale cue fires into the next scene.
    pub fn cancel_scheduled(&mut self) {
        if !self.pending.is_empty() {
            self.history
                .push(format!("cue.cancel_scheduled n={}", self.pending.len()));
            self.pending.clear();
        }
    }

    /// Tick scheduled triggers and free finished one-shot instances.
    pub fn update(&mut self, dt: f32) {
        for pending in &mut self.pending {
            pending.remaining -= dt;
        }
        let due: Vec<PendingCue> = {
            let (due, rest) = std::mem::take(&mut self.pending)
                .into_iter()
                .partition(|pending| pending.remaining <= 0.0);
            self.pending = rest;
            due
        };
        for cue in due {
            self.play_sound(&cue.name, cue.playback);
        }

        for pool in self.pools.values_mut() {
            for instance in &mut pool.instances {
                if instance.playing && !instance.looped {
                    instance.remaining -= dt;
                    if instance.remaining <= 0.0 {
                        instance.playing = false;
                    }
                }
            }
        }
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.pools
            .get(name)
            .map(|pool| pool.instances.iter().any(|instance| instance.playing))
            .unwrap_or(false)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Chronological event trace, kept for observability and tests.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl Default for AudioCueDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
