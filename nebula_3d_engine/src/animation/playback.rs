/// Animation playback state.
///
/// One playback drives one skinned-mesh instance. Time advances at the
/// caller's fixed animation tick, independent of the render rate.

use crate::engine_warn;

/// How the clip behaves at its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Wrap time into [0, duration)
    Loop,
    /// Clamp to the duration and stop
    Once,
    /// Declared but not implemented upstream; ticks with Loop semantics
    PingPong,
}

/// Current playback status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Advancing each tick
    Playing,
    /// Holding the current time
    Paused,
    /// Finished (or never started)
    Stopped,
}

/// Playback position of one clip on one instance.
#[derive(Debug, Clone)]
pub struct AnimationPlayback {
    /// Index into the scene's clip list
    pub clip: usize,
    /// End-of-clip behavior
    pub mode: PlaybackMode,
    /// Current status
    pub status: PlaybackStatus,
    /// Current time in seconds
    pub time: f32,
    /// Clip duration in seconds
    pub duration: f32,

    /// PingPong fallback has been reported for this playback
    pingpong_warned: bool,
}

impl AnimationPlayback {
    /// Create a playback at time 0 in `Playing` state.
    pub fn new(clip: usize, mode: PlaybackMode, duration: f32) -> Self {
        Self {
            clip,
            mode,
            status: PlaybackStatus::Playing,
            time: 0.0,
            duration,
            pingpong_warned: false,
        }
    }

    /// Resume (or restart after a stop) the playback.
    pub fn play(&mut self) {
        if self.status == PlaybackStatus::Stopped {
            self.time = 0.0;
        }
        self.status = PlaybackStatus::Playing;
    }

    /// Hold the current time.
    pub fn pause(&mut self) {
        self.status = PlaybackStatus::Paused;
    }

    /// Stop and rewind to time 0.
    pub fn stop(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.time = 0.0;
    }

    /// Advance by `dt` seconds.
    ///
    /// Returns whether the playback was playing (and should be
    /// sampled this tick). Loop wraps time into [0, duration); Once
    /// clamps to the duration and flips to Stopped on reaching it;
    /// PingPong falls back to Loop semantics (reverse playback was
    /// never implemented upstream — the fallback is reported once).
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.status != PlaybackStatus::Playing {
            return false;
        }
        if self.duration <= 0.0 {
            self.time = 0.0;
            return true;
        }

        self.time += dt;

        match self.mode {
            PlaybackMode::Loop => {
                self.time = self.time.rem_euclid(self.duration);
            }
            PlaybackMode::Once => {
                if self.time >= self.duration {
                    self.time = self.duration;
                    self.status = PlaybackStatus::Stopped;
                }
            }
            PlaybackMode::PingPong => {
                if !self.pingpong_warned {
                    engine_warn!("nebula3d::AnimationPlayback",
                        "pingpong playback is not implemented; falling back to loop");
                    self.pingpong_warned = true;
                }
                self.time = self.time.rem_euclid(self.duration);
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "playback_tests.rs"]
mod tests;
