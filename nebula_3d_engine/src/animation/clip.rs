/// Keyframe tracks, channels and clips.
///
/// A clip holds one channel per bone; a channel holds independent
/// position/rotation/scale tracks, any of which may be empty (meaning
/// "hold bind pose" for that component). Sampling clamps to the first
/// and last keyframe outside the track's time range — it never
/// extrapolates and never fails.

use glam::{Quat, Vec3};

/// Value types a keyframe track can interpolate.
pub trait Interpolate: Copy {
    /// Interpolate between `a` and `b` by `t` in [0, 1].
    fn interpolate(a: Self, b: Self, t: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }
}

impl Interpolate for Quat {
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        // Spherical interpolation; glam takes the shortest arc.
        a.slerp(b, t)
    }
}

/// One keyframe track: parallel time/value arrays, times ascending.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolate> {
    times: Vec<f32>,
    values: Vec<T>,
}

impl<T: Interpolate> KeyframeTrack<T> {
    /// Create a track from parallel arrays.
    ///
    /// `times` must be sorted ascending and the same length as
    /// `values`.
    pub fn new(times: Vec<f32>, values: Vec<T>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        debug_assert!(times.windows(2).all(|w| w[0] <= w[1]), "keyframe times must ascend");
        Self { times, values }
    }

    /// A track with no keyframes ("hold bind pose").
    pub fn empty() -> Self {
        Self { times: Vec::new(), values: Vec::new() }
    }

    /// Whether the track has no keyframes.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Sample the track at `time`.
    ///
    /// Binary-searches for the bracketing keyframe pair and
    /// interpolates by the fractional time between them. Before the
    /// first keyframe or past the last one the boundary value is
    /// returned as-is. `None` only for an empty track.
    pub fn sample(&self, time: f32) -> Option<T> {
        let first = *self.values.first()?;
        let len = self.times.len();

        if time <= self.times[0] {
            return Some(first);
        }
        if time >= self.times[len - 1] {
            return Some(self.values[len - 1]);
        }

        // First index with a keyframe time strictly after `time`; the
        // range checks above guarantee 1 <= next < len.
        let next = self.times.partition_point(|&t| t <= time);
        let prev = next - 1;

        let t0 = self.times[prev];
        let t1 = self.times[next];
        let span = t1 - t0;
        let t = if span > 1e-6 { (time - t0) / span } else { 0.0 };

        Some(T::interpolate(self.values[prev], self.values[next], t))
    }
}

/// Animation channel for one bone.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Position keyframes (empty = hold bind pose position)
    pub position: KeyframeTrack<Vec3>,
    /// Rotation keyframes (empty = hold bind pose rotation)
    pub rotation: KeyframeTrack<Quat>,
    /// Scale keyframes (empty = hold bind pose scale)
    pub scale: KeyframeTrack<Vec3>,
}

impl Channel {
    /// A channel with no keyframes on any component.
    pub fn empty() -> Self {
        Self {
            position: KeyframeTrack::empty(),
            rotation: KeyframeTrack::empty(),
            scale: KeyframeTrack::empty(),
        }
    }
}

/// A named animation clip: one channel per bone.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    /// Clip name, as imported
    pub name: String,
    /// Length in seconds
    pub duration: f32,
    /// Channels indexed by bone
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    /// Create a clip.
    pub fn new(name: impl Into<String>, duration: f32, channels: Vec<Channel>) -> Self {
        Self { name: name.into(), duration, channels }
    }
}

#[cfg(test)]
#[path = "clip_tests.rs"]
mod tests;
