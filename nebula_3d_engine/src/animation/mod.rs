/// Animation module - clips, playback state and the skeletal evaluator

pub mod clip;
pub mod playback;
pub mod pose;
pub mod system;

pub use clip::{AnimationClip, Channel, Interpolate, KeyframeTrack};
pub use playback::{AnimationPlayback, PlaybackMode, PlaybackStatus};
pub use pose::Pose;
pub use system::AnimationSystem;
