//! Segment playback: timing, resolution, timers and the controller

pub mod controller;
pub mod timeline;
pub mod timer;
pub mod timing;
pub mod words;

pub use controller::SegmentController;
pub use timeline::SegmentTimeline;
pub use timing::{compute_window, SegmentWindow};
