//! Segment playback controller
//!
//! **Module Structure:**
//! - `core.rs`: handle, state, lifecycle and observation
//! - `navigation.rs`: clock inference, mode transitions, segment navigation
//! - `boundary.rs`: boundary watch, completion follow-ups, player events
//! - `transport.rs`: seek, rate, volume, shadowing delay
//!
//! All state lives behind one `tokio::sync::Mutex`. Operations lock, mutate
//! synchronously and publish a snapshot before unlocking; the lock is never
//! held across an await. Timer tasks keep only a `Weak` reference and
//! present their slot generation after locking.

mod boundary;
mod core;
mod navigation;
mod transport;

pub use self::core::SegmentController;

use std::sync::Weak;
use tokio::sync::Mutex;

use self::core::{ControllerInner, TimerKind};

/// Run `action` for a fired one-shot timer
///
/// Does nothing if the controller is gone or shut down, or the timer was
/// superseded while it waited for the lock.
async fn fire<F>(this: &Weak<Mutex<ControllerInner>>, kind: TimerKind, generation: u64, action: F)
where
    F: FnOnce(&mut ControllerInner),
{
    let Some(shared) = this.upgrade() else {
        return;
    };
    let mut inner = shared.lock().await;
    if inner.disposed || !inner.timers.slot(kind).release(generation) {
        return;
    }
    action(&mut inner);
    inner.publish();
}
