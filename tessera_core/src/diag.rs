// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentation diagnostics.
//!
//! [`DiagSink`] receives lifecycle events from the presenter and the lock.
//! All methods default to no-ops, so implementing only the events you care
//! about is fine. Methods take `&self` because one sink is shared between
//! the render thread and the host paint path; implementations that
//! accumulate state use interior mutability.
//!
//! [`PresentEvent`] is the owning sum of every event, used by recording
//! sinks and the export tooling in `tessera_debug`.

use alloc::string::String;

use crate::buffer::SlotId;
use crate::time::{Moment, Span};

/// Emitted when a producer commits a write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferWritten {
    /// Which slot was written.
    pub slot: SlotId,
    /// Write generation after the commit.
    pub generation: u64,
    /// When the write finished.
    pub at: Moment,
    /// Earliest moment the frame may become visible (write throttle end).
    pub visible_at: Moment,
}

/// Emitted when the consumer acquires a visible buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferShown {
    /// Which slot was displayed.
    pub slot: SlotId,
    /// Generation being displayed.
    pub generation: u64,
    /// Display count for this generation, including this one.
    pub seen_count: u32,
    /// When the display happened.
    pub at: Moment,
}

/// Emitted when the consumer releases a buffer into its rewrite cooldown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferRetired {
    /// Which slot was released.
    pub slot: SlotId,
    /// Generation that was displayed.
    pub generation: u64,
    /// When the read finished.
    pub at: Moment,
}

/// Emitted when the producer reclaims a slot and starts a fresh write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferRecycled {
    /// Which slot was reclaimed.
    pub slot: SlotId,
    /// When the reclaim happened.
    pub at: Moment,
}

/// Emitted when a lock waiter first observes contention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockContended {
    /// Name of the contended lock.
    pub lock_name: String,
    /// Name of the waiting thread.
    pub waiter: String,
}

/// Emitted when a waiter forcibly breaks a lock after the wait limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockBroken {
    /// Name of the broken lock.
    pub lock_name: String,
    /// Thread that broke the lock.
    pub breaker: String,
    /// Thread that was holding the lock.
    pub victim: String,
    /// How long the breaker had been waiting.
    pub waited: Span,
}

/// Emitted when `release` is called by a thread that is not the owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleRelease {
    /// Name of the lock.
    pub lock_name: String,
    /// Thread that performed the release.
    pub releaser: String,
}

/// An owning record of any diagnostic event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresentEvent {
    /// A write commit.
    Written(BufferWritten),
    /// A display.
    Shown(BufferShown),
    /// A release into cooldown.
    Retired(BufferRetired),
    /// A reclaim for rewriting.
    Recycled(BufferRecycled),
    /// Lock contention observed.
    LockContended(LockContended),
    /// Forced lock breakage.
    LockBroken(LockBroken),
    /// The original holder noticed the breakage on release.
    BreakNoticed(LockBroken),
    /// Release by a non-owner.
    StaleRelease(StaleRelease),
}

/// Receives diagnostic events from the presenter and the lock.
///
/// All methods have default no-op implementations.
pub trait DiagSink {
    /// Called when a producer commits a write.
    fn on_buffer_written(&self, e: &BufferWritten) {
        _ = e;
    }

    /// Called when the consumer acquires a visible buffer.
    fn on_buffer_shown(&self, e: &BufferShown) {
        _ = e;
    }

    /// Called when the consumer releases a buffer into cooldown.
    fn on_buffer_retired(&self, e: &BufferRetired) {
        _ = e;
    }

    /// Called when the producer reclaims a slot.
    fn on_buffer_recycled(&self, e: &BufferRecycled) {
        _ = e;
    }

    /// Called when a lock waiter first observes contention.
    fn on_lock_contended(&self, e: &LockContended) {
        _ = e;
    }

    /// Called when a lock is forcibly broken.
    fn on_lock_broken(&self, e: &LockBroken) {
        _ = e;
    }

    /// Called when the original holder of a broken lock learns, on its next
    /// release, that its lock was stolen.
    fn on_break_noticed(&self, e: &LockBroken) {
        _ = e;
    }

    /// Called when a non-owner releases a lock.
    fn on_stale_release(&self, e: &StaleRelease) {
        _ = e;
    }
}

/// A [`DiagSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl DiagSink for NoopSink {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString as _;

    #[test]
    fn noop_sink_accepts_every_event() {
        let sink = NoopSink;
        sink.on_buffer_written(&BufferWritten {
            slot: SlotId(0),
            generation: 1,
            at: Moment(100),
            visible_at: Moment(170),
        });
        sink.on_buffer_shown(&BufferShown {
            slot: SlotId(0),
            generation: 1,
            seen_count: 1,
            at: Moment(180),
        });
        sink.on_lock_broken(&LockBroken {
            lock_name: "paint".to_string(),
            breaker: "render".to_string(),
            victim: "paint-callback".to_string(),
            waited: Span(30_000),
        });
    }

    #[test]
    fn events_compare_by_value() {
        let a = PresentEvent::Recycled(BufferRecycled {
            slot: SlotId(2),
            at: Moment(5),
        });
        let b = PresentEvent::Recycled(BufferRecycled {
            slot: SlotId(2),
            at: Moment(5),
        });
        assert_eq!(a, b);
    }
}
