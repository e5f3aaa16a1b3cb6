// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-slot frame-buffer lifecycle.
//!
//! A [`FrameBuffer`] owns one offscreen drawing surface and tracks where that
//! surface is in the produce/display/recycle cycle. The render thread and the
//! host paint path never block each other on the surface itself; they agree
//! on who may touch it by reading the lifecycle state and the two timestamps
//! bounding it.
//!
//! # State machine
//!
//! ```text
//!            clear()                 set_written(now)
//!   Idle ◄──────────────┐   Idle ──────────────────► WrittenPendingVisible
//!                       │                                     │
//!                       │                      promote(now) once the write
//!                       │                      throttle has elapsed
//!                       │                                     ▼
//!   PendingRewrite ◄────┴──── set_ready_to_rewrite(now) ── Visible
//!        │                                                    │
//!        └── ready_to_discard(now) after the rewrite          │ note_seen()
//!            cooldown, then clear() restarts the cycle        ▼
//!                                                      (displayed again)
//! ```
//!
//! Exactly one of the four phases holds at any instant
//! ([`FrameBuffer::phase`]). The write throttle paces frame delivery on
//! platforms whose compositors need help (70 ms on Android, zero on iOS and
//! desktop); the rewrite cooldown keeps the producer off a surface an
//! asynchronous display pipeline may still be reading.
//!
//! Both sides poll: the timing queries return how long the caller should
//! sleep before asking again, rather than blocking on a wake-up primitive.

use core::fmt;

use crate::time::{Moment, Span};

/// Identifies a buffer slot within a presenter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SlotId(pub u32);

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

/// The four mutually exclusive lifecycle phases of a [`FrameBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferPhase {
    /// Nothing valid to show; the producer may claim the buffer.
    Idle,
    /// Written but not yet displayable (write throttle still running).
    WrittenPendingVisible,
    /// Displayable; the consumer may read it.
    Visible,
    /// Read and released; cooling down before the producer may rewrite.
    PendingRewrite,
}

/// One offscreen surface plus its lifecycle bookkeeping.
///
/// The surface is exclusively owned — it is never shared between slots — and
/// is only reachable through [`surface`](Self::surface)/
/// [`surface_mut`](Self::surface_mut), so whoever holds the `FrameBuffer`
/// holds the pixels.
#[derive(Debug)]
pub struct FrameBuffer<S> {
    surface: S,
    slot: SlotId,
    sequence: u64,
    generation: u64,
    written: bool,
    ready_to_see: bool,
    wait_for_rewrite: bool,
    invalid: bool,
    secondary_gesture: bool,
    end_write: Moment,
    end_read: Moment,
    seen_count: u32,
}

impl<S> FrameBuffer<S> {
    /// Creates an idle buffer for `slot`, owning `surface`.
    ///
    /// `sequence` is assigned once at creation and never changes; presenters
    /// hand out strictly increasing values for diagnostics and ordering.
    #[must_use]
    pub const fn new(slot: SlotId, sequence: u64, surface: S) -> Self {
        Self {
            surface,
            slot,
            sequence,
            generation: 0,
            written: false,
            ready_to_see: false,
            wait_for_rewrite: false,
            invalid: false,
            secondary_gesture: false,
            end_write: Moment::ZERO,
            end_read: Moment::ZERO,
            seen_count: 0,
        }
    }

    /// Returns the slot this buffer occupies.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> SlotId {
        self.slot
    }

    /// Returns the creation-ordered sequence number.
    #[inline]
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the write generation: bumped on every (re)write, so a
    /// consumer can detect that it is viewing a stale generation.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns how many times the current generation has been displayed.
    #[inline]
    #[must_use]
    pub const fn seen_count(&self) -> u32 {
        self.seen_count
    }

    /// Returns the moment the last write (plus throttle) completes.
    #[inline]
    #[must_use]
    pub const fn end_write(&self) -> Moment {
        self.end_write
    }

    /// Returns the moment the last read finished.
    #[inline]
    #[must_use]
    pub const fn end_read(&self) -> Moment {
        self.end_read
    }

    /// Shared access to the owned surface.
    #[inline]
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Exclusive access to the owned surface.
    #[inline]
    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Derives the current lifecycle phase. Exactly one phase holds at any
    /// instant.
    #[must_use]
    pub const fn phase(&self) -> BufferPhase {
        if self.wait_for_rewrite {
            BufferPhase::PendingRewrite
        } else if self.ready_to_see {
            BufferPhase::Visible
        } else if self.written && !self.invalid {
            BufferPhase::WrittenPendingVisible
        } else {
            BufferPhase::Idle
        }
    }

    /// Returns to **Idle**, ready for the producer to start a fresh write.
    ///
    /// The generation is preserved so staleness detection spans rewrites;
    /// the seen count belongs to the displayed generation and resets.
    pub const fn clear(&mut self) {
        self.written = false;
        self.ready_to_see = false;
        self.wait_for_rewrite = false;
        self.invalid = false;
        self.seen_count = 0;
    }

    /// Marks the write finished at `now`, entering
    /// **WrittenPendingVisible**.
    ///
    /// `throttle` is the optional artificial delay before the frame may
    /// become visible; [`promote`](Self::promote) succeeds immediately when
    /// it is zero. Saturates rather than wrapping at the end of the
    /// timeline.
    ///
    /// Calling this without an intervening [`clear`](Self::clear) is a
    /// caller contract violation (the previous frame would be silently
    /// lost), guarded by a debug assertion rather than a runtime branch.
    pub const fn set_written(&mut self, now: Moment, throttle: Span) {
        debug_assert!(
            !self.written && !self.wait_for_rewrite,
            "FrameBuffer::set_written without clear()"
        );
        self.written = true;
        self.ready_to_see = false;
        self.invalid = false;
        self.generation += 1;
        self.end_write = now.saturating_add(throttle);
    }

    /// Abandons an in-progress write, leaving nothing to show.
    ///
    /// The buffer reads as **Idle**; this is the "undefined visual result"
    /// escape hatch for a producer that gave up mid-frame.
    pub const fn invalidate(&mut self) {
        self.invalid = true;
        self.written = false;
        self.ready_to_see = false;
    }

    /// Attempts the **WrittenPendingVisible → Visible** transition at `now`.
    ///
    /// Returns whether the buffer is visible afterwards: `true` once the
    /// write throttle has elapsed (immediately for a zero throttle), `false`
    /// for an unwritten or still-throttled buffer.
    pub const fn promote(&mut self, now: Moment) -> bool {
        if self.ready_to_see {
            return true;
        }
        if self.written && !self.wait_for_rewrite && now.0 >= self.end_write.0 {
            self.ready_to_see = true;
        }
        self.ready_to_see
    }

    /// Returns whether the buffer currently reads as displayable.
    #[inline]
    #[must_use]
    pub const fn visible(&self) -> bool {
        self.ready_to_see
    }

    /// Records one display of the current generation.
    pub const fn note_seen(&mut self) {
        self.seen_count += 1;
    }

    /// Marks the read finished at `now`, entering **PendingRewrite**.
    ///
    /// The producer must wait out the rewrite cooldown (see
    /// [`ready_to_discard`](Self::ready_to_discard)) before clearing and
    /// rewriting, in case the display pipeline still references the surface.
    pub const fn set_ready_to_rewrite(&mut self, now: Moment) {
        self.ready_to_see = false;
        self.wait_for_rewrite = true;
        self.end_read = now;
    }

    /// Returns whether the rewrite cooldown has elapsed at `now`.
    #[must_use]
    pub const fn ready_to_discard(&self, now: Moment, cooldown: Span) -> bool {
        self.wait_for_rewrite && now.0 >= self.end_read.saturating_add(cooldown).0
    }

    /// Returns how long the consumer must wait before the buffer becomes
    /// visible, or `None` when there is nothing to wait for (unwritten, or
    /// already past the visible stage).
    ///
    /// `Some(Span::ZERO)` means a [`promote`](Self::promote) at `now` will
    /// succeed.
    #[must_use]
    pub const fn time_until_visible(&self, now: Moment) -> Option<Span> {
        if self.wait_for_rewrite || !self.written || self.invalid {
            return None;
        }
        if self.ready_to_see {
            return Some(Span::ZERO);
        }
        Some(self.end_write.saturating_since(now))
    }

    /// Returns how long the producer must wait before it may claim this
    /// buffer, or `None` while the consumer side still holds it (written,
    /// visible, or displayed but not yet released).
    ///
    /// `Some(Span::ZERO)` means the buffer may be cleared at `now`.
    #[must_use]
    pub const fn time_until_writable(&self, now: Moment, cooldown: Span) -> Option<Span> {
        if self.wait_for_rewrite {
            return Some(self.end_read.saturating_add(cooldown).saturating_since(now));
        }
        match self.phase() {
            BufferPhase::Idle => Some(Span::ZERO),
            _ => None,
        }
    }

    /// Tags or untags this generation as captured for a secondary gesture
    /// (pan/zoom/magnifier snapshot). A tagged buffer is never handed back
    /// to the producer while the gesture is live.
    pub const fn set_secondary_gesture(&mut self, captured: bool) {
        self.secondary_gesture = captured;
    }

    /// Returns whether the buffer is captured for a secondary gesture.
    #[inline]
    #[must_use]
    pub const fn secondary_gesture(&self) -> bool {
        self.secondary_gesture
    }
}
