// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-slot frame presenter.
//!
//! [`FramePresenter`] coordinates one producer (the render thread) and one
//! consumer (the host paint callback) across a small set of
//! [`FrameBuffer`] slots, so neither side ever touches a surface the other
//! is using and the producer can run ahead of a slow consumer by up to the
//! slot count.
//!
//! # Protocol
//!
//! Producer: [`begin_write`](FramePresenter::begin_write) → draw through the
//! [`WriteGuard`] → [`commit`](WriteGuard::commit). Consumer:
//! [`acquire_visible`](FramePresenter::acquire_visible) → display through
//! the [`ReadGuard`] → drop (or [`retire`](ReadGuard::retire)). Both sides
//! poll the timing queries and sleep for the returned span instead of
//! blocking on wake-up primitives.
//!
//! Slot selection is serialized by an [`ExclusiveLock`]; the pixels
//! themselves are covered by one mutex per slot, held for the duration of a
//! write or a display. Selection scans skip slots whose mutex is held — a
//! held slot is in use by the other side and not claimable anyway.
//!
//! When the producer outpaces the consumer, superseded frames are dropped:
//! acquiring the freshest visible slot retires every other visible slot
//! unseen, so the consumer never steps backwards in time.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use tessera_core::buffer::{BufferPhase, FrameBuffer, SlotId};
use tessera_core::clock::Clock;
use tessera_core::diag::{BufferRecycled, BufferRetired, BufferShown, BufferWritten, DiagSink};
use tessera_core::time::Span;

use crate::lock::ExclusiveLock;

/// Scheduling parameters for a [`FramePresenter`].
#[derive(Clone, Copy, Debug)]
pub struct PresenterConfig {
    /// Number of buffer slots (≥ 1). The producer may get this many frames
    /// ahead of the consumer.
    pub slots: usize,
    /// Artificial delay between a write finishing and the frame becoming
    /// visible, used to pace perceived frame rate.
    pub write_throttle: Span,
    /// Minimum time a buffer stays untouched after a read before it may be
    /// rewritten, protecting display pipelines that read asynchronously.
    pub rewrite_cooldown: Span,
    /// Wait limit for the internal state lock before forced breakage.
    pub max_lock_wait: Span,
}

impl PresenterConfig {
    /// Default configuration for desktop windowing systems.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            slots: 2,
            write_throttle: Span::ZERO,
            rewrite_cooldown: Span(20),
            max_lock_wait: Span::from_secs(30),
        }
    }

    /// Default configuration for Android, whose compositor needs pacing help
    /// even with double buffering.
    #[must_use]
    pub const fn android() -> Self {
        Self {
            slots: 2,
            write_throttle: Span(70),
            rewrite_cooldown: Span(20),
            max_lock_wait: Span::from_secs(30),
        }
    }

    /// Default configuration for iOS, whose compositor copies the surface
    /// synchronously on present.
    #[must_use]
    pub const fn ios() -> Self {
        Self {
            slots: 1,
            write_throttle: Span::ZERO,
            rewrite_cooldown: Span::ZERO,
            max_lock_wait: Span::from_secs(30),
        }
    }
}

/// Coordinates a producer and a consumer over a set of buffer slots.
pub struct FramePresenter<S> {
    config: PresenterConfig,
    clock: Arc<dyn Clock + Send + Sync>,
    lock: ExclusiveLock,
    sink: Option<Arc<dyn DiagSink + Send + Sync>>,
    slots: Vec<Mutex<FrameBuffer<S>>>,
}

impl<S> fmt::Debug for FramePresenter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramePresenter")
            .field("config", &self.config)
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl<S> FramePresenter<S> {
    /// Creates a presenter with `config.slots` buffers, each owning the
    /// surface produced by `make_surface` for its slot.
    ///
    /// # Panics
    ///
    /// Panics if `config.slots` is zero.
    #[must_use]
    pub fn new(
        config: PresenterConfig,
        clock: Arc<dyn Clock + Send + Sync>,
        mut make_surface: impl FnMut(SlotId) -> S,
    ) -> Self {
        assert!(config.slots >= 1, "presenter needs at least one buffer slot");
        let mut slots = Vec::with_capacity(config.slots);
        let mut index: u32 = 0;
        while (index as usize) < config.slots {
            let id = SlotId(index);
            slots.push(Mutex::new(FrameBuffer::new(
                id,
                u64::from(index) + 1,
                make_surface(id),
            )));
            index += 1;
        }
        Self {
            lock: ExclusiveLock::with_max_wait("frame-presenter", config.max_lock_wait),
            config,
            clock,
            sink: None,
            slots,
        }
    }

    /// Attaches a diagnostic sink to the presenter and its internal lock.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagSink + Send + Sync>) -> Self {
        self.lock.set_sink(Arc::clone(&sink));
        self.sink = Some(sink);
        self
    }

    /// Returns the scheduling configuration.
    #[must_use]
    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    /// Returns the injected clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Returns the internal state lock, for metrics and tests.
    #[must_use]
    pub fn state_lock(&self) -> &ExclusiveLock {
        &self.lock
    }

    fn try_claim<'a>(
        slot: &'a Mutex<FrameBuffer<S>>,
    ) -> Option<MutexGuard<'a, FrameBuffer<S>>> {
        match slot.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Releases the state lock, surfacing a breakage notice if this thread's
    /// earlier hold was stolen.
    fn unlock(&self) {
        if let Some(record) = self.lock.release()
            && self.sink.is_none()
        {
            // No sink attached; at minimum leave the diagnostic somewhere.
            eprintln!(
                "frame-presenter lock was broken by '{}' after {:?} while held by '{}'",
                record.breaker, record.waited, record.victim
            );
        }
    }

    /// Claims a slot for writing, or returns `None` when every slot is
    /// still protected (visible, throttling, cooling down, or captured by a
    /// gesture) — the producer has run ahead by the full slot count.
    ///
    /// The claimed buffer is cleared; draw through
    /// [`WriteGuard::surface_mut`] and finish with [`WriteGuard::commit`].
    pub fn begin_write(&self) -> Option<WriteGuard<'_, S>> {
        self.lock.acquire_blocking();
        let now = self.clock.now();

        let mut pick: Option<MutexGuard<'_, FrameBuffer<S>>> = None;
        for slot in &self.slots {
            let Some(buf) = Self::try_claim(slot) else {
                continue;
            };
            if buf.secondary_gesture() {
                continue;
            }
            let claimable = match buf.phase() {
                BufferPhase::Idle => true,
                BufferPhase::PendingRewrite => {
                    buf.ready_to_discard(now, self.config.rewrite_cooldown)
                }
                BufferPhase::WrittenPendingVisible | BufferPhase::Visible => false,
            };
            if !claimable {
                continue;
            }
            let older = match &pick {
                None => true,
                Some(current) => buf.end_write() < current.end_write(),
            };
            if older {
                pick = Some(buf);
            }
        }

        let result = pick.map(|mut buf| {
            buf.clear();
            if let Some(sink) = &self.sink {
                sink.on_buffer_recycled(&BufferRecycled {
                    slot: buf.slot(),
                    at: now,
                });
            }
            WriteGuard {
                buf,
                presenter: self,
                committed: false,
            }
        });
        self.unlock();
        result
    }

    /// Acquires the freshest displayable buffer, or `None` when nothing has
    /// become visible yet — not an error, there is simply nothing to show.
    ///
    /// Written buffers whose throttle has elapsed are promoted to visible as
    /// part of the scan. Older visible buffers superseded by the pick are
    /// retired unseen so a later call can never step backwards in time.
    pub fn acquire_visible(&self) -> Option<ReadGuard<'_, S>> {
        self.lock.acquire_blocking();
        let now = self.clock.now();

        let mut visible: Vec<MutexGuard<'_, FrameBuffer<S>>> = Vec::new();
        for slot in &self.slots {
            let Some(mut buf) = Self::try_claim(slot) else {
                continue;
            };
            if buf.promote(now) {
                visible.push(buf);
            }
        }

        let result = if visible.is_empty() {
            None
        } else {
            let mut best = 0;
            for (i, buf) in visible.iter().enumerate().skip(1) {
                let fresher = (buf.end_write(), buf.slot().0)
                    > (visible[best].end_write(), visible[best].slot().0);
                if fresher {
                    best = i;
                }
            }
            let mut picked = visible.swap_remove(best);
            for mut superseded in visible {
                superseded.set_ready_to_rewrite(now);
                self.emit_retired(&BufferRetired {
                    slot: superseded.slot(),
                    generation: superseded.generation(),
                    at: now,
                });
            }

            picked.note_seen();
            if let Some(sink) = &self.sink {
                sink.on_buffer_shown(&BufferShown {
                    slot: picked.slot(),
                    generation: picked.generation(),
                    seen_count: picked.seen_count(),
                    at: now,
                });
            }
            Some(ReadGuard {
                buf: picked,
                presenter: self,
                retired: false,
            })
        };
        self.unlock();
        result
    }

    /// Returns how long the consumer should sleep before a buffer can
    /// become visible, or `None` when nothing is written.
    ///
    /// `Some(Span::ZERO)` means [`acquire_visible`](Self::acquire_visible)
    /// will succeed now.
    #[must_use]
    pub fn time_until_visible(&self) -> Option<Span> {
        let now = self.clock.now();
        let mut soonest: Option<Span> = None;
        for slot in &self.slots {
            let Some(buf) = Self::try_claim(slot) else {
                continue;
            };
            if let Some(wait) = buf.time_until_visible(now) {
                soonest = Some(soonest.map_or(wait, |s| s.min(wait)));
            }
        }
        soonest
    }

    /// Returns how long the producer should sleep before a slot becomes
    /// writable, or `None` when no slot will free up without consumer
    /// action.
    ///
    /// `Some(Span::ZERO)` means [`begin_write`](Self::begin_write) will
    /// succeed now.
    #[must_use]
    pub fn time_until_writable(&self) -> Option<Span> {
        let now = self.clock.now();
        let mut soonest: Option<Span> = None;
        for slot in &self.slots {
            let Some(buf) = Self::try_claim(slot) else {
                continue;
            };
            if buf.secondary_gesture() {
                continue;
            }
            if let Some(wait) = buf.time_until_writable(now, self.config.rewrite_cooldown) {
                soonest = Some(soonest.map_or(wait, |s| s.min(wait)));
            }
        }
        soonest
    }

    /// Releases every secondary-gesture capture, returning the buffers to
    /// the normal rewrite cycle.
    pub fn clear_secondary_gesture(&self) {
        self.lock.acquire_blocking();
        for slot in &self.slots {
            if let Some(mut buf) = Self::try_claim(slot) {
                buf.set_secondary_gesture(false);
            }
        }
        self.unlock();
    }

    fn emit_retired(&self, e: &BufferRetired) {
        if let Some(sink) = &self.sink {
            sink.on_buffer_retired(e);
        }
    }
}

/// Exclusive write access to a claimed buffer slot.
///
/// Dropping without [`commit`](Self::commit) abandons the frame: the buffer
/// is invalidated and reads as having nothing to show.
pub struct WriteGuard<'a, S> {
    buf: MutexGuard<'a, FrameBuffer<S>>,
    presenter: &'a FramePresenter<S>,
    committed: bool,
}

impl<S> fmt::Debug for WriteGuard<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteGuard")
            .field("slot", &self.buf.slot())
            .finish_non_exhaustive()
    }
}

impl<S> WriteGuard<'_, S> {
    /// Returns the slot being written.
    #[must_use]
    pub fn slot(&self) -> SlotId {
        self.buf.slot()
    }

    /// Exclusive access to the surface for drawing.
    pub fn surface_mut(&mut self) -> &mut S {
        self.buf.surface_mut()
    }

    /// Marks the write finished, entering the written-pending-visible state
    /// (with the configured write throttle).
    pub fn commit(mut self) {
        let now = self.presenter.clock.now();
        self.buf
            .set_written(now, self.presenter.config.write_throttle);
        if let Some(sink) = &self.presenter.sink {
            sink.on_buffer_written(&BufferWritten {
                slot: self.buf.slot(),
                generation: self.buf.generation(),
                at: now,
                visible_at: self.buf.end_write(),
            });
        }
        self.committed = true;
    }
}

impl<S> Drop for WriteGuard<'_, S> {
    fn drop(&mut self) {
        if !self.committed {
            self.buf.invalidate();
        }
    }
}

/// Shared read access to the displayed buffer slot.
///
/// Dropping retires the buffer into its rewrite cooldown; call
/// [`retire`](Self::retire) to do so explicitly.
pub struct ReadGuard<'a, S> {
    buf: MutexGuard<'a, FrameBuffer<S>>,
    presenter: &'a FramePresenter<S>,
    retired: bool,
}

impl<S> fmt::Debug for ReadGuard<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadGuard")
            .field("slot", &self.buf.slot())
            .field("generation", &self.buf.generation())
            .finish_non_exhaustive()
    }
}

impl<S> ReadGuard<'_, S> {
    /// Returns the slot being displayed.
    #[must_use]
    pub fn slot(&self) -> SlotId {
        self.buf.slot()
    }

    /// Returns the generation being displayed. Compare against the previous
    /// display to detect a stale (unchanged) frame.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.buf.generation()
    }

    /// Returns how many times this generation has been displayed.
    #[must_use]
    pub fn seen_count(&self) -> u32 {
        self.buf.seen_count()
    }

    /// Shared access to the surface for compositing.
    #[must_use]
    pub fn surface(&self) -> &S {
        self.buf.surface()
    }

    /// Tags this buffer as captured for a secondary gesture (pan/zoom
    /// snapshot). The producer will not reclaim it until
    /// [`FramePresenter::clear_secondary_gesture`] is called.
    pub fn capture_for_secondary_gesture(&mut self) {
        self.buf.set_secondary_gesture(true);
    }

    /// Retires the buffer into its rewrite cooldown now.
    pub fn retire(mut self) {
        self.retire_inner();
    }

    fn retire_inner(&mut self) {
        if self.retired {
            return;
        }
        let now = self.presenter.clock.now();
        self.buf.set_ready_to_rewrite(now);
        self.presenter.emit_retired(&BufferRetired {
            slot: self.buf.slot(),
            generation: self.buf.generation(),
            at: now,
        });
        self.retired = true;
    }
}

impl<S> Drop for ReadGuard<'_, S> {
    fn drop(&mut self) {
        self.retire_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::clock::{Clock, ManualClock};
    use tessera_core::time::Moment;

    fn presenter(config: PresenterConfig) -> (Arc<ManualClock>, FramePresenter<Vec<u8>>) {
        let clock = Arc::new(ManualClock::new(Moment(1000)));
        let shared: Arc<dyn Clock + Send + Sync> = clock.clone();
        let p = FramePresenter::new(config, shared, |_| Vec::new());
        (clock, p)
    }

    #[test]
    fn write_then_read_round_trip() {
        let (_clock, p) = presenter(PresenterConfig::desktop());

        let mut w = p.begin_write().expect("an idle slot must be claimable");
        w.surface_mut().push(42);
        w.commit();

        let r = p.acquire_visible().expect("committed frame must show");
        assert_eq!(r.surface(), &[42]);
        assert_eq!(r.generation(), 1);
        assert_eq!(r.seen_count(), 1);
        r.retire();
    }

    #[test]
    fn nothing_to_show_before_first_write() {
        let (_clock, p) = presenter(PresenterConfig::desktop());
        assert!(p.acquire_visible().is_none());
        assert_eq!(p.time_until_visible(), None);
    }

    #[test]
    fn write_throttle_delays_visibility() {
        let (clock, p) = presenter(PresenterConfig::android());

        p.begin_write().expect("idle slot").commit();
        assert!(p.acquire_visible().is_none(), "throttle still running");
        assert_eq!(p.time_until_visible(), Some(Span(70)));

        clock.advance(Span(69));
        assert!(p.acquire_visible().is_none());

        clock.advance(Span(1));
        assert_eq!(p.time_until_visible(), Some(Span::ZERO));
        assert!(p.acquire_visible().is_some(), "visible once throttle ends");
    }

    #[test]
    fn producer_runs_ahead_by_slot_count_only() {
        let (_clock, p) = presenter(PresenterConfig::desktop());

        p.begin_write().expect("slot 0").commit();
        p.begin_write().expect("slot 1").commit();
        assert!(
            p.begin_write().is_none(),
            "both slots protected; producer is ahead by the full slot count"
        );
        assert_eq!(p.time_until_writable(), None);
    }

    #[test]
    fn superseded_frames_are_dropped_not_replayed() {
        let (clock, p) = presenter(PresenterConfig::desktop());

        let mut w = p.begin_write().expect("slot for frame 1");
        w.surface_mut().push(1);
        w.commit();

        clock.advance(Span(5));
        let mut w = p.begin_write().expect("slot for frame 2");
        w.surface_mut().push(2);
        w.commit();

        let r = p.acquire_visible().expect("latest frame visible");
        assert_eq!(r.surface(), &[2], "consumer must see the fresher frame");
        drop(r);

        assert!(
            p.acquire_visible().is_none(),
            "the older frame was superseded, never shown again"
        );
    }

    #[test]
    fn cooldown_gates_slot_reuse() {
        let (_clock, p) = presenter(PresenterConfig::ios());

        p.begin_write().expect("the only slot").commit();
        p.acquire_visible().expect("visible").retire();

        // ios config has zero cooldown; the slot is immediately writable.
        assert_eq!(p.time_until_writable(), Some(Span::ZERO));

        let mut config = PresenterConfig::ios();
        config.rewrite_cooldown = Span(20);
        let (clock2, p2) = presenter(config);
        p2.begin_write().expect("slot").commit();
        p2.acquire_visible().expect("visible").retire();
        assert_eq!(p2.time_until_writable(), Some(Span(20)));
        assert!(p2.begin_write().is_none(), "cooldown still running");
        clock2.advance(Span(20));
        assert!(p2.begin_write().is_some(), "writable after cooldown");
    }

    #[test]
    fn uncommitted_write_shows_nothing() {
        let (_clock, p) = presenter(PresenterConfig::ios());

        let w = p.begin_write().expect("slot");
        drop(w);
        assert!(p.acquire_visible().is_none(), "abandoned write is invisible");
        assert!(
            p.begin_write().is_some(),
            "abandoned slot is immediately reclaimable"
        );
    }

    #[test]
    fn generation_detects_stale_views() {
        let (clock, p) = presenter(PresenterConfig::desktop());

        p.begin_write().expect("slot").commit();
        let first = p.acquire_visible().expect("visible");
        let gen_one = first.generation();
        drop(first);

        clock.advance(Span(25));
        p.begin_write().expect("slot").commit();
        let second = p.acquire_visible().expect("visible");
        assert!(
            second.generation() > gen_one || second.slot().0 != 0,
            "a rewrite must be distinguishable from the generation it replaced"
        );
    }

    #[test]
    fn gesture_capture_protects_the_slot() {
        let (clock, p) = presenter(PresenterConfig::ios());

        p.begin_write().expect("slot").commit();
        let mut r = p.acquire_visible().expect("visible");
        r.capture_for_secondary_gesture();
        drop(r);

        clock.advance(Span(100));
        assert!(
            p.begin_write().is_none(),
            "captured slot must not be reclaimed mid-gesture"
        );
        assert_eq!(p.time_until_writable(), None);

        p.clear_secondary_gesture();
        assert!(p.begin_write().is_some(), "reclaimable after the gesture");
    }

    #[test]
    #[should_panic(expected = "at least one buffer slot")]
    fn zero_slots_is_rejected() {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(ManualClock::new(Moment::ZERO));
        let mut config = PresenterConfig::desktop();
        config.slots = 0;
        let _ = FramePresenter::new(config, clock, |_| ());
    }
}
