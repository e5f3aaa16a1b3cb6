// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Budgeted render pump and paint entry point.
//!
//! The host drives the render thread by calling [`RenderPump::step`] in a
//! loop with a wait-time budget; the pump draws when a repaint has come due
//! and a slot is writable, otherwise sleeps out the smaller of the budget
//! and its own computed wait. The host paint callback enters through
//! [`RenderPump::paint`].
//!
//! Repaint requests ([`request_repaint`](RenderPump::request_repaint)) carry
//! a deadline and coalesce to the earliest one. [`wake`](RenderPump::wake)
//! cuts a sleep short; sleeping is sliced and polled rather than parked on a
//! wake-up primitive, which behaves the same on every windowing back-end.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tessera_core::time::{Moment, Span};

use crate::presenter::FramePresenter;

/// Sleep slice between wake-flag checks.
const SLEEP_SLICE: Span = Span(10);

/// What a [`RenderPump::step`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A repaint was due and a frame was drawn and committed.
    Drew,
    /// Nothing to draw (or no writable slot); slept for the given span.
    Slept(Span),
}

/// Adapter between the host render-loop driver and a [`FramePresenter`].
pub struct RenderPump<S> {
    presenter: Arc<FramePresenter<S>>,
    due: Mutex<Option<Moment>>,
    wake: AtomicBool,
}

impl<S> fmt::Debug for RenderPump<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPump")
            .field("presenter", &self.presenter)
            .finish_non_exhaustive()
    }
}

impl<S> RenderPump<S> {
    /// Creates a pump over `presenter`.
    #[must_use]
    pub fn new(presenter: Arc<FramePresenter<S>>) -> Self {
        Self {
            presenter,
            due: Mutex::new(None),
            wake: AtomicBool::new(false),
        }
    }

    /// Returns the underlying presenter.
    #[must_use]
    pub fn presenter(&self) -> &Arc<FramePresenter<S>> {
        &self.presenter
    }

    fn due(&self) -> std::sync::MutexGuard<'_, Option<Moment>> {
        self.due.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests a repaint no later than `delay` from now. Requests coalesce
    /// to the earliest outstanding deadline.
    pub fn request_repaint(&self, delay: Span) {
        let deadline = self.presenter.clock().now().saturating_add(delay);
        let mut due = self.due();
        let coalesced = due.map_or(deadline, |d| d.min(deadline));
        *due = Some(coalesced);
        drop(due);
        if delay.is_zero() {
            self.wake();
        }
    }

    /// Requests an immediate repaint and wakes a sleeping step.
    pub fn request_repaint_now(&self) {
        self.request_repaint(Span::ZERO);
    }

    /// Cuts the current (or next) sleep short.
    pub fn wake(&self) {
        self.wake.store(true, Ordering::SeqCst);
    }

    /// Runs one producer step within a wait-time `budget`.
    ///
    /// When a repaint is due and a slot is writable, `draw` is invoked with
    /// exclusive surface access and the frame is committed. Otherwise the
    /// pump sleeps the smaller of `budget` and its own computed wait (time
    /// to the deadline, or to the next writable slot), returning how long it
    /// actually slept.
    pub fn step(&self, budget: Span, draw: impl FnOnce(&mut S)) -> StepOutcome {
        let now = self.presenter.clock().now();

        let due_now = {
            let due = self.due();
            matches!(*due, Some(deadline) if now >= deadline)
        };

        if due_now {
            if let Some(mut guard) = self.presenter.begin_write() {
                // Consume the deadline before drawing so a request arriving
                // mid-draw schedules the next frame instead of being lost.
                *self.due() = None;
                draw(guard.surface_mut());
                guard.commit();
                return StepOutcome::Drew;
            }
            // Due but every slot is protected; wait for one to free up.
            let wait = self
                .presenter
                .time_until_writable()
                .unwrap_or(SLEEP_SLICE)
                .min(budget);
            return StepOutcome::Slept(self.sleep(wait));
        }

        let wait = match *self.due() {
            Some(deadline) => deadline.saturating_since(now).min(budget),
            None => budget,
        };
        StepOutcome::Slept(self.sleep(wait))
    }

    /// Runs the host paint callback against the current visible frame.
    ///
    /// Returns `false` without invoking `show` when nothing is visible —
    /// the "nothing to show" case is not an error. The buffer is retired
    /// (cooldown started) after `show` returns.
    pub fn paint(&self, show: impl FnOnce(&S)) -> bool {
        match self.presenter.acquire_visible() {
            Some(guard) => {
                show(guard.surface());
                guard.retire();
                true
            }
            None => false,
        }
    }

    /// Sleeps up to `span`, in slices, aborting early when woken. Returns
    /// the span actually slept.
    fn sleep(&self, span: Span) -> Span {
        let mut remaining = span;
        let mut slept = Span::ZERO;
        while !remaining.is_zero() {
            if self.wake.swap(false, Ordering::SeqCst) {
                break;
            }
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice.to_duration());
            slept = slept.saturating_add(slice);
            remaining = remaining.saturating_sub(slice);
        }
        slept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::PresenterConfig;
    use tessera_core::clock::{Clock, ManualClock};

    fn pump() -> (Arc<ManualClock>, RenderPump<Vec<u8>>) {
        let clock = Arc::new(ManualClock::new(tessera_core::time::Moment(1000)));
        let shared: Arc<dyn Clock + Send + Sync> = clock.clone();
        let presenter = Arc::new(FramePresenter::new(
            PresenterConfig::desktop(),
            shared,
            |_| Vec::new(),
        ));
        (clock, RenderPump::new(presenter))
    }

    #[test]
    fn step_without_request_sleeps_out_the_budget() {
        let (_clock, pump) = pump();
        let outcome = pump.step(Span(20), |_| panic!("must not draw"));
        assert_eq!(outcome, StepOutcome::Slept(Span(20)));
    }

    #[test]
    fn due_request_draws_and_clears_the_deadline() {
        let (_clock, pump) = pump();
        pump.request_repaint_now();

        let outcome = pump.step(Span(50), |surface| surface.push(7));
        assert_eq!(outcome, StepOutcome::Drew);
        assert!(pump.paint(|surface| assert_eq!(surface, &[7])));

        // The deadline was consumed; the next step just sleeps.
        let outcome = pump.step(Span::ZERO, |_| panic!("no request outstanding"));
        assert_eq!(outcome, StepOutcome::Slept(Span::ZERO));
    }

    #[test]
    fn delayed_request_waits_until_due() {
        let (clock, pump) = pump();
        pump.request_repaint(Span(40));

        // Not yet due: the step sleeps at most until the deadline.
        let outcome = pump.step(Span(100), |_| panic!("not due yet"));
        assert_eq!(outcome, StepOutcome::Slept(Span(40)));

        clock.advance(Span(40));
        assert_eq!(pump.step(Span(100), |_| {}), StepOutcome::Drew);
    }

    #[test]
    fn requests_coalesce_to_the_earliest_deadline() {
        let (clock, pump) = pump();
        pump.request_repaint(Span(50));
        pump.request_repaint(Span(10));
        pump.request_repaint(Span(30));

        clock.advance(Span(10));
        assert_eq!(pump.step(Span(100), |_| {}), StepOutcome::Drew);
    }

    #[test]
    fn wake_cuts_a_sleep_short() {
        let (_clock, pump) = pump();
        pump.wake();
        let outcome = pump.step(Span(500), |_| panic!("nothing due"));
        assert_eq!(
            outcome,
            StepOutcome::Slept(Span::ZERO),
            "a pre-set wake flag must cancel the sleep before it starts"
        );
    }

    #[test]
    fn paint_reports_nothing_to_show() {
        let (_clock, pump) = pump();
        assert!(!pump.paint(|_| panic!("nothing visible")));
    }
}
