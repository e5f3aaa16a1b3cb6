// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-buffered frame presenter, exclusive lock, and render pump.
//!
//! `tessera_present` is the std half of the presentation subsystem: it wires
//! the platform-free state machines from [`tessera_core`] to real threads
//! and a real clock.
//!
//! # Thread model
//!
//! Two threads of interest cooperate over the presenter:
//!
//! ```text
//!   render thread                     host paint callback
//!       │                                   │
//!   RenderPump::step(budget, draw)      RenderPump::paint(show)
//!       │                                   │
//!       ▼                                   ▼
//!   FramePresenter::begin_write        FramePresenter::acquire_visible
//!       │     (slot selection under ExclusiveLock)
//!       ▼                                   ▼
//!   WriteGuard → commit()              ReadGuard → retire()
//! ```
//!
//! Neither side blocks on the other: selection scans skip slots the other
//! side holds, and both sides sleep on polled timing queries rather than
//! condition variables (portable across windowing back-ends with
//! inconsistent thread-wake semantics).
//!
//! **[`lock`]** — [`ExclusiveLock`](lock::ExclusiveLock): named mutual
//! exclusion with owner tracking, bounded wait, and timeout-forced breakage.
//!
//! **[`presenter`]** — [`FramePresenter`](presenter::FramePresenter): the
//! multi-slot buffer scheduler.
//!
//! **[`pump`]** — [`RenderPump`](pump::RenderPump): the budgeted
//! render-loop adapter and paint entry point.
//!
//! **[`time`]** — the process-wide monotonic [`SystemClock`](time::SystemClock).

pub mod lock;
pub mod presenter;
pub mod pump;
pub mod time;
