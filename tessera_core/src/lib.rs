// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and frame-buffer lifecycle for double-buffered board-game
//! presentation.
//!
//! `tessera_core` provides the platform-free half of the presentation
//! subsystem: a millisecond time model, the injected clock contract, the
//! quarter-turn canvas rotation transform, and the per-slot frame-buffer
//! state machine. It is `no_std` compatible (with `alloc`); everything that
//! needs threads or a real clock lives in `tessera_present`.
//!
//! # Architecture
//!
//! The render thread and the host paint path cooperate over one or more
//! buffer slots without a frame queue:
//!
//! ```text
//!   render thread                          host paint callback
//!       │                                        │
//!       ▼                                        ▼
//!   claim idle slot ──► draw (rotated      promote + read the freshest
//!   via CanvasRotation::apply) ──►         visible slot, then release it
//!   FrameBuffer::set_written               into its rewrite cooldown
//!       ▲                                        │
//!       └───── cooldown elapses, slot idle ◄─────┘
//! ```
//!
//! **[`time`]** — [`Moment`](time::Moment)/[`Span`](time::Span) millisecond
//! newtypes; all scheduling arithmetic is explicit.
//!
//! **[`clock`]** — the [`Clock`](clock::Clock) contract and
//! [`ManualClock`](clock::ManualClock) for deterministic tests.
//!
//! **[`rotate`]** — physical ↔ rotated coordinate mapping for 0/90/180/270°
//! canvas rotation, shared by drawing and input handling.
//!
//! **[`buffer`]** — the [`FrameBuffer`](buffer::FrameBuffer) lifecycle state
//! machine with polling timing queries.
//!
//! **[`diag`]** — [`DiagSink`](diag::DiagSink) trait and event types for
//! presentation diagnostics.
//!
//! # Crate features
//!
//! - `std` (disabled by default): enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod buffer;
pub mod clock;
pub mod diag;
pub mod rotate;
pub mod time;
