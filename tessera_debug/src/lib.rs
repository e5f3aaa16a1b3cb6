// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for tessera
//! presentation diagnostics.
//!
//! This crate provides [`DiagSink`](tessera_core::diag::DiagSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`recorder::RecorderSink`] — accumulates owned
//!   [`PresentEvent`](tessera_core::diag::PresentEvent) records for test
//!   assertions and export.
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from
//!   recorded events.

pub mod chrome;
pub mod pretty;
pub mod recorder;
