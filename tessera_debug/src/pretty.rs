// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable diagnostic output.
//!
//! [`PrettyPrintSink`] implements [`DiagSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tessera_core::diag::{
    BufferRecycled, BufferRetired, BufferShown, BufferWritten, DiagSink, LockBroken,
    LockContended, StaleRelease,
};

/// Writes human-readable diagnostic lines to a
/// [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: Mutex<W>,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn writer(&self) -> MutexGuard<'_, W> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write> DiagSink for PrettyPrintSink<W> {
    fn on_buffer_written(&self, e: &BufferWritten) {
        let _ = writeln!(
            self.writer(),
            "[write] slot={} gen={} at={}ms visible={}ms",
            e.slot.0,
            e.generation,
            e.at.millis(),
            e.visible_at.millis(),
        );
    }

    fn on_buffer_shown(&self, e: &BufferShown) {
        let _ = writeln!(
            self.writer(),
            "[show] slot={} gen={} seen={} at={}ms",
            e.slot.0,
            e.generation,
            e.seen_count,
            e.at.millis(),
        );
    }

    fn on_buffer_retired(&self, e: &BufferRetired) {
        let _ = writeln!(
            self.writer(),
            "[retire] slot={} gen={} at={}ms",
            e.slot.0,
            e.generation,
            e.at.millis(),
        );
    }

    fn on_buffer_recycled(&self, e: &BufferRecycled) {
        let _ = writeln!(
            self.writer(),
            "[recycle] slot={} at={}ms",
            e.slot.0,
            e.at.millis(),
        );
    }

    fn on_lock_contended(&self, e: &LockContended) {
        let _ = writeln!(
            self.writer(),
            "[lock:contended] name={} waiter={}",
            e.lock_name, e.waiter,
        );
    }

    fn on_lock_broken(&self, e: &LockBroken) {
        let _ = writeln!(
            self.writer(),
            "[lock:broken] name={} breaker={} victim={} waited={}ms",
            e.lock_name,
            e.breaker,
            e.victim,
            e.waited.millis(),
        );
    }

    fn on_break_noticed(&self, e: &LockBroken) {
        let _ = writeln!(
            self.writer(),
            "[lock:noticed] name={} victim={} stolen-by={} after={}ms",
            e.lock_name,
            e.victim,
            e.breaker,
            e.waited.millis(),
        );
    }

    fn on_stale_release(&self, e: &StaleRelease) {
        let _ = writeln!(
            self.writer(),
            "[lock:stale-release] name={} releaser={}",
            e.lock_name, e.releaser,
        );
    }
}
