// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`DiagSink`] and accumulates every event as an
//! owned [`PresentEvent`], in arrival order. The sink is shared between the
//! render thread and the paint path, so the buffer lives behind a mutex;
//! [`events`](RecorderSink::events) snapshots it for assertions and for
//! [`chrome::export`](crate::chrome::export).

use std::sync::{Mutex, PoisonError};

use tessera_core::diag::{
    BufferRecycled, BufferRetired, BufferShown, BufferWritten, DiagSink, LockBroken,
    LockContended, PresentEvent, StaleRelease,
};

/// A [`DiagSink`] that records every event.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Mutex<Vec<PresentEvent>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<PresentEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discards all recorded events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, event: PresentEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl DiagSink for RecorderSink {
    fn on_buffer_written(&self, e: &BufferWritten) {
        self.push(PresentEvent::Written(e.clone()));
    }

    fn on_buffer_shown(&self, e: &BufferShown) {
        self.push(PresentEvent::Shown(e.clone()));
    }

    fn on_buffer_retired(&self, e: &BufferRetired) {
        self.push(PresentEvent::Retired(e.clone()));
    }

    fn on_buffer_recycled(&self, e: &BufferRecycled) {
        self.push(PresentEvent::Recycled(e.clone()));
    }

    fn on_lock_contended(&self, e: &LockContended) {
        self.push(PresentEvent::LockContended(e.clone()));
    }

    fn on_lock_broken(&self, e: &LockBroken) {
        self.push(PresentEvent::LockBroken(e.clone()));
    }

    fn on_break_noticed(&self, e: &LockBroken) {
        self.push(PresentEvent::BreakNoticed(e.clone()));
    }

    fn on_stale_release(&self, e: &StaleRelease) {
        self.push(PresentEvent::StaleRelease(e.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::buffer::SlotId;
    use tessera_core::time::Moment;

    #[test]
    fn records_in_arrival_order() {
        let sink = RecorderSink::new();
        sink.on_buffer_recycled(&BufferRecycled {
            slot: SlotId(0),
            at: Moment(10),
        });
        sink.on_buffer_written(&BufferWritten {
            slot: SlotId(0),
            generation: 1,
            at: Moment(12),
            visible_at: Moment(12),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PresentEvent::Recycled(_)));
        assert!(matches!(events[1], PresentEvent::Written(_)));

        sink.clear();
        assert!(sink.events().is_empty());
    }
}
