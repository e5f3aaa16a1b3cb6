// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] writes recorded [`PresentEvent`]s as [Chrome Trace Event
//! Format][spec] JSON, suitable for loading into `chrome://tracing` or
//! [Perfetto](https://ui.perfetto.dev/). Buffer slots map to trace `pid`s so
//! each slot's lifecycle renders as its own track; lock events render as
//! global instants.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use tessera_core::diag::PresentEvent;
use tessera_core::time::Moment;

/// Timestamps are milliseconds; the trace format wants microseconds.
fn millis_to_us(at: Moment) -> u64 {
    at.millis().saturating_mul(1000)
}

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects.
pub fn export(events: &[PresentEvent], writer: &mut dyn Write) -> io::Result<()> {
    let mut out: Vec<Value> = Vec::with_capacity(events.len());

    for event in events {
        match event {
            PresentEvent::Written(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Written",
                    "cat": "Buffer",
                    "ts": millis_to_us(e.at),
                    "pid": e.slot.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "generation": e.generation,
                        "visible_at_us": millis_to_us(e.visible_at),
                    }
                }));
            }
            PresentEvent::Shown(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Shown",
                    "cat": "Buffer",
                    "ts": millis_to_us(e.at),
                    "pid": e.slot.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "generation": e.generation,
                        "seen_count": e.seen_count,
                    }
                }));
            }
            PresentEvent::Retired(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Retired",
                    "cat": "Buffer",
                    "ts": millis_to_us(e.at),
                    "pid": e.slot.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "generation": e.generation,
                    }
                }));
            }
            PresentEvent::Recycled(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Recycled",
                    "cat": "Buffer",
                    "ts": millis_to_us(e.at),
                    "pid": e.slot.0,
                    "tid": 0,
                    "s": "p",
                    "args": {}
                }));
            }
            PresentEvent::LockContended(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "LockContended",
                    "cat": "Lock",
                    "ts": 0,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "lock": e.lock_name,
                        "waiter": e.waiter,
                    }
                }));
            }
            PresentEvent::LockBroken(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "LockBroken",
                    "cat": "Lock",
                    "ts": 0,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "lock": e.lock_name,
                        "breaker": e.breaker,
                        "victim": e.victim,
                        "waited_ms": e.waited.millis(),
                    }
                }));
            }
            PresentEvent::BreakNoticed(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "BreakNoticed",
                    "cat": "Lock",
                    "ts": 0,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "lock": e.lock_name,
                        "victim": e.victim,
                        "breaker": e.breaker,
                    }
                }));
            }
            PresentEvent::StaleRelease(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "StaleRelease",
                    "cat": "Lock",
                    "ts": 0,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "lock": e.lock_name,
                        "releaser": e.releaser,
                    }
                }));
            }
        }
    }

    let doc = Value::Array(out);
    serde_json::to_writer(&mut *writer, &doc)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::buffer::SlotId;
    use tessera_core::diag::{BufferShown, BufferWritten};

    #[test]
    fn export_produces_a_trace_array() {
        let events = vec![
            PresentEvent::Written(BufferWritten {
                slot: SlotId(0),
                generation: 1,
                at: Moment(100),
                visible_at: Moment(170),
            }),
            PresentEvent::Shown(BufferShown {
                slot: SlotId(0),
                generation: 1,
                seen_count: 1,
                at: Moment(180),
            }),
        ];

        let mut bytes = Vec::new();
        export(&events, &mut bytes).expect("export failed");
        let doc: Value = serde_json::from_slice(&bytes).expect("valid JSON");

        let array = doc.as_array().expect("top-level array");
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["name"], "Written");
        assert_eq!(array[0]["ts"], 100_000);
        assert_eq!(array[1]["name"], "Shown");
        assert_eq!(array[1]["args"]["generation"], 1);
    }
}
