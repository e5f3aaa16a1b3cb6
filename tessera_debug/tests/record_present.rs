// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording a live presenter session and exporting it.

use std::sync::Arc;

use tessera_core::clock::{Clock, ManualClock};
use tessera_core::diag::{DiagSink, PresentEvent};
use tessera_core::time::{Moment, Span};
use tessera_debug::chrome;
use tessera_debug::recorder::RecorderSink;
use tessera_present::presenter::{FramePresenter, PresenterConfig};

#[test]
fn a_frame_cycle_records_recycle_write_show_retire() {
    let clock = Arc::new(ManualClock::new(Moment(1000)));
    let sink = Arc::new(RecorderSink::new());
    let shared_clock: Arc<dyn Clock + Send + Sync> = clock.clone();
    let shared_sink: Arc<dyn DiagSink + Send + Sync> = sink.clone();
    let presenter = FramePresenter::new(PresenterConfig::desktop(), shared_clock, |_| 0_u32)
        .with_sink(shared_sink);

    let mut write = presenter.begin_write().expect("idle slot");
    *write.surface_mut() = 7;
    write.commit();

    clock.advance(Span(5));
    presenter.acquire_visible().expect("visible frame").retire();

    let events = sink.events();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            PresentEvent::Recycled(_) => "recycled",
            PresentEvent::Written(_) => "written",
            PresentEvent::Shown(_) => "shown",
            PresentEvent::Retired(_) => "retired",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["recycled", "written", "shown", "retired"]);

    let PresentEvent::Written(written) = &events[1] else {
        panic!("expected a written event");
    };
    assert_eq!(written.generation, 1);
    assert_eq!(written.at, Moment(1000));

    let PresentEvent::Shown(shown) = &events[2] else {
        panic!("expected a shown event");
    };
    assert_eq!(shown.at, Moment(1005));
    assert_eq!(shown.seen_count, 1);

    // The recorded session round-trips through the Chrome exporter.
    let mut bytes = Vec::new();
    chrome::export(&events, &mut bytes).expect("export failed");
    let doc: serde_json::Value = serde_json::from_slice(&bytes).expect("valid JSON");
    assert_eq!(doc.as_array().map(Vec::len), Some(4));
}
