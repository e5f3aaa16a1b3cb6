// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host clock reads.
//!
//! The timeline origin is the first read in the process; only differences are
//! meaningful (see [`tessera_core::time`]).

use std::sync::OnceLock;
use std::time::Instant;

use tessera_core::clock::Clock;
use tessera_core::time::Moment;

static ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Returns the current monotonic moment in milliseconds.
#[must_use]
pub fn now() -> Moment {
    let origin = ORIGIN.get_or_init(Instant::now);
    let millis = origin.elapsed().as_millis();
    Moment(u64::try_from(millis).unwrap_or(u64::MAX))
}

/// The process-wide monotonic clock.
///
/// Inject this where a [`Clock`] is required outside of tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Moment {
        now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_monotonic_non_decreasing() {
        let first = now();
        let second = now();
        assert!(second >= first, "monotonic clock should not go backwards");
    }

    #[test]
    fn system_clock_reads_the_shared_origin() {
        let clock = SystemClock;
        let direct = now();
        let via_clock = clock.now();
        assert!(
            via_clock >= direct,
            "SystemClock must read the same timeline"
        );
    }
}
