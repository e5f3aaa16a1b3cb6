// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic millisecond timeline.
//!
//! [`Moment`] is a point on a monotonic millisecond timeline and [`Span`] is a
//! length of time on it. Every timing constant in the presentation subsystem
//! (write throttle, rewrite cooldown, lock wait limit, repaint deadlines) is
//! millisecond-grained, so the timeline is too — there is no tick/timebase
//! conversion layer.
//!
//! The zero point is whatever the injected [`Clock`](crate::clock::Clock)
//! chooses; only differences are meaningful.

use core::fmt;
use core::ops::{Add, Sub};
use core::time::Duration;

/// A point in time expressed as milliseconds on a monotonic timeline.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Moment(pub u64);

impl Moment {
    /// The timeline origin.
    pub const ZERO: Self = Self(0);

    /// Returns the raw millisecond value.
    #[inline]
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.0
    }

    /// Returns the span between `self` and an earlier moment, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_since(self, earlier: Self) -> Span {
        Span(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a span.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, span: Span) -> Option<Self> {
        match self.0.checked_add(span.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Saturating addition of a span.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, span: Span) -> Self {
        Self(self.0.saturating_add(span.0))
    }
}

impl Add<Span> for Moment {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Span) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Span> for Moment {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Span) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sub for Moment {
    type Output = Span;

    #[inline]
    fn sub(self, rhs: Self) -> Span {
        Span(self.0 - rhs.0)
    }
}

impl fmt::Debug for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Moment({}ms)", self.0)
    }
}

/// A length of time in milliseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span(pub u64);

impl Span {
    /// A zero-length span.
    pub const ZERO: Self = Self(0);

    /// Creates a span from whole seconds.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    /// Returns the raw millisecond value.
    #[inline]
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.0
    }

    /// Returns whether this span is zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Returns the smaller of two spans.
    #[inline]
    #[must_use]
    pub const fn min(self, rhs: Self) -> Self {
        if self.0 <= rhs.0 { self } else { rhs }
    }

    /// Converts this span to a [`core::time::Duration`] for sleeping.
    #[inline]
    #[must_use]
    pub const fn to_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Add for Span {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Span {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}ms)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moment_span_arithmetic() {
        let t = Moment(1000);
        let d = Span(250);
        assert_eq!((t + d).millis(), 1250);
        assert_eq!((t - d).millis(), 750);
        assert_eq!(Moment(1250) - t, Span(250));
    }

    #[test]
    fn saturating_since_clamps_to_zero() {
        let t = Moment(100);
        assert_eq!(t.saturating_since(Moment(400)), Span::ZERO);
        assert_eq!(t.saturating_since(Moment(40)), Span(60));
    }

    #[test]
    fn checked_add_detects_overflow() {
        assert_eq!(Moment(10).checked_add(Span(5)), Some(Moment(15)));
        assert_eq!(Moment(u64::MAX).checked_add(Span(1)), None);
        assert_eq!(Moment(u64::MAX).saturating_add(Span(1)), Moment(u64::MAX));
    }

    #[test]
    fn span_helpers() {
        assert_eq!(Span::from_secs(30), Span(30_000));
        assert!(Span::ZERO.is_zero());
        assert!(!Span(1).is_zero());
        assert_eq!(Span(100).min(Span(70)), Span(70));
        assert_eq!(Span(20).saturating_sub(Span(50)), Span::ZERO);
        assert_eq!(Span(75).to_duration(), Duration::from_millis(75));
    }
}
