// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quarter-turn canvas rotation.
//!
//! A game canvas may be logically rotated by 0/90/180/270 degrees (seating a
//! player on another side of the table) while the underlying window surface
//! stays unrotated. This module converts coordinates between the two spaces,
//! consistently for drawing and for mouse/touch input:
//!
//! - **forward** — physical window space → rotated canvas space. Input events
//!   arrive in physical coordinates and are forwarded before hit testing.
//! - **inverse** — rotated canvas space → physical window space. Drawing code
//!   works entirely in rotated space; the inverse mapping is what the
//!   drawing-context transform applies.
//!
//! With `W`/`H` the physical canvas width/height:
//!
//! | turns | forward (x, y) →      | inverse (x, y) →      |
//! |-------|-----------------------|-----------------------|
//! | 0     | (x, y)                | (x, y)                |
//! | 1     | (y, W − x)            | (W − y, x)            |
//! | 2     | (W − x, H − y)        | (W − x, H − y)        |
//! | 3     | (H − y, x)            | (y, H − x)            |
//!
//! The inverse is exact: `inverse(forward(p)) == p` for every turn and every
//! coordinate. Rotated bounds keep the physical origin and swap width/height
//! on odd turns.

use core::f64::consts::FRAC_PI_2;

use kurbo::{Affine, Rect};

/// Physical extent of a canvas in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl CanvasSize {
    /// Creates a size from a width and height.
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Returns this size with width and height exchanged.
    #[inline]
    #[must_use]
    pub const fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// The drawing-context boundary used by [`CanvasRotation::apply`] and
/// [`CanvasRotation::undo`].
///
/// The core only requires translation, rotation, and a "currently rotated"
/// flag; the concrete context (a GPU canvas, a native graphics handle, a test
/// double) is opaque. Both operations compose onto the context's current
/// transform in call order.
pub trait RotatableContext {
    /// Appends a translation by `(dx, dy)` to the current transform.
    fn translate(&mut self, dx: f64, dy: f64);

    /// Appends a counter-clockwise rotation by `radians` to the current
    /// transform.
    fn rotate_radians(&mut self, radians: f64);

    /// Returns whether a canvas rotation is currently applied.
    fn rotated(&self) -> bool;

    /// Records whether a canvas rotation is currently applied.
    fn set_rotated(&mut self, rotated: bool);
}

/// Current canvas rotation in quarter turns.
///
/// The stored value is always in `0..=3`; [`set_turns`](Self::set_turns)
/// masks its argument, so relative adjustments like `turns + 1` or
/// `turns - 1` need no range handling at call sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CanvasRotation {
    turns: u8,
}

impl CanvasRotation {
    /// The unrotated state.
    pub const IDENTITY: Self = Self { turns: 0 };

    /// Creates a rotation of `turns & 3` quarter turns.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "masked to 0..=3 before the cast"
    )]
    pub const fn new(turns: i32) -> Self {
        Self {
            turns: (turns & 3) as u8,
        }
    }

    /// Stores `turns & 3`. Negative values mask the same way (`-1` ≡ 3).
    #[inline]
    pub const fn set_turns(&mut self, turns: i32) {
        *self = Self::new(turns);
    }

    /// Returns the stored quarter-turn count (0–3).
    #[inline]
    #[must_use]
    pub const fn turns(self) -> u8 {
        self.turns
    }

    /// Returns whether width and height swap under this rotation.
    #[inline]
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        self.turns & 1 == 1
    }

    /// Returns the rotation angle in radians (`turns * 90°`).
    #[inline]
    #[must_use]
    pub fn radians(self) -> f64 {
        f64::from(self.turns) * FRAC_PI_2
    }

    /// Returns the canvas extent as seen from rotated space.
    #[inline]
    #[must_use]
    pub const fn rotated_size(self, size: CanvasSize) -> CanvasSize {
        if self.swaps_axes() { size.transposed() } else { size }
    }

    /// Returns `bounds` as seen from rotated space: same origin, width and
    /// height exchanged on odd turns.
    #[must_use]
    pub fn rotated_bounds(self, bounds: Rect) -> Rect {
        if self.swaps_axes() {
            Rect::from_origin_size((bounds.x0, bounds.y0), (bounds.height(), bounds.width()))
        } else {
            bounds
        }
    }

    /// Maps a physical-space x coordinate into rotated space.
    #[inline]
    #[must_use]
    pub const fn forward_x(self, x: i32, y: i32, size: CanvasSize) -> i32 {
        match self.turns {
            0 => x,
            1 => y,
            2 => size.width - x,
            _ => size.height - y,
        }
    }

    /// Maps a physical-space y coordinate into rotated space.
    #[inline]
    #[must_use]
    pub const fn forward_y(self, x: i32, y: i32, size: CanvasSize) -> i32 {
        match self.turns {
            0 => y,
            1 => size.width - x,
            2 => size.height - y,
            _ => x,
        }
    }

    /// Maps a rotated-space x coordinate back into physical space.
    #[inline]
    #[must_use]
    pub const fn inverse_x(self, x: i32, y: i32, size: CanvasSize) -> i32 {
        match self.turns {
            0 => x,
            1 => size.width - y,
            2 => size.width - x,
            _ => y,
        }
    }

    /// Maps a rotated-space y coordinate back into physical space.
    #[inline]
    #[must_use]
    pub const fn inverse_y(self, x: i32, y: i32, size: CanvasSize) -> i32 {
        match self.turns {
            0 => y,
            1 => x,
            2 => size.height - y,
            _ => size.height - x,
        }
    }

    /// Returns the affine transform that maps rotated-space drawing
    /// coordinates onto the physical surface.
    ///
    /// Built from exact coefficients (quarter-turn rotations are 0/±1
    /// matrices), so the result agrees with
    /// [`inverse_x`](Self::inverse_x)/[`inverse_y`](Self::inverse_y) without
    /// floating-point error.
    #[must_use]
    pub fn affine(self, size: CanvasSize) -> Affine {
        let w = f64::from(size.width);
        let h = f64::from(size.height);
        match self.turns {
            0 => Affine::IDENTITY,
            1 => Affine::new([0.0, 1.0, -1.0, 0.0, w, 0.0]),
            2 => Affine::new([-1.0, 0.0, 0.0, -1.0, w, h]),
            _ => Affine::new([0.0, -1.0, 1.0, 0.0, 0.0, h]),
        }
    }

    /// The per-turn translation component of [`affine`](Self::affine).
    const fn translation(self, size: CanvasSize) -> (i32, i32) {
        match self.turns {
            0 => (0, 0),
            1 => (size.width, 0),
            2 => (size.width, size.height),
            _ => (0, size.height),
        }
    }

    /// Pushes this rotation onto a drawing context so subsequent drawing can
    /// work entirely in rotated space.
    ///
    /// A zero-turn rotation still flips the context's rotated flag so that
    /// apply/undo pairs stay balanced regardless of the current setting.
    ///
    /// # Panics
    ///
    /// Panics if the context is already rotated; double application is a
    /// programming error, not a recoverable condition.
    pub fn apply<C: RotatableContext + ?Sized>(self, ctx: &mut C, size: CanvasSize) {
        assert!(
            !ctx.rotated(),
            "CanvasRotation::apply on an already-rotated context"
        );
        let (tx, ty) = self.translation(size);
        if self.turns != 0 {
            ctx.translate(f64::from(tx), f64::from(ty));
            ctx.rotate_radians(self.radians());
        }
        ctx.set_rotated(true);
    }

    /// Pops a rotation previously pushed by [`apply`](Self::apply).
    ///
    /// # Panics
    ///
    /// Panics if the context is not rotated; an unmatched undo is a
    /// programming error.
    pub fn undo<C: RotatableContext + ?Sized>(self, ctx: &mut C, size: CanvasSize) {
        assert!(
            ctx.rotated(),
            "CanvasRotation::undo on a context that is not rotated"
        );
        if self.turns != 0 {
            let (tx, ty) = self.translation(size);
            ctx.rotate_radians(-self.radians());
            ctx.translate(f64::from(-tx), f64::from(-ty));
        }
        ctx.set_rotated(false);
    }
}
