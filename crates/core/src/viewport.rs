//! The pan/zoom transform that sits on top of the flat map projection. The
//! transform is an affine map `p' = k·p + t` applied to already-projected
//! screen points, so the base projection never has to change while the user
//! drags or zooms.

use crate::{
    render::unit::{Point2, Size},
    util::{ease_cubic_in_out, range::NumRange},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A uniform scale `k` followed by a translation `(tx, ty)`, in screen pixels.
#[derive(Copy, Clone, Debug, Display, PartialEq, Serialize, Deserialize)]
#[display(fmt = "translate({}, {}) scale({})", tx, ty, k)]
pub struct ViewportTransform {
    pub k: f64,
    pub tx: f64,
    pub ty: f64,
}

impl ViewportTransform {
    /// The transform that leaves every point where it is
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0);

    pub const fn new(k: f64, tx: f64, ty: f64) -> Self {
        Self { k, tx, ty }
    }

    /// Map a point from base projection space to the screen
    pub fn apply(&self, point: Point2) -> Point2 {
        Point2::new(point.x * self.k + self.tx, point.y * self.k + self.ty)
    }

    /// Map a screen point back to base projection space
    pub fn invert(&self, point: Point2) -> Point2 {
        Point2::new((point.x - self.tx) / self.k, (point.y - self.ty) / self.k)
    }

    /// Shift the view by a delta in screen pixels
    pub fn pan(self, delta: Point2) -> Self {
        Self {
            tx: self.tx + delta.x,
            ty: self.ty + delta.y,
            ..self
        }
    }

    /// Change the scale to `k`, keeping whatever is under `anchor` (a screen
    /// point) in place. `k` is clamped to `extent` first.
    pub fn zoom_about(self, k: f64, anchor: Point2, extent: NumRange) -> Self {
        let k = extent.clamp(k);
        let ratio = k / self.k;
        Self {
            k,
            tx: anchor.x - (anchor.x - self.tx) * ratio,
            ty: anchor.y - (anchor.y - self.ty) * ratio,
        }
    }

    /// Keep the content from being panned out of view. Content bounds are the
    /// container itself, grown by `margin` (a fraction of the container size)
    /// on every side. If the visible area is larger than the bounds on an axis,
    /// the content is centered on that axis; otherwise the translation is
    /// pushed back just enough to keep the bounds covering the viewport.
    pub fn constrain(self, size: Size, margin: f64) -> Self {
        let bounds_min =
            Point2::new(-margin * size.width, -margin * size.height);
        let bounds_max = Point2::new(
            (1.0 + margin) * size.width,
            (1.0 + margin) * size.height,
        );
        let top_left = self.invert(Point2::new(0.0, 0.0));
        let bottom_right = self.invert(Point2::new(size.width, size.height));

        let shift = |d0: f64, d1: f64| {
            if d1 > d0 {
                (d0 + d1) / 2.0
            } else if d0 < 0.0 {
                d0
            } else {
                d1.max(0.0)
            }
        };
        let dx =
            shift(top_left.x - bounds_min.x, bottom_right.x - bounds_max.x);
        let dy =
            shift(top_left.y - bounds_min.y, bottom_right.y - bounds_max.y);
        Self {
            tx: self.tx + self.k * dx,
            ty: self.ty + self.k * dy,
            ..self
        }
    }

    /// Carry the transform over to a resized container. Translation is scaled
    /// with the container on each axis so that resizing back to the old size
    /// restores the old transform. A constrained transform stays constrained.
    pub fn rescale(self, old: Size, new: Size) -> Self {
        let ratio =
            |new: f64, old: f64| if old > 0.0 { new / old } else { 1.0 };
        Self {
            tx: self.tx * ratio(new.width, old.width),
            ty: self.ty * ratio(new.height, old.height),
            ..self
        }
    }

    /// Componentwise interpolation between two transforms, `t` in `[0, 1]`
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let lerp = |a: f64, b: f64| NumRange::new(a, b).lerp(t);
        Self {
            k: lerp(self.k, other.k),
            tx: lerp(self.tx, other.tx),
            ty: lerp(self.ty, other.ty),
        }
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An in-flight animated change between two viewport transforms. The target is
/// computed up front with all clamps applied, so the final frame is exactly
/// what an instant jump would have produced.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoomTransition {
    from: ViewportTransform,
    to: ViewportTransform,
    elapsed: Duration,
    duration: Duration,
}

impl ZoomTransition {
    pub fn new(
        from: ViewportTransform,
        to: ViewportTransform,
        duration: Duration,
    ) -> Self {
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    /// Where the transition ends up
    pub fn target(&self) -> ViewportTransform {
        self.to
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advance the animation clock and get the transform for this frame
    pub fn advance(&mut self, dt: Duration) -> ViewportTransform {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.current()
    }

    /// The transform at the current point in the animation
    pub fn current(&self) -> ViewportTransform {
        if self.is_done() {
            return self.to;
        }
        let progress = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from.lerp(self.to, ease_cubic_in_out(progress))
    }
}
