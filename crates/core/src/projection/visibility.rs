//! Back-face culling for the globe. A point is visible when it lies on the
//! hemisphere facing the viewer, i.e. within 90° of the rotation's facing
//! center.

use crate::{geo::GeoPoint, projection::Rotation};

/// Slack on the 90° boundary. Points exactly on the horizon count as visible,
/// and this absorbs the rounding error of the trig involved so markers don't
/// flicker while the globe slowly rotates past them.
pub const HORIZON_EPSILON: f64 = 1e-9;

/// Is the point on the visible hemisphere of a globe with the given rotation?
/// The boundary is inclusive.
pub fn is_visible(point: GeoPoint, rotation: Rotation) -> bool {
    // cos(distance) >= cos(90°) = 0
    point.cos_angular_distance_to(rotation.facing_center()) >= -HORIZON_EPSILON
}
