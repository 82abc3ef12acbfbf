//! Conversion from geographic coordinates to screen space. There are two
//! projections:
//!
//! - **Flat**: cylindrical Mercator. Parameterized by a scale, a geographic
//!   center point, and a screen translation. The center point lands on the
//!   translation point.
//! - **Globe**: orthographic projection of a rotated sphere. Parameterized by a
//!   scale (the globe radius in pixels), a three-axis [Rotation], and a screen
//!   translation (the center of the globe disc).
//!
//! Both are pure functions of `(point, state)`, so the renderer can call them
//! as often as it likes without caching.

pub mod clip;
pub mod visibility;

use crate::{
    config::MapConfig,
    geo::GeoPoint,
    render::unit::{Point2, Size},
    util::range::NumRange,
};
use derive_more::Display;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;

/// A three-axis rotation of the globe, in degrees. `lambda` spins the globe
/// around its polar axis, `phi` tilts it towards/away from the viewer, and
/// `gamma` rolls it around the view axis. The point facing the viewer is
/// `(-lambda, -phi)`.
#[derive(
    Copy, Clone, Debug, Default, Display, PartialEq, Serialize, Deserialize,
)]
#[display(fmt = "[{}, {}, {}]", lambda, phi, gamma)]
pub struct Rotation {
    pub lambda: f64,
    pub phi: f64,
    pub gamma: f64,
}

impl Rotation {
    /// Rotation longitudes are kept in this range
    pub const LAMBDA_RANGE: NumRange = NumRange::new(0.0, 360.0);

    pub const fn new(lambda: f64, phi: f64, gamma: f64) -> Self {
        Self { lambda, phi, gamma }
    }

    /// Spin the globe by `step` degrees of longitude, wrapping modulo 360°.
    pub fn advance(self, step: f64) -> Self {
        Self {
            lambda: Self::LAMBDA_RANGE.wrap(self.lambda + step),
            ..self
        }
    }

    /// The geographic point at the center of the visible hemisphere
    pub fn facing_center(self) -> GeoPoint {
        GeoPoint::new(GeoPoint::LONGITUDE_RANGE.wrap(-self.lambda), -self.phi)
    }

    /// The rotation as a matrix on unit-sphere cartesian coordinates. Applies
    /// the longitude spin first, then the tilt, then the roll. After rotation,
    /// +x points at the viewer, +y to the right and +z up.
    pub fn matrix(self) -> Rotation3<f64> {
        let spin = Rotation3::from_axis_angle(
            &Vector3::z_axis(),
            self.lambda.to_radians(),
        );
        let tilt = Rotation3::from_axis_angle(
            &Vector3::y_axis(),
            -self.phi.to_radians(),
        );
        let roll = Rotation3::from_axis_angle(
            &Vector3::x_axis(),
            self.gamma.to_radians(),
        );
        roll * tilt * spin
    }
}

/// Which projection a [ProjectionState] uses
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    Flat,
    Globe,
}

/// The projection-specific half of a [ProjectionState]: a center point for
/// the flat map, a rotation for the globe.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Center(GeoPoint),
    Rotation(Rotation),
}

/// The live projection parameters for one map view. This is the single source
/// of truth for every coordinate conversion during a render pass.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionState {
    /// Pixels per radian (flat) or globe radius in pixels (globe)
    pub scale: f64,
    /// Screen position of the projection origin
    pub translate: Point2,
    pub orientation: Orientation,
}

impl ProjectionState {
    pub fn flat(scale: f64, translate: Point2, center: GeoPoint) -> Self {
        Self {
            scale,
            translate,
            orientation: Orientation::Center(center),
        }
    }

    pub fn globe(scale: f64, translate: Point2, rotation: Rotation) -> Self {
        Self {
            scale,
            translate,
            orientation: Orientation::Rotation(rotation),
        }
    }

    /// Build the projection for a container of the given size. Scale and
    /// translation are derived from the size alone, so the same orientation
    /// always maps to the same relative position regardless of how many
    /// resizes happened in between.
    pub fn fit(
        config: &MapConfig,
        size: Size,
        orientation: Orientation,
    ) -> Self {
        let scale = match orientation {
            Orientation::Center(_) => size.width / config.flat.scale_divisor,
            Orientation::Rotation(_) => {
                size.width.min(size.height) * config.globe.radius_fraction
            }
        };
        Self {
            scale,
            translate: size.center(),
            orientation,
        }
    }

    pub fn kind(&self) -> ProjectionKind {
        match self.orientation {
            Orientation::Center(_) => ProjectionKind::Flat,
            Orientation::Rotation(_) => ProjectionKind::Globe,
        }
    }

    /// The globe rotation, if this is a globe projection
    pub fn rotation(&self) -> Option<Rotation> {
        match self.orientation {
            Orientation::Center(_) => None,
            Orientation::Rotation(rotation) => Some(rotation),
        }
    }

    /// Convert a geographic point to screen space. Returns `None` only when
    /// the projection is undefined for the point (the poles, under Mercator).
    /// Globe projection is total: points on the far hemisphere still get a
    /// coordinate, so check [visibility::is_visible] before drawing them.
    pub fn project(&self, point: GeoPoint) -> Option<Point2> {
        match self.orientation {
            Orientation::Center(center) => {
                if point.latitude.abs() >= 90.0 {
                    return None;
                }
                let dx = (point.longitude - center.longitude).to_radians();
                let dy =
                    mercator_y(point.latitude) - mercator_y(center.latitude);
                let x = self.translate.x + self.scale * dx;
                let y = self.translate.y - self.scale * dy;
                let projected = Point2::new(x, y);
                projected.is_finite().then(|| projected)
            }
            Orientation::Rotation(rotation) => {
                let rotated = rotation.matrix() * to_cartesian(point);
                Some(self.project_rotated(rotated))
            }
        }
    }

    /// Map a point that has already been rotated into view space (see
    /// [Rotation::matrix]) onto the screen. Only meaningful for globes.
    pub(crate) fn project_rotated(&self, rotated: Vector3<f64>) -> Point2 {
        Point2::new(
            self.translate.x + self.scale * rotated.y,
            self.translate.y - self.scale * rotated.z,
        )
    }
}

/// Free-function form of [ProjectionState::project]
pub fn project(point: GeoPoint, state: &ProjectionState) -> Option<Point2> {
    state.project(point)
}

/// Mercator's vertical coordinate for a latitude in degrees, before scaling
fn mercator_y(latitude: f64) -> f64 {
    (FRAC_PI_4 + latitude.to_radians() / 2.0).tan().ln()
}

/// Convert a geographic point to a unit vector. +x points at (0°, 0°), +y at
/// (90°E, 0°) and +z at the north pole.
pub(crate) fn to_cartesian(point: GeoPoint) -> Vector3<f64> {
    let lon = point.longitude.to_radians();
    let lat = point.latitude.to_radians();
    Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_flat_center_maps_to_translate() {
        let state = ProjectionState::flat(
            100.0,
            Point2::new(400.0, 200.0),
            GeoPoint::new(0.0, 20.0),
        );
        let center = state.project(GeoPoint::new(0.0, 20.0)).unwrap();
        assert_approx_eq!(center.x, 400.0);
        assert_approx_eq!(center.y, 200.0);

        // One radian east is exactly `scale` pixels right
        let east = state
            .project(GeoPoint::new(1.0_f64.to_degrees(), 20.0))
            .unwrap();
        assert_approx_eq!(east.x, 500.0);

        // North is up
        let north = state.project(GeoPoint::new(0.0, 40.0)).unwrap();
        assert!(north.y < 200.0);
    }

    #[test]
    fn test_flat_poles_undefined() {
        let state = ProjectionState::flat(
            100.0,
            Point2::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.0),
        );
        assert_eq!(state.project(GeoPoint::new(10.0, 90.0)), None);
        assert_eq!(state.project(GeoPoint::new(10.0, -90.0)), None);
        assert!(state.project(GeoPoint::new(10.0, 89.9)).is_some());
    }

    #[test]
    fn test_globe_facing_center_maps_to_translate() {
        let rotation = Rotation::new(23.0, -10.0, 0.0);
        let state =
            ProjectionState::globe(140.0, Point2::new(300.0, 250.0), rotation);
        let center = state.project(rotation.facing_center()).unwrap();
        assert_approx_eq!(center.x, 300.0);
        assert_approx_eq!(center.y, 250.0);
    }

    #[test]
    fn test_globe_unrotated() {
        let state = ProjectionState::globe(
            100.0,
            Point2::new(0.0, 0.0),
            Rotation::default(),
        );
        // 90°E sits on the right edge of the disc, the north pole on top
        let east = state.project(GeoPoint::new(90.0, 0.0)).unwrap();
        assert_approx_eq!(east.x, 100.0);
        assert_approx_eq!(east.y, 0.0);
        let north = state.project(GeoPoint::new(0.0, 90.0)).unwrap();
        assert_approx_eq!(north.x, 0.0);
        assert_approx_eq!(north.y, -100.0);
    }

    #[test]
    fn test_globe_roll() {
        // Rolling 90° moves the north pole from the top of the disc to a side
        let state = ProjectionState::globe(
            100.0,
            Point2::new(0.0, 0.0),
            Rotation::new(0.0, 0.0, 90.0),
        );
        let north = state.project(GeoPoint::new(0.0, 90.0)).unwrap();
        assert_approx_eq!(north.y, 0.0);
        assert_approx_eq!(north.x.abs(), 100.0);
    }

    #[test]
    fn test_rotation_advance_wraps() {
        let rotation = Rotation::new(359.75, -10.0, 0.0).advance(0.5);
        assert_approx_eq!(rotation.lambda, 0.25);
        assert_approx_eq!(rotation.phi, -10.0);
    }

    #[test]
    fn test_fit() {
        let config = MapConfig::default();
        let state = ProjectionState::fit(
            &config,
            Size::new(600.0, 400.0),
            Orientation::Center(config.flat.center),
        );
        assert_approx_eq!(state.scale, 100.0);
        assert_eq!(state.translate, Point2::new(300.0, 200.0));
        assert_eq!(state.kind(), ProjectionKind::Flat);
    }
}
