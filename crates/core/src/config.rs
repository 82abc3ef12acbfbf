use crate::{geo::GeoPoint, projection::Rotation, util::range::NumRange};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

/// Configuration that defines how a map view behaves: which projection it
/// uses, its starting parameters, and the limits on user interaction. Two
/// views mounted with the same config, stations, and container size will
/// always produce identical frames for the same event sequence.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MapConfig {
    /// Which projection to present the map in
    pub mode: MapMode,

    /// Parameters for the flat (Mercator) map
    #[validate]
    pub flat: FlatConfig,

    /// Parameters for the globe (orthographic) map
    #[validate]
    pub globe: GlobeConfig,

    /// Zoom limits and step sizes. Only applies to the flat map.
    #[validate]
    pub zoom: ZoomConfig,

    /// How far past the content bounds the flat map can be panned, as a
    /// fraction of the container size on each side. 0.5 means you can drag
    /// the map until its edge is half a container away from the viewport
    /// edge, and no further.
    #[validate(range(min = 0.0, max = 10.0))]
    pub pan_margin: f64,

    /// How close the pointer has to be to a marker's center, in pixels, for
    /// that marker to count as hovered
    #[validate(range(min = 0.0))]
    pub hover_radius: f64,

    /// URL of the country boundary topology. Loaded once and shared between
    /// every view that uses the same URL.
    #[validate(length(min = 1))]
    pub boundary_url: String,

    /// Name of the topology object holding the country shapes. If the
    /// dataset has no object by this name, every object is drawn.
    #[validate(length(min = 1))]
    pub boundary_object: String,
}

/// The projection a map view is presented in.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MapMode {
    /// Cylindrical Mercator projection with pan and zoom
    Flat,
    /// Orthographic projection of the globe with auto-rotation
    Globe,
}

/// Parameters for the flat map projection.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FlatConfig {
    /// The projection scale is the container width divided by this value. A
    /// divisor of 6 fits the whole world (minus the poles) in a 2:1 container.
    #[validate(range(min = 0.1))]
    pub scale_divisor: f64,

    /// The geographic point that sits in the middle of the container before
    /// any panning
    #[validate]
    pub center: GeoPoint,
}

/// Parameters for the globe projection and its auto-rotation.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GlobeConfig {
    /// Globe radius as a fraction of the smaller container dimension
    #[validate(range(min = 0.01, max = 1.0))]
    pub radius_fraction: f64,

    /// Rotation of the globe at mount time
    pub initial_rotation: Rotation,

    /// Degrees of longitude added to the rotation on every tick
    #[validate(range(min = 0.0, max = 360.0))]
    pub rotation_step: f64,

    /// Time between rotation ticks, in milliseconds
    #[validate(range(min = 1))]
    pub tick_interval_ms: u64,
}

/// Zoom behavior for the flat map. Scales here are multipliers on top of the
/// base projection scale, so 1.0 is the "unzoomed" view.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_zoom_extent"))]
pub struct ZoomConfig {
    /// The furthest the user can zoom out
    #[validate(range(min = 0.01))]
    pub min_scale: f64,

    /// The furthest the user can zoom in
    #[validate(range(min = 0.01))]
    pub max_scale: f64,

    /// Multiplier applied by the zoom-in button
    #[validate(range(min = 1.0))]
    pub step_in: f64,

    /// Multiplier applied by the zoom-out button
    #[validate(range(min = 0.01, max = 1.0))]
    pub step_out: f64,

    /// How strongly wheel deltas zoom. Each wheel event multiplies the scale
    /// by `2^(-delta * sensitivity)`.
    #[validate(range(min = 0.0))]
    pub wheel_sensitivity: f64,

    /// Length of the animated transition for button zooms, in milliseconds.
    /// Zero means the zoom applies instantly.
    pub transition_ms: u64,

    /// Time between animation frames while a transition is running, in
    /// milliseconds
    #[validate(range(min = 1))]
    pub frame_interval_ms: u64,
}

impl MapConfig {
    /// Where the world-atlas 110m country boundaries live
    pub const DEFAULT_BOUNDARY_URL: &'static str =
        "https://unpkg.com/world-atlas@2.0.2/countries-110m.json";
    pub const DEFAULT_BOUNDARY_OBJECT: &'static str = "countries";
}

impl GlobeConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl ZoomConfig {
    /// The allowed range of viewport scale factors
    pub fn extent(&self) -> NumRange {
        NumRange::new(self.min_scale, self.max_scale)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

fn validate_zoom_extent(zoom: &ZoomConfig) -> Result<(), ValidationError> {
    if zoom.min_scale <= zoom.max_scale {
        Ok(())
    } else {
        Err(ValidationError::new("min_scale_above_max_scale"))
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            mode: MapMode::Flat,
            flat: FlatConfig::default(),
            globe: GlobeConfig::default(),
            zoom: ZoomConfig::default(),
            pan_margin: 0.5,
            hover_radius: 8.0,
            boundary_url: Self::DEFAULT_BOUNDARY_URL.to_owned(),
            boundary_object: Self::DEFAULT_BOUNDARY_OBJECT.to_owned(),
        }
    }
}

impl Default for FlatConfig {
    fn default() -> Self {
        Self {
            scale_divisor: 6.0,
            center: GeoPoint::new(0.0, 20.0),
        }
    }
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            radius_fraction: 0.35,
            initial_rotation: Rotation::new(23.0, -10.0, 0.0),
            rotation_step: 0.5,
            tick_interval_ms: 100,
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.7,
            max_scale: 3.0,
            step_in: 1.3,
            step_out: 0.7,
            wheel_sensitivity: 0.002,
            transition_ms: 300,
            frame_interval_ms: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{assert_de_tokens, assert_de_tokens_error, Token};

    #[test]
    fn test_deserialize_mode() {
        assert_de_tokens(
            &MapMode::Flat,
            &[Token::UnitVariant {
                name: "MapMode",
                variant: "flat",
            }],
        );
        assert_de_tokens(
            &MapMode::Globe,
            &[Token::UnitVariant {
                name: "MapMode",
                variant: "globe",
            }],
        );
        assert_de_tokens_error::<MapMode>(
            &[Token::UnitVariant {
                name: "MapMode",
                variant: "cube",
            }],
            "unknown variant `cube`, expected `flat` or `globe`",
        );
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("globe".parse::<MapMode>().unwrap(), MapMode::Globe);
        assert_eq!(MapMode::Flat.to_string(), "flat");
    }

    #[test]
    fn test_defaults_valid() {
        let config = MapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.zoom.extent(), NumRange::new(0.7, 3.0));
        assert_eq!(config.globe.tick_interval(), Duration::from_millis(100));
    }
}
