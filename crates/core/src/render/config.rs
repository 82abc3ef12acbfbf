use crate::render::unit::Point2;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Configuration specific to visually rendering a map. These options have no
/// bearing on projection or interaction; the same [MapView](crate::MapView)
/// can be rendered by any number of renderers with different configs.
///
/// All sizes are in screen pixels and are not affected by the flat map's
/// zoom level.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_marker_radii"))]
pub struct RenderConfig {
    /// Radius of a marker that is neither selected nor hovered
    #[validate(range(min = 0.5, max = 100.0))]
    pub marker_radius: f64,

    /// Radius of the marker under the pointer
    #[validate(range(min = 0.5, max = 100.0))]
    pub hovered_marker_radius: f64,

    /// Radius of the selected station's marker. Selection wins over hover.
    #[validate(range(min = 0.5, max = 100.0))]
    pub selected_marker_radius: f64,

    /// Tooltip text size. Tooltip boxes are sized from this, using an
    /// estimated average glyph width.
    #[validate(range(min = 1.0, max = 200.0))]
    pub font_size: f64,

    /// Vertical distance between tooltip text baselines
    #[validate(range(min = 1.0, max = 300.0))]
    pub line_height: f64,

    /// Average glyph width as a fraction of the font size
    #[validate(range(min = 0.1, max = 2.0))]
    pub glyph_width_ratio: f64,

    /// Space between tooltip text and the edge of its box
    #[validate(range(min = 0.0, max = 100.0))]
    pub tooltip_padding: f64,

    /// Where the hover tooltip's top-left corner sits relative to the
    /// pointer. Positive x is to the right, positive y is **up**.
    pub hover_tooltip_offset: Point2,

    /// How far above the marker the top of the pinned (selected) tooltip
    /// sits on the flat map
    #[validate(range(min = 0.0))]
    pub flat_pinned_offset: f64,

    /// How far above the marker the top of the pinned (selected) tooltip
    /// sits on the globe
    #[validate(range(min = 0.0))]
    pub globe_pinned_offset: f64,

    /// Draw the latitude/longitude grid?
    pub show_grid: bool,

    /// Draw country boundaries once they've loaded?
    pub show_boundaries: bool,
}

fn validate_marker_radii(config: &RenderConfig) -> Result<(), ValidationError> {
    if config.marker_radius <= config.hovered_marker_radius
        && config.hovered_marker_radius <= config.selected_marker_radius
    {
        Ok(())
    } else {
        Err(ValidationError::new("marker_radii_out_of_order"))
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            marker_radius: 4.0,
            hovered_marker_radius: 5.0,
            selected_marker_radius: 6.0,
            font_size: 12.0,
            line_height: 16.0,
            glyph_width_ratio: 0.6,
            tooltip_padding: 8.0,
            hover_tooltip_offset: Point2::new(15.0, 70.0),
            flat_pinned_offset: 60.0,
            globe_pinned_offset: 80.0,
            show_grid: true,
            show_boundaries: true,
        }
    }
}
