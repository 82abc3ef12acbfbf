//! Tooltip content and placement. There are two kinds of tooltip:
//!
//! - **Hover**: follows the pointer, offset up and to the right of it
//! - **Pinned**: sits above the selected station's marker, and moves with the
//!   marker as the map is panned, zoomed or rotated
//!
//! Both kinds are kept inside the container by flipping (hover) or flipping
//! and shifting (pinned).

use crate::{
    geo::Station,
    render::{
        config::RenderConfig,
        unit::{Point2, Rect, Size},
    },
};
use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TooltipKind {
    Hover,
    Pinned,
}

/// A placed tooltip, ready to draw
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tooltip {
    pub kind: TooltipKind,
    pub station: String,
    /// The point the tooltip is attached to: the pointer for hover tooltips,
    /// the marker center for pinned ones
    pub anchor: Point2,
    /// The background box
    pub rect: Rect,
    pub lines: Vec<String>,
    /// Baseline start of the first line. Each following line is
    /// `line_height` further down.
    pub text_origin: Point2,
    pub line_height: f64,
    pub font_size: f64,
}

impl Tooltip {
    fn new(
        config: &RenderConfig,
        kind: TooltipKind,
        station: &Station,
        anchor: Point2,
        rect: Rect,
        lines: Vec<String>,
    ) -> Self {
        Self {
            kind,
            station: station.name.clone(),
            anchor,
            text_origin: Point2::new(
                rect.x + config.tooltip_padding,
                rect.y + config.tooltip_padding + config.font_size,
            ),
            line_height: config.line_height,
            font_size: config.font_size,
            rect,
            lines,
        }
    }
}

/// The text lines shown for a station
pub fn tooltip_lines(station: &Station) -> Vec<String> {
    vec![
        format!("{}, {}", station.name, station.country),
        format!("{}° {}", station.temperature, station.condition_label),
        format!("{}% humidity", station.humidity_percent),
    ]
}

/// Estimate how big a box the given lines need
fn content_size(config: &RenderConfig, lines: &[String]) -> Size {
    let longest = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    Size::new(
        longest as f64 * config.font_size * config.glyph_width_ratio
            + 2.0 * config.tooltip_padding,
        lines.len() as f64 * config.line_height + 2.0 * config.tooltip_padding,
    )
}

/// Place a tooltip next to the pointer. It normally sits to the right of and
/// above the pointer; it flips to the left if it would cross the right edge,
/// and below if it would cross the top edge.
pub fn place_hover(
    config: &RenderConfig,
    container: Size,
    station: &Station,
    pointer: Point2,
) -> Tooltip {
    let lines = tooltip_lines(station);
    let size = content_size(config, &lines);
    let offset = config.hover_tooltip_offset;

    let mut x = pointer.x + offset.x;
    if x + size.width > container.width {
        x = pointer.x - offset.x - size.width;
    }
    let mut y = pointer.y - offset.y;
    if y < 0.0 {
        y = pointer.y + offset.x;
    }

    let rect = Rect::new(x, y, size.width, size.height);
    Tooltip::new(config, TooltipKind::Hover, station, pointer, rect, lines)
}

/// Place the tooltip for the selected station. The box is horizontally
/// centered on the marker with its top edge `offset` pixels above the marker.
/// If that would cross the top of the container, the box goes below the
/// marker instead. Horizontally it's shifted as needed to stay inside the
/// container.
pub fn place_pinned(
    config: &RenderConfig,
    container: Size,
    station: &Station,
    marker: Point2,
    offset: f64,
) -> Tooltip {
    let lines = tooltip_lines(station);
    let size = content_size(config, &lines);

    let mut y = marker.y - offset;
    if y < 0.0 {
        y = marker.y + config.selected_marker_radius + config.tooltip_padding;
    }
    let max_x = (container.width - size.width).max(0.0);
    let x = (marker.x - size.width / 2.0).clamp(0.0, max_x);

    let rect = Rect::new(x, y, size.width, size.height);
    Tooltip::new(config, TooltipKind::Pinned, station, marker, rect, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use assert_approx_eq::assert_approx_eq;

    const CONTAINER: Size = Size::new(800.0, 400.0);

    fn berlin() -> Station {
        Station::new(
            "Berlin",
            "Germany",
            20.0,
            24.0,
            "mostly cloudy",
            GeoPoint::new(13.405, 52.52),
        )
        .unwrap()
    }

    #[test]
    fn test_lines() {
        assert_eq!(
            tooltip_lines(&berlin()),
            vec!["Berlin, Germany", "20° mostly cloudy", "24% humidity"]
        );
    }

    #[test]
    fn test_box_size() {
        let config = RenderConfig::default();
        let size = content_size(&config, &tooltip_lines(&berlin()));
        // 17 characters in the longest line
        assert_approx_eq!(size.width, 17.0 * 12.0 * 0.6 + 16.0);
        assert_approx_eq!(size.height, 3.0 * 16.0 + 16.0);
    }

    #[test]
    fn test_hover_placement() {
        let config = RenderConfig::default();
        let pointer = Point2::new(100.0, 200.0);
        let tooltip = place_hover(&config, CONTAINER, &berlin(), pointer);
        assert_eq!(tooltip.kind, TooltipKind::Hover);
        assert_approx_eq!(tooltip.rect.x, 115.0);
        assert_approx_eq!(tooltip.rect.y, 130.0);
        assert!(tooltip.rect.fits_in(CONTAINER));
        assert_eq!(tooltip.text_origin, Point2::new(123.0, 150.0));
    }

    #[test]
    fn test_hover_flips() {
        let config = RenderConfig::default();
        // Near the top-right corner: flips left and down
        let pointer = Point2::new(790.0, 20.0);
        let tooltip = place_hover(&config, CONTAINER, &berlin(), pointer);
        assert_approx_eq!(tooltip.rect.right(), 775.0);
        assert_approx_eq!(tooltip.rect.y, 35.0);
        assert!(tooltip.rect.fits_in(CONTAINER));
    }

    #[test]
    fn test_pinned_placement() {
        let config = RenderConfig::default();
        let marker = Point2::new(400.0, 150.0);
        let tooltip = place_pinned(&config, CONTAINER, &berlin(), marker, 60.0);
        assert_eq!(tooltip.anchor, marker);
        assert_approx_eq!(tooltip.rect.y, 90.0);
        assert_approx_eq!(tooltip.rect.x + tooltip.rect.width / 2.0, 400.0);
    }

    #[test]
    fn test_pinned_stays_inside() {
        let config = RenderConfig::default();
        // Top-left corner: flips below the marker and shifts right
        let marker = Point2::new(5.0, 30.0);
        let tooltip = place_pinned(&config, CONTAINER, &berlin(), marker, 60.0);
        assert!(tooltip.rect.y > marker.y);
        assert_approx_eq!(tooltip.rect.x, 0.0);
        assert!(tooltip.rect.fits_in(CONTAINER));
    }
}
