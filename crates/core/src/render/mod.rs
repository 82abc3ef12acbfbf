pub mod config;
pub mod grid;
#[cfg(feature = "svg")]
pub mod svg;
pub mod tooltip;
pub mod unit;

use crate::{
    boundary::Line,
    geo::GeoPoint,
    projection::{clip, to_cartesian, ProjectionKind},
    render::{
        config::RenderConfig,
        tooltip::{place_hover, place_pinned, Tooltip},
        unit::{Color3, Point2, Size},
    },
    timed,
    view::MapView,
};
use nalgebra::{Rotation3, Vector3};
use serde::Serialize;
use strum::{Display, EnumIter};
use validator::Validate;

/// Mercator stretches towards infinity at the poles, so boundary rings are
/// cut off at the usual web map limit to keep polar shapes closed.
const MERCATOR_LATITUDE_LIMIT: f64 = 85.051_128_78;

const FLAT_BACKGROUND: Color3 = Color3::new_int(11, 15, 21);
const FLAT_LAND: PathStyle = PathStyle {
    fill: Some(Color3::new_int(42, 46, 53)),
    stroke: Color3::new_int(30, 41, 59),
    stroke_width: 0.5,
    opacity: 1.0,
    dashed: false,
};
const GLOBE_BACKGROUND: Color3 = Color3::new_int(18, 23, 32);
const GLOBE_SHELL_FILL: Color3 = Color3::new_int(30, 41, 59);
const GLOBE_LAND: PathStyle = PathStyle {
    fill: Some(Color3::new_int(42, 52, 65)),
    stroke: Color3::new_int(54, 65, 85),
    stroke_width: 0.5,
    opacity: 0.8,
    dashed: false,
};
const GRID: PathStyle = PathStyle {
    fill: None,
    stroke: Color3::new_int(42, 46, 53),
    stroke_width: 0.5,
    opacity: 1.0,
    dashed: true,
};

pub const MARKER_COLOR: Color3 = Color3::new_int(156, 163, 175);
pub const SELECTED_MARKER_COLOR: Color3 = Color3::new_int(37, 99, 235);
pub const MARKER_STROKE: Color3 = Color3::new_int(255, 255, 255);

/// The layers of a frame, bottom to top
#[derive(Copy, Clone, Debug, Display, EnumIter, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Layer {
    Background,
    Boundaries,
    Grid,
    Markers,
    Tooltips,
}

/// How a set of paths is painted
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct PathStyle {
    /// Fill color for closed subpaths. `None` means stroke only.
    pub fill: Option<Color3>,
    pub stroke: Color3,
    pub stroke_width: f64,
    pub opacity: f64,
    pub dashed: bool,
}

/// A polyline in screen space. Closed subpaths are filled (if the style has
/// a fill), open ones are only stroked.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Subpath {
    pub points: Vec<Point2>,
    pub closed: bool,
}

/// One drawable shape, e.g. one country. Holes are extra closed subpaths,
/// filled with the even-odd rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Path {
    pub subpaths: Vec<Subpath>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathLayer {
    pub style: PathStyle,
    pub paths: Vec<Path>,
}

/// The circle behind the globe
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Disc {
    pub center: Point2,
    pub radius: f64,
    pub fill: Color3,
    pub stroke: Color3,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    Normal,
    Hovered,
    Selected,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Marker {
    pub station: String,
    pub position: Point2,
    pub radius: f64,
    pub fill: Color3,
    pub stroke: Color3,
    pub state: MarkerState,
}

/// A complete description of one rendered frame. Frames are recomputed from
/// scratch on every render and never updated in place.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderFrame {
    pub size: Size,
    pub kind: ProjectionKind,
    pub background: Color3,
    /// The globe body. `None` on the flat map.
    pub shell: Option<Disc>,
    /// Filled country shapes
    pub boundaries: PathLayer,
    /// Open boundary lines, drawn in the boundary layer on top of the shapes
    pub borders: PathLayer,
    pub grid: PathLayer,
    pub markers: Vec<Marker>,
    /// At most two: the pinned tooltip first, then the hover tooltip
    pub tooltips: Vec<Tooltip>,
}

impl RenderFrame {
    /// Find the marker for a station, if it was drawn
    pub fn marker(&self, station: &str) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.station == station)
    }

    /// Serialize the frame as pretty-printed JSON, for debugging
    pub fn to_json(&self) -> String {
        // Panics only if a frame type isn't serializable, which is a bug
        serde_json::to_string_pretty(self).expect("error serializing frame")
    }
}

/// A map renderer converts the current state of a [MapView] into a
/// [RenderFrame], which can then be written out in various formats. A
/// renderer is created with a particular [RenderConfig], and from there can
/// render any number of views any number of times.
///
/// Rendering is always a full redraw. Nothing is cached between frames, so
/// the output depends only on the view state at the time of the call.
///
/// ## Supported Formats
/// - SVG (feature `svg`)
/// - JSON
#[derive(Clone, Debug, Serialize)]
pub struct MapRenderer {
    render_config: RenderConfig,
}

impl MapRenderer {
    /// Initialize a new renderer with the given options. Returns an error if
    /// the render config is invalid.
    pub fn new(render_config: RenderConfig) -> anyhow::Result<Self> {
        render_config.validate()?;
        Ok(Self { render_config })
    }

    /// Get a reference to the config that this renderer uses
    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    /// Draw the current state of a view
    pub fn render(&self, view: &MapView) -> RenderFrame {
        timed!("Render", self.render_frame(view))
    }

    /// Render a view as an SVG document. Returns the SVG in a string.
    #[cfg(feature = "svg")]
    pub fn render_as_svg(&self, view: &MapView) -> String {
        svg::frame_to_svg(&self.render(view)).to_string()
    }

    fn render_frame(&self, view: &MapView) -> RenderFrame {
        let size = view.size();
        let projection = view.projection();
        let kind = projection.kind();
        let (background, land_style) = match kind {
            ProjectionKind::Flat => (FLAT_BACKGROUND, FLAT_LAND),
            ProjectionKind::Globe => (GLOBE_BACKGROUND, GLOBE_LAND),
        };
        let mut frame = RenderFrame {
            size,
            kind,
            background,
            shell: None,
            boundaries: PathLayer {
                style: land_style,
                paths: Vec::new(),
            },
            borders: PathLayer {
                style: PathStyle {
                    fill: None,
                    ..land_style
                },
                paths: Vec::new(),
            },
            grid: PathLayer {
                style: GRID,
                paths: Vec::new(),
            },
            markers: Vec::new(),
            tooltips: Vec::new(),
        };
        if size.is_empty() {
            return frame;
        }

        let geometry = Geometry::new(view);
        if kind == ProjectionKind::Globe {
            frame.shell = Some(Disc {
                center: projection.translate,
                radius: projection.scale,
                fill: GLOBE_SHELL_FILL,
                stroke: GRID.stroke,
            });
        }

        if self.render_config.show_boundaries {
            if let Some(boundaries) = view.boundaries() {
                frame.boundaries.paths.extend(
                    boundaries
                        .polygons
                        .iter()
                        .map(|polygon| Path {
                            subpaths: polygon
                                .rings
                                .iter()
                                .filter_map(|ring| geometry.ring(ring))
                                .collect(),
                        })
                        .filter(|path| !path.subpaths.is_empty()),
                );
                frame.borders.paths.extend(
                    boundaries
                        .lines
                        .iter()
                        .map(|line| Path {
                            subpaths: geometry.line(line),
                        })
                        .filter(|path| !path.subpaths.is_empty()),
                );
            }
        }

        if self.render_config.show_grid {
            frame.grid.paths = grid::graticule()
                .iter()
                .map(|line| Path {
                    subpaths: geometry.line(line),
                })
                .filter(|path| !path.subpaths.is_empty())
                .collect();
        }

        frame.markers = self.markers(view);
        frame.tooltips = self.tooltips(view);
        frame
    }

    fn markers(&self, view: &MapView) -> Vec<Marker> {
        let config = &self.render_config;
        let selection = view.selection();
        view.stations()
            .iter()
            .filter_map(|station| {
                let position = view.marker_position(station)?;
                let name = &station.name;
                let (state, radius, fill) = if selection.is_selected(name) {
                    (
                        MarkerState::Selected,
                        config.selected_marker_radius,
                        SELECTED_MARKER_COLOR,
                    )
                } else if selection.is_hovered(name) {
                    (
                        MarkerState::Hovered,
                        config.hovered_marker_radius,
                        MARKER_COLOR,
                    )
                } else {
                    (MarkerState::Normal, config.marker_radius, MARKER_COLOR)
                };
                Some(Marker {
                    station: station.name.clone(),
                    position,
                    radius,
                    fill,
                    stroke: MARKER_STROKE,
                    state,
                })
            })
            .collect()
    }

    fn tooltips(&self, view: &MapView) -> Vec<Tooltip> {
        let config = &self.render_config;
        let selection = view.selection();
        let size = view.size();
        let mut tooltips = Vec::with_capacity(2);

        let selected = selection
            .selected()
            .and_then(|name| view.stations().get(name));
        if let Some(station) = selected {
            if let Some(marker) = view.marker_position(station) {
                let offset = match view.projection().kind() {
                    ProjectionKind::Flat => config.flat_pinned_offset,
                    ProjectionKind::Globe => config.globe_pinned_offset,
                };
                tooltips
                    .push(place_pinned(config, size, station, marker, offset));
            }
        }

        if let Some(hover) = selection.hovered() {
            let station = view.stations().get(&hover.station);
            if let Some(station) = station {
                // The pinned tooltip already covers the selected station
                if !selection.is_selected(&station.name)
                    && view.marker_position(station).is_some()
                {
                    let pointer = hover.pointer;
                    tooltips.push(place_hover(config, size, station, pointer));
                }
            }
        }
        tooltips
    }
}

/// Converts geographic geometry to screen-space subpaths for one view. For
/// the globe, everything is rotated into view space and clipped to the
/// visible hemisphere first.
struct Geometry<'a> {
    view: &'a MapView,
    rotation: Option<Rotation3<f64>>,
}

impl<'a> Geometry<'a> {
    fn new(view: &'a MapView) -> Self {
        Self {
            view,
            rotation: view.projection().rotation().map(|r| r.matrix()),
        }
    }

    fn rotate(
        &self,
        rotation: &Rotation3<f64>,
        points: &[GeoPoint],
    ) -> Vec<Vector3<f64>> {
        points.iter().map(|point| rotation * to_cartesian(*point)).collect()
    }

    fn to_screen(
        &self,
        points: impl IntoIterator<Item = Vector3<f64>>,
    ) -> Vec<Point2> {
        let projection = self.view.projection();
        points
            .into_iter()
            .map(|point| projection.project_rotated(point))
            .collect()
    }

    /// Convert a closed ring. Returns `None` if none of it is drawn.
    fn ring(&self, ring: &[GeoPoint]) -> Option<Subpath> {
        let points = match &self.rotation {
            Some(rotation) => {
                self.to_screen(clip::clip_ring(&self.rotate(rotation, ring))?)
            }
            None => unwrap_longitudes(ring)
                .into_iter()
                .filter_map(|point| {
                    self.view.screen_position(GeoPoint::new(
                        point.longitude,
                        point.latitude.clamp(
                            -MERCATOR_LATITUDE_LIMIT,
                            MERCATOR_LATITUDE_LIMIT,
                        ),
                    ))
                })
                .collect(),
        };
        (points.len() >= 3).then(|| Subpath {
            points,
            closed: true,
        })
    }

    /// Convert an open line. The line is broken wherever it isn't drawable:
    /// behind the globe, at the poles of the flat map, or where it jumps
    /// across the antimeridian.
    fn line(&self, line: &Line) -> Vec<Subpath> {
        let runs: Vec<Vec<Point2>> = match &self.rotation {
            Some(rotation) => clip::clip_line(&self.rotate(rotation, line))
                .into_iter()
                .map(|run| self.to_screen(run))
                .collect(),
            None => {
                let mut runs = vec![Vec::new()];
                let mut previous: Option<GeoPoint> = None;
                for point in line {
                    let jumped = previous.map_or(false, |previous| {
                        (point.longitude - previous.longitude).abs() > 180.0
                    });
                    previous = Some(*point);
                    match self.view.screen_position(*point) {
                        Some(screen) if !jumped => {
                            if let Some(run) = runs.last_mut() {
                                run.push(screen);
                            }
                        }
                        Some(screen) => runs.push(vec![screen]),
                        None => runs.push(Vec::new()),
                    }
                }
                runs
            }
        };
        runs.into_iter()
            .filter(|run| run.len() >= 2)
            .map(|points| Subpath {
                points,
                closed: false,
            })
            .collect()
    }
}

/// Shift longitudes by multiples of 360° so that no two consecutive points
/// are more than 180° apart. Rings that cross the antimeridian then draw as
/// one shape that hangs off the edge of the map, instead of a streak across
/// the whole map.
fn unwrap_longitudes(ring: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut unwrapped: Vec<GeoPoint> = Vec::with_capacity(ring.len());
    for point in ring {
        let longitude = match unwrapped.last() {
            Some(previous) => {
                let delta = point.longitude - previous.longitude;
                previous.longitude + delta - 360.0 * (delta / 360.0).round()
            }
            None => point.longitude,
        };
        unwrapped.push(GeoPoint::new(longitude, point.latitude));
    }
    unwrapped
}
