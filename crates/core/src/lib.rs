//! Skymap draws weather stations on an interactive world map, either as a
//! pannable, zoomable flat Mercator map or as an auto-rotating orthographic
//! globe. This crate holds the projection math, interaction state and a
//! renderer that turns a map's state into a complete frame of drawable
//! primitives. Presentation layers are implemented elsewhere.
//!
//! ```
//! use skymap::{
//!     GeoPoint, MapConfig, MapInput, MapRenderer, MapView, Size, Station,
//! };
//!
//! let input = MapInput {
//!     stations: vec![Station::new(
//!         "Berlin",
//!         "Germany",
//!         20.0,
//!         24.0,
//!         "mostly cloudy",
//!         GeoPoint::new(13.405, 52.52),
//!     )?],
//!     ..Default::default()
//! };
//! let size = Size::new(800.0, 400.0);
//! let view = MapView::new(MapConfig::default(), input, size)?;
//! let renderer = MapRenderer::new(Default::default())?;
//! let frame = renderer.render(&view);
//! assert_eq!(frame.markers.len(), 1);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! A [MapView] only changes in response to [MapEvent]s. To have events, timers
//! and boundary loading driven for you, mount the view in a [MapHost].
//!
//! See [MapConfig] and [RenderConfig] for details on how the map can be
//! customized.

mod config;
mod geo;
mod host;
mod selection;
mod util;
mod view;
mod viewport;

pub mod boundary;
pub mod projection;
pub mod render;

pub use crate::{
    boundary::{Boundaries, BoundaryCache},
    config::{FlatConfig, GlobeConfig, MapConfig, MapMode, ZoomConfig},
    geo::{GeoPoint, MapInput, Station, StationSet},
    host::{MapHandle, MapHost},
    projection::{ProjectionKind, ProjectionState, Rotation},
    render::{
        config::RenderConfig,
        unit::{Point2, Rect, Size},
        MapRenderer, RenderFrame,
    },
    selection::{Hover, InteractionSelection},
    util::range::NumRange,
    view::{MapEvent, MapView},
    viewport::{ViewportTransform, ZoomTransition},
};
