use crate::{
    boundary::Boundaries,
    config::{MapConfig, MapMode},
    geo::{GeoPoint, MapInput, Station, StationSet},
    projection::{
        visibility::is_visible, Orientation, ProjectionKind, ProjectionState,
        Rotation,
    },
    render::unit::{Point2, Size},
    selection::InteractionSelection,
    viewport::{ViewportTransform, ZoomTransition},
};
use anyhow::{bail, Context};
use derive_more::Display;
use log::{debug, info};
use std::{rc::Rc, time::Duration};
use validator::Validate;

/// Everything that can happen to a mounted map. Pointer positions are in
/// container pixels, with the origin at the top-left corner.
#[derive(Clone, Debug, Display)]
pub enum MapEvent {
    /// A button was pressed. Starts a drag on the flat map.
    #[display(fmt = "PointerDown{}", _0)]
    PointerDown(Point2),
    /// The pointer moved. Drags the flat map if a drag is in progress, and
    /// updates the hovered station either way.
    #[display(fmt = "PointerMove{}", _0)]
    PointerMove(Point2),
    #[display(fmt = "PointerUp{}", _0)]
    PointerUp(Point2),
    /// The pointer left the container. Ends any drag and clears the hover.
    PointerLeave,
    /// A wheel scroll, zooming the flat map about the pointer
    #[display(fmt = "Wheel({}, {})", delta_y, at)]
    Wheel { delta_y: f64, at: Point2 },
    /// Zoom-in button. Animated, about the container center.
    ZoomIn,
    /// Zoom-out button. Animated, about the container center.
    ZoomOut,
    #[display(fmt = "Resize({})", _0)]
    Resize(Size),
    /// One step of globe auto-rotation
    Tick,
    /// One frame of an in-flight zoom transition, with the time since the
    /// previous frame
    #[display(fmt = "Frame({:?})", _0)]
    Frame(Duration),
    /// The boundary dataset finished loading
    #[display(fmt = "BoundariesLoaded")]
    BoundariesLoaded(Rc<Boundaries>),
    /// Change the selected station, or clear the selection with `None`
    #[display(fmt = "Select({:?})", _0)]
    Select(Option<String>),
    /// The map was shown or hidden. Hidden globes don't rotate.
    #[display(fmt = "VisibilityChanged({})", _0)]
    VisibilityChanged(bool),
    /// Tear down the view. Every event after this is ignored.
    Unmount,
}

/// The state of one mounted map: its stations, projection, viewport and
/// interaction state. A view is mutated only through [MapView::handle], which
/// reports whether the change needs a redraw.
///
/// All coordinate lookups for rendering and hit testing go through the view,
/// so the projection state it holds is the single source of truth for a
/// render pass.
#[derive(Clone, Debug)]
pub struct MapView {
    config: MapConfig,
    stations: StationSet,
    size: Size,
    projection: ProjectionState,
    /// Pan/zoom on top of the projection. Always the identity on globes.
    viewport: ViewportTransform,
    selection: InteractionSelection,
    boundaries: Option<Rc<Boundaries>>,
    /// Last pointer position of the current drag
    drag: Option<Point2>,
    /// Last pointer position inside the container
    pointer: Option<Point2>,
    transition: Option<ZoomTransition>,
    hidden: bool,
    mounted: bool,
}

impl MapView {
    /// Mount a new view. The config and every station are validated first;
    /// validation failures come back as [validator::ValidationErrors].
    pub fn new(
        config: MapConfig,
        input: MapInput,
        size: Size,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let stations = StationSet::new(input.stations)?;
        let selected = stations.resolve(input.selected.as_deref());

        let orientation = match config.mode {
            MapMode::Flat => {
                let center = input.center.unwrap_or(config.flat.center);
                center.validate().context("invalid map center")?;
                Orientation::Center(center)
            }
            MapMode::Globe => {
                let initial = config.globe.initial_rotation;
                let lambda = match input.rotation_start {
                    Some(lambda) if !lambda.is_finite() => {
                        bail!("invalid rotation start {}", lambda)
                    }
                    Some(lambda) => Rotation::LAMBDA_RANGE.wrap(lambda),
                    None => Rotation::LAMBDA_RANGE.wrap(initial.lambda),
                };
                Orientation::Rotation(Rotation { lambda, ..initial })
            }
        };

        info!(
            "Mounting {} map with {} stations at {}",
            config.mode,
            stations.len(),
            size
        );
        Ok(Self {
            projection: ProjectionState::fit(&config, size, orientation),
            config,
            stations,
            size,
            viewport: ViewportTransform::IDENTITY,
            selection: InteractionSelection::new(selected),
            boundaries: None,
            drag: None,
            pointer: None,
            transition: None,
            hidden: false,
            mounted: true,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn stations(&self) -> &StationSet {
        &self.stations
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn projection(&self) -> &ProjectionState {
        &self.projection
    }

    pub fn viewport(&self) -> ViewportTransform {
        self.viewport
    }

    pub fn selection(&self) -> &InteractionSelection {
        &self.selection
    }

    /// Boundary geometry, if it has loaded yet
    pub fn boundaries(&self) -> Option<&Boundaries> {
        self.boundaries.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Should the auto-rotation timer be running right now?
    pub fn is_rotating(&self) -> bool {
        self.mounted
            && !self.hidden
            && self.projection.kind() == ProjectionKind::Globe
    }

    /// Is a zoom transition waiting for more frames?
    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Convert a geographic point to its final screen position, with the
    /// viewport transform applied. Doesn't check globe visibility.
    pub fn screen_position(&self, point: GeoPoint) -> Option<Point2> {
        self.projection
            .project(point)
            .map(|projected| self.viewport.apply(projected))
    }

    /// Where a station's marker is drawn, or `None` if the marker isn't drawn
    /// at all, either because it's on the far side of the globe or because
    /// the projection is undefined there.
    pub fn marker_position(&self, station: &Station) -> Option<Point2> {
        if let Some(rotation) = self.projection.rotation() {
            if !is_visible(station.location, rotation) {
                return None;
            }
        }
        self.screen_position(station.location)
    }

    /// Find the drawn marker closest to a screen point, if any is within the
    /// configured hover radius
    pub fn hit_test(&self, pointer: Point2) -> Option<&Station> {
        self.stations
            .iter()
            .filter_map(|station| {
                let distance =
                    self.marker_position(station)?.distance_to(pointer);
                (distance <= self.config.hover_radius)
                    .then(|| (station, distance))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(station, _)| station)
    }

    /// Apply an event. Returns `true` if the view changed in a way that needs
    /// a redraw.
    pub fn handle(&mut self, event: MapEvent) -> bool {
        if !self.mounted {
            debug!("Ignoring {} on unmounted view", event);
            return false;
        }

        let flat = self.projection.kind() == ProjectionKind::Flat;
        let pointer_event = matches!(
            event,
            MapEvent::PointerMove(_) | MapEvent::PointerLeave
        );
        let changed = match event {
            MapEvent::PointerDown(pointer) => {
                if flat {
                    self.drag = Some(pointer);
                }
                false
            }
            MapEvent::PointerMove(pointer) => {
                let mut changed = false;
                if let Some(last) = self.drag {
                    self.drag = Some(pointer);
                    self.transition = None;
                    let viewport = self.viewport.pan(pointer - last);
                    changed |= self.set_viewport(viewport);
                }
                self.pointer = Some(pointer);
                changed | self.refresh_hover()
            }
            MapEvent::PointerUp(_) => {
                self.drag = None;
                false
            }
            MapEvent::PointerLeave => {
                self.drag = None;
                self.pointer = None;
                self.selection.clear_hover()
            }
            MapEvent::Wheel { delta_y, at } if flat => {
                self.transition = None;
                let zoom = self.config.zoom;
                let k = self.viewport.k
                    * 2.0_f64.powf(-delta_y * zoom.wheel_sensitivity);
                let viewport = self.viewport.zoom_about(k, at, zoom.extent());
                self.set_viewport(viewport)
            }
            MapEvent::ZoomIn if flat => self.zoom_by(self.config.zoom.step_in),
            MapEvent::ZoomOut if flat => {
                self.zoom_by(self.config.zoom.step_out)
            }
            MapEvent::Wheel { .. } | MapEvent::ZoomIn | MapEvent::ZoomOut => {
                false
            }
            MapEvent::Resize(size) => self.resize(size),
            MapEvent::Tick => match self.projection.orientation {
                Orientation::Rotation(rotation) if !self.hidden => {
                    self.projection.orientation = Orientation::Rotation(
                        rotation.advance(self.config.globe.rotation_step),
                    );
                    true
                }
                _ => false,
            },
            MapEvent::Frame(dt) => match &mut self.transition {
                Some(transition) => {
                    self.viewport = transition.advance(dt);
                    if transition.is_done() {
                        self.transition = None;
                    }
                    true
                }
                None => false,
            },
            MapEvent::BoundariesLoaded(boundaries) => {
                self.boundaries = Some(boundaries);
                true
            }
            MapEvent::Select(None) => self.selection.select(None),
            MapEvent::Select(Some(name)) => {
                match self.stations.resolve(Some(&name)) {
                    Some(name) => self.selection.select(Some(name)),
                    None => false,
                }
            }
            MapEvent::VisibilityChanged(visible) => {
                self.hidden = !visible;
                false
            }
            MapEvent::Unmount => {
                info!("Unmounting map");
                self.mounted = false;
                self.drag = None;
                self.pointer = None;
                self.transition = None;
                false
            }
        };

        // Markers can move out from under (or into) a still pointer
        if changed && !pointer_event {
            self.refresh_hover();
        }
        if changed {
            debug!(
                "View changed: projection {:?}, viewport {}",
                self.projection.orientation, self.viewport
            );
        }
        changed
    }

    /// Re-run the hit test at the last pointer position. Returns whether the
    /// hover changed.
    fn refresh_hover(&mut self) -> bool {
        match self.pointer {
            Some(pointer) => {
                let hovered =
                    self.hit_test(pointer).map(|station| station.name.clone());
                self.selection.hover(hovered, pointer)
            }
            None => false,
        }
    }

    /// Replace the viewport with a constrained version of the given
    /// transform. Returns whether it changed.
    fn set_viewport(&mut self, viewport: ViewportTransform) -> bool {
        let viewport = viewport.constrain(self.size, self.config.pan_margin);
        if viewport == self.viewport {
            false
        } else {
            self.viewport = viewport;
            true
        }
    }

    /// Start an animated zoom about the container center. Repeated presses
    /// stack on the target of the running transition. Nothing is redrawn
    /// until the first frame.
    fn zoom_by(&mut self, factor: f64) -> bool {
        let zoom = self.config.zoom;
        let base = self
            .transition
            .map_or(self.viewport, |transition| transition.target());
        let target = base
            .zoom_about(base.k * factor, self.size.center(), zoom.extent())
            .constrain(self.size, self.config.pan_margin);

        if zoom.transition_ms == 0 {
            self.transition = None;
            return self.set_viewport(target);
        }
        if target == self.viewport {
            self.transition = None;
        } else {
            self.transition = Some(ZoomTransition::new(
                self.viewport,
                target,
                zoom.transition(),
            ));
        }
        false
    }

    fn resize(&mut self, size: Size) -> bool {
        if size == self.size {
            return false;
        }
        // Finish any transition so we only have one transform to carry over
        if let Some(transition) = self.transition.take() {
            self.viewport = transition.target();
        }
        debug!("Resizing from {} to {}", self.size, size);
        self.viewport = self.viewport.rescale(self.size, size);
        self.projection = ProjectionState::fit(
            &self.config,
            size,
            self.projection.orientation,
        );
        self.size = size;
        true
    }
}
