//! Driving a [MapView] from real events and timers. A [MapHost] owns one view
//! and runs it on the current thread: it applies events as they arrive, runs
//! the auto-rotation and zoom animation timers, waits on the boundary load,
//! and emits a freshly rendered frame every time the view changes.

use crate::{
    boundary::{BoundaryCache, BoundarySource},
    render::{unit::Size, MapRenderer, RenderFrame},
    view::{MapEvent, MapView},
};
use anyhow::anyhow;
use log::{debug, error, info, trace};
use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant, Interval, MissedTickBehavior},
};

/// The caller's end of a mounted map. Dropping the handle unmounts the map,
/// the same as [MapHandle::unmount].
#[derive(Clone, Debug)]
pub struct MapHandle {
    events: mpsc::UnboundedSender<MapEvent>,
}

impl MapHandle {
    /// Queue an event for the map. Fails only if the map has already been
    /// torn down.
    pub fn send(&self, event: MapEvent) -> anyhow::Result<()> {
        self.events
            .send(event)
            .map_err(|err| anyhow!("map is no longer mounted: {}", err.0))
    }

    /// Tear down the map. Pending events queued before this are still
    /// applied.
    pub fn unmount(self) {
        // If the host is already gone there's nothing left to tear down
        let _ = self.events.send(MapEvent::Unmount);
    }
}

/// A mounted map, waiting to be run. See [MapHost::mount].
pub struct MapHost<S> {
    view: MapView,
    renderer: MapRenderer,
    cache: BoundaryCache,
    source: S,
    events: mpsc::UnboundedReceiver<MapEvent>,
    size: watch::Receiver<Size>,
    frames: mpsc::UnboundedSender<RenderFrame>,
}

impl<S: BoundarySource> MapHost<S> {
    /// Mount a view. The container size is observed through `size`; every
    /// value published there after mount is applied as a resize. Boundaries
    /// are loaded through the shared `cache` using `source`.
    ///
    /// Returns the handle for sending events, the stream of rendered frames,
    /// and the host itself, which does nothing until [MapHost::run] is
    /// awaited.
    pub fn mount(
        view: MapView,
        renderer: MapRenderer,
        cache: BoundaryCache,
        source: S,
        size: watch::Receiver<Size>,
    ) -> (MapHandle, mpsc::UnboundedReceiver<RenderFrame>, Self) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let host = Self {
            view,
            renderer,
            cache,
            source,
            events: events_rx,
            size,
            frames: frames_tx,
        };
        (MapHandle { events: events_tx }, frames_rx, host)
    }

    /// Run the map until it's unmounted, either by an
    /// [Unmount](MapEvent::Unmount) event or by every [MapHandle] being
    /// dropped. Returns the final state of the view.
    ///
    /// One frame is rendered at mount, then one more after each change.
    pub async fn run(self) -> MapView {
        let Self {
            view,
            renderer,
            cache,
            source,
            mut events,
            mut size,
            frames,
        } = self;
        let mut presenter = Presenter {
            view,
            renderer,
            frames,
        };

        let url = presenter.view.config().boundary_url.clone();
        let object = presenter.view.config().boundary_object.clone();
        let load = cache.load(&source, &url, &object);
        tokio::pin!(load);
        let mut loading = true;
        let mut watching_size = true;

        let mut ticker =
            new_interval(presenter.view.config().globe.tick_interval());
        let mut animation: Option<Animation> = None;
        let mut rotating = presenter.view.is_rotating();

        presenter.render();
        loop {
            tokio::select! {
                event = events.recv() => {
                    let event = event.unwrap_or(MapEvent::Unmount);
                    presenter.apply(event);
                    if !presenter.view.is_mounted() {
                        break;
                    }
                }
                changed = size.changed(), if watching_size => match changed {
                    Ok(()) => {
                        let new_size = *size.borrow_and_update();
                        presenter.apply(MapEvent::Resize(new_size));
                    }
                    Err(_) => {
                        debug!("Size source closed, no longer watching");
                        watching_size = false;
                    }
                },
                _ = ticker.tick(), if rotating => {
                    presenter.apply(MapEvent::Tick);
                }
                dt = next_frame(&mut animation), if animation.is_some() => {
                    presenter.apply(MapEvent::Frame(dt));
                }
                result = &mut load, if loading => {
                    loading = false;
                    match result {
                        Ok(boundaries) => presenter
                            .apply(MapEvent::BoundariesLoaded(boundaries)),
                        Err(err) => {
                            error!("Failed to load boundaries: {:#}", err)
                        }
                    }
                }
            }

            // Timers follow the view's state. A resumed rotation waits a full
            // interval before its first step.
            let now_rotating = presenter.view.is_rotating();
            if now_rotating && !rotating {
                ticker.reset();
            }
            rotating = now_rotating;

            match (&animation, presenter.view.is_animating()) {
                (None, true) => {
                    animation = Some(Animation::start(
                        presenter.view.config().zoom.frame_interval(),
                    ))
                }
                (Some(_), false) => animation = None,
                _ => {}
            }
        }

        // Release the subscriptions before handing the view back
        drop(size);
        drop(ticker);
        info!("Map host stopped");
        presenter.view
    }
}

/// The part of the host that owns the view and emits frames
struct Presenter {
    view: MapView,
    renderer: MapRenderer,
    frames: mpsc::UnboundedSender<RenderFrame>,
}

impl Presenter {
    fn apply(&mut self, event: MapEvent) {
        trace!("Applying {}", event);
        if self.view.handle(event) {
            self.render();
        }
    }

    fn render(&self) {
        let frame = self.renderer.render(&self.view);
        if self.frames.send(frame).is_err() {
            trace!("Frame receiver is gone, dropping frame");
        }
    }
}

/// Frame timing for an in-flight zoom transition
struct Animation {
    interval: Interval,
    last_frame: Instant,
}

impl Animation {
    fn start(period: std::time::Duration) -> Self {
        Self {
            interval: new_interval(period),
            last_frame: Instant::now(),
        }
    }
}

/// An interval whose first tick is one full period from now
fn new_interval(period: std::time::Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Wait for the next animation frame, returning the time since the last one.
/// Only polled while an animation is running.
async fn next_frame(animation: &mut Option<Animation>) -> std::time::Duration {
    match animation {
        Some(animation) => {
            let now = animation.interval.tick().await;
            let dt = now.saturating_duration_since(animation.last_frame);
            animation.last_frame = now;
            dt
        }
        None => std::future::pending().await,
    }
}
