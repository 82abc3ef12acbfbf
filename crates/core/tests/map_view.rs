use assert_approx_eq::assert_approx_eq;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use skymap::{
    GeoPoint, MapConfig, MapEvent, MapInput, MapMode, MapRenderer, MapView,
    Point2, Size, Station, ZoomConfig,
};
use std::time::Duration;

const SIZE: Size = Size::new(800.0, 400.0);

fn stations() -> Vec<Station> {
    [
        ("Berlin", "Germany", 13.405, 52.52),
        ("Tokyo", "Japan", 139.6917, 35.6895),
        ("Nairobi", "Kenya", 36.8219, -1.2921),
        ("Lima", "Peru", -77.0428, -12.0464),
        ("Anchorage", "United States", -149.9003, 61.2181),
    ]
    .iter()
    .map(|&(name, country, longitude, latitude)| {
        Station::new(
            name,
            country,
            18.0,
            50.0,
            "partly cloudy",
            GeoPoint::new(longitude, latitude),
        )
        .unwrap()
    })
    .collect()
}

fn mount(config: MapConfig, selected: Option<&str>) -> MapView {
    let input = MapInput {
        stations: stations(),
        selected: selected.map(String::from),
        ..Default::default()
    };
    MapView::new(config, input, SIZE).unwrap()
}

fn flat_config() -> MapConfig {
    MapConfig {
        mode: MapMode::Flat,
        ..Default::default()
    }
}

fn globe_config() -> MapConfig {
    MapConfig {
        mode: MapMode::Globe,
        ..Default::default()
    }
}

fn renderer() -> MapRenderer {
    MapRenderer::new(Default::default()).unwrap()
}

/// Mount a flat map with Berlin selected, and check everything that gets drawn
/// for it
#[test]
fn test_flat_selected_station() {
    let view = mount(flat_config(), Some("Berlin"));
    let projection = view.projection();
    assert_approx_eq!(projection.scale, 800.0 / 6.0);
    assert_eq!(projection.translate, Point2::new(400.0, 200.0));

    let frame = renderer().render(&view);
    let expected = projection.project(GeoPoint::new(13.405, 52.52)).unwrap();
    let marker = frame.marker("Berlin").unwrap();
    assert!(marker.position.distance_to(expected) < 1.0);
    assert_approx_eq!(marker.radius, 6.0);

    // Pinned tooltip sits 60px above the marker
    assert_eq!(frame.tooltips.len(), 1);
    let tooltip = &frame.tooltips[0];
    assert_eq!(tooltip.station, "Berlin");
    assert_approx_eq!(tooltip.rect.y, marker.position.y - 60.0);
    assert_approx_eq!(
        tooltip.rect.x + tooltip.rect.width / 2.0,
        marker.position.x
    );
}

#[test]
fn test_full_rotation() {
    let mut view = mount(globe_config(), None);
    let start = view.projection().rotation().unwrap();
    // 0.5° per tick
    for _ in 0..720 {
        assert!(view.handle(MapEvent::Tick));
    }
    let end = view.projection().rotation().unwrap();
    assert_approx_eq!(end.lambda, start.lambda, 1e-9);
    assert_approx_eq!(end.phi, start.phi);
}

#[test]
fn test_resize_round_trip() {
    let renderer = renderer();
    for config in [flat_config(), globe_config()] {
        let mut view = mount(config, None);
        let before = renderer.render(&view);

        assert!(view.handle(MapEvent::Resize(Size::new(1600.0, 800.0))));
        let bigger = renderer.render(&view);
        // Doubling the container doubles every marker position
        for marker in &before.markers {
            let scaled = bigger.marker(&marker.station).unwrap();
            assert_approx_eq!(scaled.position.x, marker.position.x * 2.0);
            assert_approx_eq!(scaled.position.y, marker.position.y * 2.0);
        }

        assert!(view.handle(MapEvent::Resize(SIZE)));
        let after = renderer.render(&view);
        assert_eq!(after.markers.len(), before.markers.len());
        for (a, b) in before.markers.iter().zip(&after.markers) {
            assert_approx_eq!(a.position.x, b.position.x);
            assert_approx_eq!(a.position.y, b.position.y);
        }
    }
}

#[test]
fn test_resize_keeps_pan() {
    let renderer = renderer();
    let mut view = mount(flat_config(), None);
    view.handle(MapEvent::PointerDown(Point2::new(400.0, 200.0)));
    view.handle(MapEvent::PointerMove(Point2::new(450.0, 180.0)));
    view.handle(MapEvent::PointerUp(Point2::new(450.0, 180.0)));
    let panned = renderer.render(&view);

    view.handle(MapEvent::Resize(Size::new(400.0, 200.0)));
    let smaller = renderer.render(&view);
    for marker in &panned.markers {
        let scaled = smaller.marker(&marker.station).unwrap();
        assert_approx_eq!(scaled.position.x, marker.position.x / 2.0);
        assert_approx_eq!(scaled.position.y, marker.position.y / 2.0);
    }
}

#[test]
fn test_pinned_tooltip_follows_zoom() {
    let config = MapConfig {
        zoom: ZoomConfig {
            transition_ms: 0,
            ..Default::default()
        },
        ..flat_config()
    };
    let renderer = renderer();
    let mut view = mount(config, Some("Berlin"));
    let before = renderer.render(&view).marker("Berlin").unwrap().position;

    assert!(view.handle(MapEvent::ZoomIn));
    assert_approx_eq!(view.viewport().k, 1.3);
    let frame = renderer.render(&view);
    let marker = frame.marker("Berlin").unwrap().position;
    // Zoomed about the center, so the marker moved away from it
    assert_approx_eq!(marker.x - 400.0, (before.x - 400.0) * 1.3);
    assert_approx_eq!(marker.y - 200.0, (before.y - 200.0) * 1.3);

    let tooltip = &frame.tooltips[0];
    assert_eq!(tooltip.anchor, marker);
    assert_approx_eq!(tooltip.rect.y, marker.y - 60.0);
}

#[test]
fn test_pinned_tooltip_follows_rotation() {
    let renderer = renderer();
    let mut view = mount(globe_config(), Some("Berlin"));
    let before = renderer.render(&view);
    let start = before.marker("Berlin").unwrap().position;

    for _ in 0..10 {
        view.handle(MapEvent::Tick);
    }
    let frame = renderer.render(&view);
    let marker = frame.marker("Berlin").unwrap().position;
    // Rotating east pushes Berlin to the right
    assert!(marker.x > start.x);

    let tooltip = &frame.tooltips[0];
    assert_eq!(tooltip.anchor, marker);
    assert_approx_eq!(tooltip.rect.y, marker.y - 80.0);
}

#[test]
fn test_rotation_start_override() {
    let input = MapInput {
        stations: stations(),
        rotation_start: Some(-90.0),
        ..Default::default()
    };
    let view = MapView::new(globe_config(), input, SIZE).unwrap();
    let rotation = view.projection().rotation().unwrap();
    assert_approx_eq!(rotation.lambda, 270.0);
    // Other rotation parameters come from the config
    assert_approx_eq!(rotation.phi, -10.0);
}

#[test]
fn test_far_side_hidden() {
    let renderer = renderer();
    let view = mount(globe_config(), None);
    let frame = renderer.render(&view);
    // The initial rotation faces the Atlantic, so Anchorage and Tokyo are
    // around the back
    assert!(frame.marker("Nairobi").is_some());
    assert!(frame.marker("Anchorage").is_none());
    assert!(frame.marker("Tokyo").is_none());
    // Flat maps draw everything
    let frame = renderer.render(&mount(flat_config(), None));
    assert_eq!(frame.markers.len(), 5);
}

#[test]
fn test_hover_tooltip_rotates_away() {
    let renderer = renderer();
    let mut view = mount(globe_config(), None);
    let berlin = view.stations().get("Berlin").unwrap().clone();
    let pointer = view.marker_position(&berlin).unwrap();
    view.handle(MapEvent::PointerMove(pointer));
    let frame = renderer.render(&view);
    assert_eq!(frame.tooltips.len(), 1);
    assert_eq!(frame.tooltips[0].station, "Berlin");

    // Turn until Berlin is behind the globe, without moving the pointer
    let mut ticks = 0;
    while view.marker_position(&berlin).is_some() {
        view.handle(MapEvent::Tick);
        ticks += 1;
        assert!(ticks < 720, "Berlin never went behind the globe");
    }
    let frame = renderer.render(&view);
    assert!(frame.marker("Berlin").is_none());
    assert!(frame.tooltips.is_empty());
    assert_eq!(view.selection().hovered(), None);
}

/// Random event sequence, for the determinism check
fn random_events(rng: &mut impl Rng, count: usize) -> Vec<MapEvent> {
    (0..count)
        .map(|_| {
            let x = rng.gen_range(0.0..800.0);
            let y = rng.gen_range(0.0..400.0);
            let point = Point2::new(x, y);
            match rng.gen_range(0..10) {
                0 => MapEvent::PointerDown(point),
                1 | 2 => MapEvent::PointerMove(point),
                3 => MapEvent::PointerUp(point),
                4 => MapEvent::Wheel {
                    delta_y: rng.gen_range(-500.0..500.0),
                    at: point,
                },
                5 => MapEvent::ZoomIn,
                6 => MapEvent::ZoomOut,
                7 => MapEvent::Frame(Duration::from_millis(16)),
                8 => MapEvent::Tick,
                _ => MapEvent::Select(Some("Lima".into())),
            }
        })
        .collect()
}

#[test]
fn test_deterministic() {
    let renderer = renderer();
    let mut rng = Pcg64::seed_from_u64(2906);
    for config in [flat_config(), globe_config()] {
        let events = random_events(&mut rng, 300);
        let mut a = mount(config.clone(), None);
        let mut b = mount(config.clone(), None);
        for event in events {
            assert_eq!(a.handle(event.clone()), b.handle(event));

            // Zoom never leaves the configured extent
            let k = a.viewport().k;
            assert!(
                (0.7 - 1e-9..=3.0 + 1e-9).contains(&k),
                "zoom {} out of range",
                k
            );
            let frame = renderer.render(&a);
            assert!(frame
                .markers
                .iter()
                .all(|marker| marker.position.is_finite()));
            assert_eq!(frame, renderer.render(&b));
        }
    }
}
