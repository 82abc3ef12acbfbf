use skymap::{
    FlatConfig, GeoPoint, MapConfig, MapInput, MapRenderer, MapView,
    RenderConfig, Size, Station, ZoomConfig,
};
use validator::ValidationErrors;

/// Get the sorted list of top-level fields that failed validation
fn error_fields(err: anyhow::Error) -> Vec<&'static str> {
    let validation_errors = err.downcast::<ValidationErrors>().unwrap();
    let mut error_fields = validation_errors
        .errors()
        .keys()
        .copied()
        .collect::<Vec<&str>>();
    error_fields.sort_unstable();
    error_fields
}

#[test]
fn test_map_config_validation() {
    let config = MapConfig {
        flat: FlatConfig {
            scale_divisor: 0.0, // invalid
            center: GeoPoint::new(0.0, 20.0),
        },
        zoom: ZoomConfig {
            min_scale: 4.0, // invalid (above max)
            max_scale: 3.0,
            ..Default::default()
        },
        pan_margin: -1.0,               // invalid
        hover_radius: -1.0,             // invalid
        boundary_url: String::new(),    // invalid
        boundary_object: String::new(), // invalid
        ..Default::default()
    };

    let err =
        MapView::new(config, MapInput::default(), Size::new(800.0, 400.0))
            .unwrap_err();
    assert_eq!(
        error_fields(err),
        vec![
            "boundary_object",
            "boundary_url",
            "flat",
            "hover_radius",
            "pan_margin",
            "zoom"
        ],
    );
}

#[test]
fn test_render_config_validation() {
    let config = RenderConfig {
        marker_radius: 7.0,    // invalid (bigger than the selected radius)
        font_size: 0.0,        // invalid
        tooltip_padding: -2.0, // invalid
        ..Default::default()
    };

    let err = MapRenderer::new(config).unwrap_err();
    assert_eq!(
        error_fields(err),
        vec!["__all__", "font_size", "tooltip_padding"]
    );
}

#[test]
fn test_station_validation() {
    assert!(Station::new(
        "Nowhere",
        "",
        0.0,
        50.0,
        "clear",
        GeoPoint::new(0.0, 95.0)
    )
    .is_err());
    assert!(Station::new(
        "Nowhere",
        "",
        0.0,
        50.0,
        "clear",
        GeoPoint::new(f64::NAN, 0.0)
    )
    .is_err());
    assert!(Station::new(
        "Soggy",
        "",
        0.0,
        120.0, // invalid humidity
        "rain",
        GeoPoint::new(0.0, 0.0)
    )
    .is_err());
}

#[test]
fn test_duplicate_stations() {
    let station = Station::new(
        "Lima",
        "Peru",
        19.0,
        83.0,
        "overcast",
        GeoPoint::new(-77.0428, -12.0464),
    )
    .unwrap();
    let input = MapInput {
        stations: vec![station.clone(), station],
        ..Default::default()
    };
    let err =
        MapView::new(MapConfig::default(), input, Size::new(800.0, 400.0))
            .unwrap_err();
    assert!(err.to_string().contains("duplicate"), "{}", err);
}

#[test]
fn test_invalid_center() {
    let input = MapInput {
        center: Some(GeoPoint::new(200.0, 0.0)),
        ..Default::default()
    };
    assert!(
        MapView::new(MapConfig::default(), input, Size::new(800.0, 400.0))
            .is_err()
    );
}
