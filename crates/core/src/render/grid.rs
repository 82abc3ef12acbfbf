use crate::{boundary::Line, geo::GeoPoint};

/// Latitudes that get a parallel
pub const PARALLELS: [f64; 5] = [-60.0, -30.0, 0.0, 30.0, 60.0];
/// Spacing between meridians, in degrees of longitude
pub const MERIDIAN_STEP: f64 = 30.0;
/// Distance between consecutive sample points along a grid line, in degrees
pub const SAMPLE_STEP: f64 = 1.0;

/// Generate the latitude/longitude grid as geographic polylines: one line per
/// parallel running west to east, then one per meridian running north to
/// south. The grid is fixed; it doesn't depend on the projection or zoom.
pub fn graticule() -> Vec<Line> {
    let parallel_samples = (360.0 / SAMPLE_STEP) as usize;
    let meridian_samples = (180.0 / SAMPLE_STEP) as usize;
    let meridians = (360.0 / MERIDIAN_STEP) as usize;

    let parallels = PARALLELS.iter().map(|&latitude| {
        (0..=parallel_samples)
            .map(|i| GeoPoint::new(-180.0 + i as f64 * SAMPLE_STEP, latitude))
            .collect()
    });
    let meridians = (0..meridians).map(|i| {
        let longitude =
            GeoPoint::LONGITUDE_RANGE.wrap(i as f64 * MERIDIAN_STEP);
        (0..=meridian_samples)
            .map(|j| GeoPoint::new(longitude, 90.0 - j as f64 * SAMPLE_STEP))
            .collect()
    });
    parallels.chain(meridians).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graticule() {
        let lines = graticule();
        assert_eq!(lines.len(), 5 + 12);

        let equator = &lines[2];
        assert_eq!(equator.len(), 361);
        assert!(equator.iter().all(|point| point.latitude == 0.0));

        let meridian = &lines[5];
        assert_eq!(meridian.len(), 181);
        assert_eq!(meridian[0], GeoPoint::new(0.0, 90.0));
        assert_eq!(meridian[180], GeoPoint::new(0.0, -90.0));

        // Meridians past 180°E wrap around to the western hemisphere
        assert_eq!(lines[5 + 7][0].longitude, -150.0);
    }
}
