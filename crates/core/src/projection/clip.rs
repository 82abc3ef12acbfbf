//! Clipping of geometry against the visible hemisphere of the globe. All
//! functions here take points that have already been rotated into view space
//! (see [Rotation::matrix](super::Rotation::matrix)), where the visible
//! hemisphere is `x >= 0` and the horizon is the great circle `x = 0`.

use crate::projection::visibility::HORIZON_EPSILON;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Maximum angle between two interpolated points along the horizon, in
/// radians. Keeps the cut edge of a clipped polygon looking round.
const HORIZON_STEP: f64 = 5.0 * PI / 180.0;

fn is_front(point: &Vector3<f64>) -> bool {
    point.x >= -HORIZON_EPSILON
}

/// Where the great-circle arc from `a` to `b` crosses the horizon. Exactly one
/// of the two points must be on the front side.
fn horizon_crossing(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    let t = a.x / (a.x - b.x);
    let mut crossing = a + (b - a) * t;
    crossing.x = 0.0;
    let norm = crossing.norm();
    if norm > 0.0 {
        crossing / norm
    } else {
        // a and b are antipodal, so any horizon point is on the arc
        Vector3::new(0.0, 1.0, 0.0)
    }
}

/// Points along the horizon strictly between `from` and `to`, going the
/// short way around.
fn horizon_arc(from: &Vector3<f64>, to: &Vector3<f64>) -> Vec<Vector3<f64>> {
    let start = from.z.atan2(from.y);
    let end = to.z.atan2(to.y);
    let mut delta = end - start;
    if delta > PI {
        delta -= 2.0 * PI;
    } else if delta < -PI {
        delta += 2.0 * PI;
    }

    let steps = (delta.abs() / HORIZON_STEP).ceil() as usize;
    (1..steps)
        .map(|i| {
            let angle = start + delta * i as f64 / steps as f64;
            Vector3::new(0.0, angle.cos(), angle.sin())
        })
        .collect()
}

/// Split a polyline into the runs that lie on the visible hemisphere. Each run
/// that leaves or enters the hemisphere is extended to the exact horizon
/// crossing. Runs with fewer than two points are dropped.
pub fn clip_line(points: &[Vector3<f64>]) -> Vec<Vec<Vector3<f64>>> {
    let mut runs = Vec::new();
    let mut current: Vec<Vector3<f64>> = Vec::new();

    for (i, point) in points.iter().enumerate() {
        let front = is_front(point);
        if let Some(prev) = i.checked_sub(1).map(|j| &points[j]) {
            match (is_front(prev), front) {
                (true, false) => {
                    current.push(horizon_crossing(prev, point));
                    runs.push(std::mem::take(&mut current));
                }
                (false, true) => current.push(horizon_crossing(prev, point)),
                _ => {}
            }
        }
        if front {
            current.push(*point);
        }
    }
    runs.push(current);

    runs.retain(|run| run.len() >= 2);
    runs
}

/// Clip a closed ring to the visible hemisphere. Where the ring dips behind
/// the globe, the cut is closed along the horizon so the result is still a
/// closed ring. Returns `None` if nothing of the ring is visible.
///
/// A ring with every vertex hidden is treated as hidden, even if it encloses
/// the entire visible hemisphere. Country outlines never do.
pub fn clip_ring(points: &[Vector3<f64>]) -> Option<Vec<Vector3<f64>>> {
    #[derive(Copy, Clone, PartialEq)]
    enum Kind {
        Vertex,
        Exit,
        Entry,
    }

    if points.iter().all(is_front) {
        return Some(points.to_vec());
    }

    // Sutherland-Hodgman against the plane x = 0, remembering which output
    // points are crossings so we can stitch along the horizon afterwards
    let mut clipped: Vec<(Vector3<f64>, Kind)> = Vec::new();
    for (i, b) in points.iter().enumerate() {
        let a = &points[(i + points.len() - 1) % points.len()];
        match (is_front(a), is_front(b)) {
            (true, true) => clipped.push((*b, Kind::Vertex)),
            (true, false) => clipped.push((horizon_crossing(a, b), Kind::Exit)),
            (false, true) => {
                clipped.push((horizon_crossing(a, b), Kind::Entry));
                clipped.push((*b, Kind::Vertex));
            }
            (false, false) => {}
        }
    }
    if clipped.is_empty() {
        return None;
    }

    let mut ring = Vec::with_capacity(clipped.len());
    for (i, (point, kind)) in clipped.iter().enumerate() {
        ring.push(*point);
        if *kind == Kind::Exit {
            let (next, next_kind) = &clipped[(i + 1) % clipped.len()];
            if *next_kind == Kind::Entry {
                ring.extend(horizon_arc(point, next));
            }
        }
    }
    Some(ring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn v(x: f64, y: f64, z: f64) -> Vector3<f64> {
        Vector3::new(x, y, z).normalize()
    }

    #[test]
    fn test_clip_line_all_visible() {
        let line = vec![v(1.0, 0.0, 0.0), v(1.0, 1.0, 0.0)];
        assert_eq!(clip_line(&line), vec![line]);
    }

    #[test]
    fn test_clip_line_all_hidden() {
        let line = vec![v(-1.0, 0.0, 0.0), v(-1.0, 1.0, 0.0)];
        assert!(clip_line(&line).is_empty());
    }

    #[test]
    fn test_clip_line_splits_at_horizon() {
        let line = vec![
            v(1.0, -1.0, 0.0),
            v(-1.0, 0.0, 0.0),
            v(1.0, 1.0, 0.0),
        ];
        let runs = clip_line(&line);
        assert_eq!(runs.len(), 2);
        for run in &runs {
            assert_eq!(run.len(), 2);
            // The cut end sits exactly on the horizon, on the unit sphere
            let cut = run.iter().find(|p| p.x.abs() < 1e-12).unwrap();
            assert_approx_eq!(cut.norm(), 1.0);
        }
    }

    #[test]
    fn test_clip_ring_hidden() {
        let ring =
            vec![v(-1.0, 0.0, 0.0), v(-1.0, 1.0, 0.0), v(-1.0, 0.0, 1.0)];
        assert!(clip_ring(&ring).is_none());
    }

    #[test]
    fn test_clip_ring_follows_horizon() {
        // A ring straddling the horizon: two vertices in front, two behind
        let ring = vec![
            v(1.0, -0.5, 0.5),
            v(1.0, 0.5, 0.5),
            v(-1.0, 0.5, -0.5),
            v(-1.0, -0.5, -0.5),
        ];
        let clipped = clip_ring(&ring).unwrap();
        assert!(clipped.len() >= 4);
        for point in &clipped {
            assert!(point.x >= -1e-12, "point behind horizon: {:?}", point);
            assert_approx_eq!(point.norm(), 1.0);
        }
    }
}
