//! Decoding of boundary datasets. Two formats are accepted:
//!
//! - **TopoJSON**: a topology of shared arcs, optionally quantized and
//!   delta-encoded. Only the requested object is decoded, since datasets
//!   often carry overlapping objects (e.g. `countries` and `land`). If the
//!   topology has no object by that name, every object is decoded.
//! - **GeoJSON**: a feature collection, a single feature, or a bare geometry.
//!
//! Only geometry is read. Properties, ids and bounding boxes are ignored, as
//! are point geometries since there is nothing to outline.

use crate::{
    boundary::{Boundaries, Line, Polygon, Ring},
    geo::GeoPoint,
};
use anyhow::{anyhow, bail, Context};
use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;
use serde_json::Value;

/// Decode a TopoJSON or GeoJSON document into boundary geometry. `object`
/// names the topology object to read, and is ignored for GeoJSON.
pub fn decode(text: &str, object: &str) -> anyhow::Result<Boundaries> {
    let document: Value =
        serde_json::from_str(text).context("invalid boundary document")?;
    let kind = document
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("boundary document has no type"))?
        .to_owned();

    let mut boundaries = Boundaries::default();
    match kind.as_str() {
        "Topology" => {
            let topology = Topology::deserialize(document)?;
            let arcs = topology.decode_arcs()?;
            let objects = match topology.objects.get_key_value(object) {
                Some(entry) => vec![entry],
                None => {
                    warn!(
                        "Topology has no object {:?}, decoding all of {:?}",
                        object,
                        topology.objects.keys().collect::<Vec<_>>()
                    );
                    topology.objects.iter().collect()
                }
            };
            for (name, geometry) in objects {
                add_topo_geometry(&mut boundaries, &arcs, geometry)
                    .with_context(|| format!("error in object {:?}", name))?;
            }
        }
        "FeatureCollection" => {
            let collection = FeatureCollection::deserialize(document)?;
            for feature in collection.features {
                feature.add_to(&mut boundaries)?;
            }
        }
        "Feature" => Feature::deserialize(document)?.add_to(&mut boundaries)?,
        _ => add_geo_geometry(
            &mut boundaries,
            GeoGeometry::deserialize(document).with_context(|| {
                format!("unsupported geometry type {:?}", kind)
            })?,
        )?,
    }
    Ok(boundaries)
}

/// A position as it appears in the file. Anything past the second element
/// (altitude, etc.) is ignored.
type Position = Vec<f64>;

fn to_point(position: &[f64]) -> anyhow::Result<GeoPoint> {
    match position {
        [longitude, latitude, ..] => Ok(GeoPoint::new(*longitude, *latitude)),
        _ => bail!("position {:?} has fewer than 2 elements", position),
    }
}

// ===== TopoJSON =====

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<Position>>,
    objects: IndexMap<String, TopoGeometry>,
}

/// Quantization parameters. If present, arc positions are integer deltas
/// from the previous position, and need to be scaled and translated.
#[derive(Copy, Clone, Debug, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    GeometryCollection { geometries: Vec<TopoGeometry> },
    LineString { arcs: Vec<i64> },
    MultiLineString { arcs: Vec<Vec<i64>> },
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
    #[serde(other)]
    Other,
}

impl Topology {
    /// Decode every arc into absolute geographic points
    fn decode_arcs(&self) -> anyhow::Result<Vec<Vec<GeoPoint>>> {
        self.arcs
            .iter()
            .enumerate()
            .map(|(i, arc)| {
                let mut x = 0.0;
                let mut y = 0.0;
                arc.iter()
                    .map(|position| {
                        let point = to_point(position)
                            .with_context(|| format!("error in arc {}", i))?;
                        Ok::<_, anyhow::Error>(match self.transform {
                            Some(Transform { scale, translate }) => {
                                x += point.longitude;
                                y += point.latitude;
                                GeoPoint::new(
                                    x * scale[0] + translate[0],
                                    y * scale[1] + translate[1],
                                )
                            }
                            None => point,
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Join a sequence of arc references into one continuous line. A negative
/// index `i` refers to arc `!i` (i.e. `-i - 1`), traversed backwards.
/// Consecutive arcs share their joining point, so it's only kept once.
fn stitch(
    arcs: &[Vec<GeoPoint>],
    indexes: &[i64],
) -> anyhow::Result<Vec<GeoPoint>> {
    let mut points: Vec<GeoPoint> = Vec::new();
    for &index in indexes {
        let (arc_index, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };
        let arc = usize::try_from(arc_index)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or_else(|| anyhow!("arc index {} out of bounds", index))?;

        points.pop();
        if reversed {
            points.extend(arc.iter().rev());
        } else {
            points.extend(arc.iter());
        }
    }
    Ok(points)
}

fn stitch_polygon(
    arcs: &[Vec<GeoPoint>],
    rings: &[Vec<i64>],
) -> anyhow::Result<Polygon> {
    let rings = rings
        .iter()
        .map(|ring| stitch(arcs, ring))
        .collect::<anyhow::Result<Vec<Ring>>>()?;
    Ok(Polygon { rings })
}

fn add_topo_geometry(
    boundaries: &mut Boundaries,
    arcs: &[Vec<GeoPoint>],
    geometry: &TopoGeometry,
) -> anyhow::Result<()> {
    match geometry {
        TopoGeometry::GeometryCollection { geometries } => {
            for geometry in geometries {
                add_topo_geometry(boundaries, arcs, geometry)?;
            }
        }
        TopoGeometry::LineString { arcs: line } => {
            boundaries.lines.push(stitch(arcs, line)?);
        }
        TopoGeometry::MultiLineString { arcs: lines } => {
            for line in lines {
                boundaries.lines.push(stitch(arcs, line)?);
            }
        }
        TopoGeometry::Polygon { arcs: rings } => {
            boundaries.polygons.push(stitch_polygon(arcs, rings)?);
        }
        TopoGeometry::MultiPolygon { arcs: polygons } => {
            for rings in polygons {
                boundaries.polygons.push(stitch_polygon(arcs, rings)?);
            }
        }
        TopoGeometry::Other => {}
    }
    Ok(())
}

// ===== GeoJSON =====

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Option<GeoGeometry>,
}

impl Feature {
    /// Features without geometry are legal, and contribute nothing
    fn add_to(self, boundaries: &mut Boundaries) -> anyhow::Result<()> {
        match self.geometry {
            Some(geometry) => add_geo_geometry(boundaries, geometry),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoGeometry {
    GeometryCollection { geometries: Vec<GeoGeometry> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    Point,
    MultiPoint,
}

fn to_line(positions: &[Position]) -> anyhow::Result<Line> {
    positions.iter().map(|position| to_point(position)).collect()
}

fn to_polygon(rings: &[Vec<Position>]) -> anyhow::Result<Polygon> {
    let rings = rings
        .iter()
        .map(|ring| to_line(ring))
        .collect::<anyhow::Result<Vec<Ring>>>()?;
    Ok(Polygon { rings })
}

fn add_geo_geometry(
    boundaries: &mut Boundaries,
    geometry: GeoGeometry,
) -> anyhow::Result<()> {
    match geometry {
        GeoGeometry::GeometryCollection { geometries } => {
            for geometry in geometries {
                add_geo_geometry(boundaries, geometry)?;
            }
        }
        GeoGeometry::LineString { coordinates } => {
            boundaries.lines.push(to_line(&coordinates)?);
        }
        GeoGeometry::MultiLineString { coordinates } => {
            for line in &coordinates {
                boundaries.lines.push(to_line(line)?);
            }
        }
        GeoGeometry::Polygon { coordinates } => {
            boundaries.polygons.push(to_polygon(&coordinates)?);
        }
        GeoGeometry::MultiPolygon { coordinates } => {
            for rings in &coordinates {
                boundaries.polygons.push(to_polygon(rings)?);
            }
        }
        GeoGeometry::Point | GeoGeometry::MultiPoint => {}
    }
    Ok(())
}
