//! Geographic primitives: points on the globe and the weather stations that
//! sit on them.

use crate::util::range::NumRange;
use anyhow::{bail, Context};
use derive_more::Display;
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// A (longitude, latitude) pair in degrees. Stations always carry a valid
/// point (see [Station::check]); boundary geometry is taken as-is from the
/// dataset since the projections are defined for any finite input.
#[derive(Copy, Clone, Debug, Display, PartialEq, Serialize, Deserialize)]
#[display(fmt = "({}°, {}°)", longitude, latitude)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub const LONGITUDE_RANGE: NumRange = NumRange::new(-180.0, 180.0);
    pub const LATITUDE_RANGE: NumRange = NumRange::new(-90.0, 90.0);

    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Build a point, rejecting coordinates outside the valid ranges
    /// (including `NaN`).
    pub fn checked(longitude: f64, latitude: f64) -> anyhow::Result<Self> {
        Self::LONGITUDE_RANGE
            .ensure_contains(longitude)
            .context("invalid longitude")?;
        Self::LATITUDE_RANGE
            .ensure_contains(latitude)
            .context("invalid latitude")?;
        Ok(Self::new(longitude, latitude))
    }

    /// The point on the exact opposite side of the globe
    pub fn antipode(self) -> Self {
        Self::new(
            Self::LONGITUDE_RANGE.wrap(self.longitude + 180.0),
            -self.latitude,
        )
    }

    /// Great-circle distance to another point, in degrees
    pub fn angular_distance_to(self, other: Self) -> f64 {
        self.cos_angular_distance_to(other)
            .clamp(-1.0, 1.0)
            .acos()
            .to_degrees()
    }

    /// Cosine of the great-circle distance to another point. Cheaper than
    /// [Self::angular_distance_to] when only a threshold test is needed.
    pub fn cos_angular_distance_to(self, other: Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();
        lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * delta_lon.cos()
    }
}

// Implemented by hand because the derived range check lets NaN through
impl Validate for GeoPoint {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !Self::LONGITUDE_RANGE.contains(self.longitude) {
            errors.add(
                "longitude",
                range_error(Self::LONGITUDE_RANGE, self.longitude),
            );
        }
        if !Self::LATITUDE_RANGE.contains(self.latitude) {
            errors.add(
                "latitude",
                range_error(Self::LATITUDE_RANGE, self.latitude),
            );
        }
        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn range_error(range: NumRange, value: f64) -> ValidationError {
    let mut error = ValidationError::new("range");
    error.add_param("min".into(), &range.min);
    error.add_param("max".into(), &range.max);
    error.add_param("value".into(), &value);
    error
}

/// A weather station shown on the map. The weather fields are opaque display
/// data; only `name` and `location` matter to the engine. The name is the
/// station's identity within a map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct Station {
    #[validate(length(min = 1))]
    pub name: String,
    pub country: String,
    /// Temperature in °C
    pub temperature: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(alias = "humidity")]
    pub humidity_percent: f64,
    #[serde(alias = "weather_condition")]
    pub condition_label: String,
    #[validate]
    pub location: GeoPoint,
}

impl Station {
    /// Create a new station, validating all fields. Out-of-range coordinates
    /// are rejected here rather than being projected into garbage later.
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        temperature: f64,
        humidity_percent: f64,
        condition_label: impl Into<String>,
        location: GeoPoint,
    ) -> anyhow::Result<Self> {
        let station = Self {
            name: name.into(),
            country: country.into(),
            temperature,
            humidity_percent,
            condition_label: condition_label.into(),
            location,
        };
        station.check()?;
        Ok(station)
    }

    /// Run validation on a station that was built some other way, e.g.
    /// deserialized from a dataset file.
    pub fn check(&self) -> anyhow::Result<()> {
        self.validate()?;
        Ok(())
    }
}

/// The input contract from the dataset collaborator: an ordered list of
/// stations, plus optional view parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapInput {
    pub stations: Vec<Station>,
    /// Name of the station to mark as selected
    pub selected: Option<String>,
    /// Starting rotation longitude for the globe, in degrees
    pub rotation_start: Option<f64>,
    /// Center coordinate for the flat map
    pub center: Option<GeoPoint>,
}

/// The validated, ordered station collection for one map, keyed by name.
/// Iteration order matches the input order, which is also the marker draw
/// order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StationSet {
    stations: IndexMap<String, Station>,
}

impl StationSet {
    /// Validate every station and index them by name. Fails on the first
    /// invalid station or on a duplicate name.
    pub fn new(
        stations: impl IntoIterator<Item = Station>,
    ) -> anyhow::Result<Self> {
        let mut map = IndexMap::new();
        for station in stations {
            station.check().with_context(|| {
                format!("invalid station {:?}", station.name)
            })?;
            if map.contains_key(&station.name) {
                bail!("duplicate station name {:?}", station.name);
            }
            map.insert(station.name.clone(), station);
        }
        Ok(Self { stations: map })
    }

    pub fn get(&self, name: &str) -> Option<&Station> {
        self.stations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stations.contains_key(name)
    }

    /// Iterate over stations in input order
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Resolve a requested station name against this set. Unknown names are
    /// logged and dropped, since a bad selection shouldn't take down the map.
    pub fn resolve(&self, name: Option<&str>) -> Option<String> {
        let name = name?;
        if self.contains(name) {
            Some(name.to_owned())
        } else {
            warn!("Ignoring unknown station {:?}", name);
            None
        }
    }
}
