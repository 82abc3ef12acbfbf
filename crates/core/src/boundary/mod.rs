//! Country boundary geometry. Boundaries are a static dataset: they are
//! fetched once per URL, decoded into plain rings and lines, and then shared
//! read-only between every map view that asks for the same URL.

mod source;
mod topojson;

pub use self::{
    source::{BoundarySource, DefaultSource, FileSource},
    topojson::decode,
};
#[cfg(feature = "fetch")]
pub use self::source::HttpSource;

use crate::{geo::GeoPoint, timed};
use anyhow::Context;
use fnv::FnvHashMap;
use log::info;
use serde::Serialize;
use std::{cell::RefCell, rc::Rc};
use tokio::sync::OnceCell;

/// A closed sequence of points. The last point may or may not repeat the
/// first; renderers close the path either way.
pub type Ring = Vec<GeoPoint>;

/// An open sequence of points
pub type Line = Vec<GeoPoint>;

/// A polygon: one exterior ring followed by zero or more holes
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

/// Everything drawable from a boundary dataset. Polygons are filled country
/// shapes; lines are open borders, drawn as strokes only.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Boundaries {
    pub polygons: Vec<Polygon>,
    pub lines: Vec<Line>,
}

impl Boundaries {
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty() && self.lines.is_empty()
    }

    /// Iterate over every ring of every polygon
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flat_map(|polygon| polygon.rings.iter())
    }
}

/// A per-thread cache of decoded boundary datasets, keyed by URL and topology
/// object. Cloning the cache gives another handle to the same storage.
///
/// Concurrent loads of the same URL share one fetch. A failed load isn't
/// cached, so the next caller will try again.
/// URL and object name
type CacheKey = (String, String);

#[derive(Clone, Debug, Default)]
pub struct BoundaryCache {
    entries: Rc<RefCell<FnvHashMap<CacheKey, Rc<OnceCell<Rc<Boundaries>>>>>>,
}

impl BoundaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the boundaries for an object of the dataset at a URL, fetching and
    /// decoding them if this is the first request for it.
    pub async fn load<S: BoundarySource>(
        &self,
        source: &S,
        url: &str,
        object: &str,
    ) -> anyhow::Result<Rc<Boundaries>> {
        let cell = Rc::clone(
            self.entries
                .borrow_mut()
                .entry((url.to_owned(), object.to_owned()))
                .or_default(),
        );

        let boundaries = cell
            .get_or_try_init(|| async {
                info!("Loading boundaries from {}", url);
                let text = source
                    .fetch(url)
                    .await
                    .with_context(|| format!("error fetching {}", url))?;
                let boundaries =
                    timed!("Boundary decoding", decode(&text, object))
                        .with_context(|| format!("error decoding {}", url))?;
                info!(
                    "Loaded {} polygons and {} lines from {}",
                    boundaries.polygons.len(),
                    boundaries.lines.len(),
                    url
                );
                Ok::<_, anyhow::Error>(Rc::new(boundaries))
            })
            .await?;
        Ok(Rc::clone(boundaries))
    }

    /// Get the boundaries for a URL and object if they've already been loaded
    pub fn get(&self, url: &str, object: &str) -> Option<Rc<Boundaries>> {
        let key = (url.to_owned(), object.to_owned());
        self.entries.borrow().get(&key)?.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const SQUARE: &str = r#"{
        "type": "Polygon",
        "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
    }"#;

    /// Serves a fixed body and counts how often it was asked
    #[derive(Default)]
    struct CountingSource {
        calls: Cell<usize>,
        fail: Cell<bool>,
    }

    impl BoundarySource for CountingSource {
        async fn fetch(&self, _url: &str) -> anyhow::Result<String> {
            self.calls.set(self.calls.get() + 1);
            if self.fail.get() {
                anyhow::bail!("connection refused")
            }
            Ok(SQUARE.to_owned())
        }
    }

    #[tokio::test]
    async fn test_cache_fetches_once() {
        let cache = BoundaryCache::new();
        let source = CountingSource::default();
        assert!(cache.get("a", "countries").is_none());

        let first = cache.load(&source, "a", "countries").await.unwrap();
        let second =
            cache.clone().load(&source, "a", "countries").await.unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(source.calls.get(), 1);
        assert_eq!(first.polygons.len(), 1);
        assert!(cache.get("a", "countries").is_some());
        assert!(cache.get("a", "land").is_none());

        // Different URL, different entry
        cache.load(&source, "b", "countries").await.unwrap();
        assert_eq!(source.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_cache_failure_not_cached() {
        let cache = BoundaryCache::new();
        let source = CountingSource::default();
        source.fail.set(true);
        let err = cache.load(&source, "a", "countries").await.unwrap_err();
        assert!(format!("{:#}", err).contains("connection refused"));
        assert!(cache.get("a", "countries").is_none());

        source.fail.set(false);
        assert!(cache.load(&source, "a", "countries").await.is_ok());
        assert_eq!(source.calls.get(), 2);
    }
}
