use anyhow::Context;
use log::debug;
use std::path::PathBuf;

/// Somewhere boundary datasets can be fetched from. Implementors only have to
/// produce the raw text; decoding and caching are handled by
/// [BoundaryCache](super::BoundaryCache).
#[allow(async_fn_in_trait)]
pub trait BoundarySource {
    async fn fetch(&self, url: &str) -> anyhow::Result<String>;
}

impl<S: BoundarySource> BoundarySource for &S {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        (**self).fetch(url).await
    }
}

/// Reads boundary datasets from the local filesystem. URLs are treated as
/// paths, with an optional `file://` prefix. Relative paths resolve against
/// `root` if one is set.
#[derive(Clone, Debug, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

impl BoundarySource for FileSource {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let path = self.resolve(url);
        debug!("Reading boundaries from {:?}", path);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("error reading {:?}", path))
    }
}

/// Fetches boundary datasets over HTTP(S)
#[cfg(feature = "fetch")]
#[derive(Clone, Debug, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

#[cfg(feature = "fetch")]
impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "fetch")]
impl BoundarySource for HttpSource {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?
            .error_for_status()?;
        response.text().await.context("error reading response body")
    }
}

/// Picks a source based on the URL scheme: HTTP(S) URLs go over the network
/// (only when built with the `fetch` feature), anything else is read from
/// disk.
#[derive(Clone, Debug, Default)]
pub struct DefaultSource {
    file: FileSource,
    #[cfg(feature = "fetch")]
    http: HttpSource,
}

impl DefaultSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative file paths against the given directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            file: FileSource::with_root(root),
            ..Self::default()
        }
    }
}

impl BoundarySource for DefaultSource {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        if url.starts_with("http://") || url.starts_with("https://") {
            #[cfg(feature = "fetch")]
            return self.http.fetch(url).await;
            #[cfg(not(feature = "fetch"))]
            anyhow::bail!(
                "cannot fetch {}: built without the `fetch` feature",
                url
            );
        }
        self.file.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let source = FileSource::with_root("/data");
        assert_eq!(
            source.resolve("file://world.json"),
            PathBuf::from("/data/world.json")
        );
        assert_eq!(
            source.resolve("/tmp/world.json"),
            PathBuf::from("/tmp/world.json")
        );
        assert_eq!(
            FileSource::new().resolve("world.json"),
            PathBuf::from("world.json")
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = FileSource::new()
            .fetch("/definitely/not/here.json")
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("error reading"));
    }

    #[cfg(not(feature = "fetch"))]
    #[tokio::test]
    async fn test_http_without_fetch_feature() {
        let err = DefaultSource::new()
            .fetch("https://example.com/world.json")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("fetch"));
    }
}
