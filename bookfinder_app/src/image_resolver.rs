use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use futures_util::future::join_all;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

/// Inline "No Cover" artwork tried after the requested cover
pub const PLACEHOLDER_COVER: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMzAwIiBoZWlnaHQ9IjQwMCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj4KPHJlY3Qgd2lkdGg9IjEwMCUiIGhlaWdodD0iMTAwJSIgZmlsbD0iIzRBNTU2OCIvPgo8dGV4dCB4PSI1MCUiIHk9IjUwJSIgZm9udC1mYW1pbHk9IkFyaWFsLCBzYW5zLXNlcmlmIiBmb250LXNpemU9IjE2IiBmaWxsPSIjRkZGRkZGIiB0ZXh0LWFuY2hvcj0ibWlkZGxlIiBkeT0iLjNlbSI+Tm8gQ292ZXI8L3RleHQ+Cjwvc3ZnPg==";
pub const ALTERNATE_PLACEHOLDER_COVER: &str =
    "https://dummyimage.com/300x400/4A5568/ffffff.png&text=Book+Cover";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    /// Trying the source at this position of the fallback chain
    Loading { attempt: usize },
    Loaded,
    /// Every source failed
    Error,
}

/// Emitted once per successful load, consumed by `ImageLoadProgress`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLoaded;

#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("Request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("{url} is not an image ({content_type})")]
    NotAnImage { url: String, content_type: String },
    #[error("Unsupported image source {0}")]
    Unsupported(String),
}

/// Ordered sources for a requested cover, each source appearing once
fn fallback_chain(requested: Option<&str>) -> Vec<String> {
    let mut chain: Vec<String> = Vec::with_capacity(3);
    let requested = requested.map(str::trim).filter(|url| !url.is_empty());
    for source in requested
        .into_iter()
        .chain([PLACEHOLDER_COVER, ALTERNATE_PLACEHOLDER_COVER])
    {
        if !chain.iter().any(|tried| tried == source) {
            chain.push(source.to_string());
        }
    }
    chain
}

/// Cover of one book walking its fallback chain
#[derive(Debug, Clone, PartialEq)]
pub struct CoverImage {
    requested: Option<String>,
    chain: Vec<String>,
    state: ImageState,
}

impl CoverImage {
    pub fn new(requested: Option<&str>) -> Self {
        Self {
            requested: requested.map(str::to_string),
            chain: fallback_chain(requested),
            state: ImageState::Loading { attempt: 0 },
        }
    }

    pub fn state(&self) -> ImageState {
        self.state
    }

    pub fn requested(&self) -> Option<&str> {
        self.requested.as_deref()
    }

    /// Source to display in the current state, `None` once every source failed
    pub fn current_source(&self) -> Option<&str> {
        match self.state {
            ImageState::Loading { attempt } => self.chain.get(attempt).map(String::as_str),
            ImageState::Loaded => self.loaded_source(),
            ImageState::Error => None,
        }
    }

    fn loaded_source(&self) -> Option<&str> {
        self.chain.last().map(String::as_str)
    }

    /// The current source loaded
    pub fn on_load(&mut self) -> Option<ImageLoaded> {
        match self.state {
            ImageState::Loading { attempt } => {
                tracing::debug!("Image loaded: {}", self.chain[attempt]);
                // Keep the winning source at the end so it stays displayable
                self.chain.truncate(attempt + 1);
                self.state = ImageState::Loaded;
                Some(ImageLoaded)
            }
            ImageState::Loaded | ImageState::Error => None,
        }
    }

    /// The current source failed, moves to the next untried source
    pub fn on_error(&mut self) {
        if let ImageState::Loading { attempt } = self.state {
            tracing::debug!(
                "Image failed to load: {} (attempt {})",
                self.chain[attempt],
                attempt + 1
            );
            let next = attempt + 1;
            self.state = if next < self.chain.len() {
                ImageState::Loading { attempt: next }
            } else {
                tracing::warn!(
                    "All image sources failed for {}",
                    self.requested.as_deref().unwrap_or("<no cover>")
                );
                ImageState::Error
            };
        }
    }

    /// Requests another cover, restarting the chain
    pub fn set_source(&mut self, requested: Option<&str>) {
        *self = Self::new(requested);
    }
}

#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Loads the source, success means it can be displayed
    async fn fetch(&self, source: &str) -> Result<(), ImageLoadError>;
}

pub struct HttpImageFetcher {
    client: ClientWithMiddleware,
}

impl HttpImageFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, source: &str) -> Result<(), ImageLoadError> {
        if source.starts_with("data:image/") {
            return Ok(());
        }
        if !(source.starts_with("http://") || source.starts_with("https://")) {
            return Err(ImageLoadError::Unsupported(source.to_string()));
        }

        let response =
            self.client
                .get(source)
                .send()
                .await
                .map_err(|err| ImageLoadError::Request {
                    url: source.to_string(),
                    source: err.into(),
                })?;
        if !response.status().is_success() {
            return Err(ImageLoadError::Status {
                url: source.to_string(),
                status: response.status().as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if content_type.starts_with("image/") {
            Ok(())
        } else {
            Err(ImageLoadError::NotAnImage {
                url: source.to_string(),
                content_type,
            })
        }
    }
}

/// Counts loaded covers of the current result set
#[derive(Debug, Default)]
pub struct ImageLoadProgress {
    loaded: AtomicUsize,
    total: AtomicUsize,
}

impl ImageLoadProgress {
    /// Starts tracking a new result set
    pub fn reset(&self, total: usize) {
        self.loaded.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    pub fn record(&self, _signal: ImageLoaded) {
        self.loaded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn loaded(&self) -> usize {
        self.loaded.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn is_complete(&self) -> bool {
        self.loaded() >= self.total()
    }

    /// Loaded share in percent, `None` when nothing is tracked
    pub fn percent(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.loaded().min(total) as f64 * 100.0 / total as f64)
    }
}

/// Drives one cover through its chain until it is loaded or fails for good
pub async fn resolve_cover(
    fetcher: &dyn ImageFetcher,
    cover: &mut CoverImage,
    progress: &ImageLoadProgress,
) {
    while let ImageState::Loading { .. } = cover.state() {
        let Some(source) = cover.current_source().map(str::to_string) else {
            cover.on_error();
            continue;
        };
        match fetcher.fetch(&source).await {
            Ok(()) => {
                if let Some(signal) = cover.on_load() {
                    progress.record(signal);
                }
            }
            Err(err) => {
                tracing::debug!("{}", err);
                cover.on_error();
            }
        }
    }
}

/// Resolves the covers of the visible books
pub struct CoverResolver {
    fetcher: Arc<dyn ImageFetcher>,
    progress: ImageLoadProgress,
    covers: Vec<CoverImage>,
}

impl CoverResolver {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            progress: ImageLoadProgress::default(),
            covers: Vec::new(),
        }
    }

    pub fn progress(&self) -> &ImageLoadProgress {
        &self.progress
    }

    pub fn covers(&self) -> &[CoverImage] {
        &self.covers
    }

    /// Replaces the tracked covers and resolves all of them concurrently.
    /// A cover whose requested url did not change keeps its state.
    pub async fn resolve_all(&mut self, requested: &[Option<&str>]) {
        let mut covers: Vec<CoverImage> = requested
            .iter()
            .enumerate()
            .map(|(index, url)| match self.covers.get(index) {
                Some(existing) if existing.requested() == *url => existing.clone(),
                _ => CoverImage::new(*url),
            })
            .collect();

        self.progress.reset(covers.len());
        for _ in covers.iter().filter(|c| c.state() == ImageState::Loaded) {
            self.progress.record(ImageLoaded);
        }

        let fetcher = self.fetcher.as_ref();
        let progress = &self.progress;
        join_all(
            covers
                .iter_mut()
                .map(|cover| resolve_cover(fetcher, cover, progress)),
        )
        .await;
        self.covers = covers;
    }

    pub fn clear(&mut self) {
        self.covers.clear();
        self.progress.reset(0);
    }
}

#[cfg(test)]
mod image_resolver_tests {
    use std::collections::HashSet;

    use super::*;

    /// Fails every source in the set and counts attempts
    #[derive(Default)]
    struct FakeFetcher {
        failing: HashSet<String>,
        attempts: parking_lot::Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn failing(sources: &[&str]) -> Self {
            Self {
                failing: sources.iter().map(|s| s.to_string()).collect(),
                attempts: Default::default(),
            }
        }
    }

    #[async_trait::async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, source: &str) -> Result<(), ImageLoadError> {
            self.attempts.lock().push(source.to_string());
            if self.failing.contains(source) {
                Err(ImageLoadError::Status {
                    url: source.to_string(),
                    status: 404,
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_state_machine_walks_the_chain() {
        let mut cover = CoverImage::new(Some("https://covers/dune.png"));
        assert_eq!(cover.state(), ImageState::Loading { attempt: 0 });
        assert_eq!(cover.current_source(), Some("https://covers/dune.png"));

        cover.on_error();
        assert_eq!(cover.state(), ImageState::Loading { attempt: 1 });
        assert_eq!(cover.current_source(), Some(PLACEHOLDER_COVER));

        cover.on_error();
        assert_eq!(cover.state(), ImageState::Loading { attempt: 2 });
        assert_eq!(cover.current_source(), Some(ALTERNATE_PLACEHOLDER_COVER));

        cover.on_error();
        assert_eq!(cover.state(), ImageState::Error);
        assert_eq!(cover.current_source(), None);
        assert_eq!(cover.on_load(), None);
    }

    #[test]
    fn test_source_change_resets_and_duplicates_are_skipped() {
        let mut cover = CoverImage::new(Some(PLACEHOLDER_COVER));
        cover.on_error();
        assert_eq!(cover.current_source(), Some(ALTERNATE_PLACEHOLDER_COVER));
        cover.on_error();
        assert_eq!(cover.state(), ImageState::Error);

        cover.set_source(Some("https://covers/emma.png"));
        assert_eq!(cover.state(), ImageState::Loading { attempt: 0 });
        assert_eq!(cover.on_load(), Some(ImageLoaded));
        assert_eq!(cover.current_source(), Some("https://covers/emma.png"));

        let without_cover = CoverImage::new(Some("  "));
        assert_eq!(without_cover.current_source(), Some(PLACEHOLDER_COVER));
    }

    #[tokio::test]
    /// Requested cover and inline placeholder fail, the third source loads
    async fn test_fails_twice_then_loads() {
        let fetcher = FakeFetcher::failing(&["https://covers/broken.png", PLACEHOLDER_COVER]);
        let progress = ImageLoadProgress::default();
        progress.reset(1);
        let mut cover = CoverImage::new(Some("https://covers/broken.png"));

        resolve_cover(&fetcher, &mut cover, &progress).await;

        assert_eq!(cover.state(), ImageState::Loaded);
        assert_eq!(cover.current_source(), Some(ALTERNATE_PLACEHOLDER_COVER));
        assert_eq!(fetcher.attempts.lock().len(), 3);
        assert!(progress.is_complete());
        assert_eq!(progress.percent(), Some(100.0));
    }

    #[tokio::test]
    /// Resolves a set of covers concurrently and tracks progress
    /// 1. One cover loads directly, one falls back, one fails entirely
    /// 2. Unchanged covers are not fetched again on the next pass
    async fn test_resolver_tracks_progress() {
        let fetcher = Arc::new(FakeFetcher::failing(&[
            "https://covers/missing.png",
            PLACEHOLDER_COVER,
            ALTERNATE_PLACEHOLDER_COVER,
        ]));
        let mut resolver = CoverResolver::new(fetcher.clone());

        resolver
            .resolve_all(&[Some("https://covers/ok.png"), Some("https://covers/missing.png")])
            .await;
        let states: Vec<ImageState> = resolver.covers().iter().map(CoverImage::state).collect();
        assert_eq!(states, vec![ImageState::Loaded, ImageState::Error]);
        assert_eq!(resolver.progress().loaded(), 1);
        assert_eq!(resolver.progress().total(), 2);
        assert!(!resolver.progress().is_complete());
        assert_eq!(resolver.progress().percent(), Some(50.0));

        fetcher.attempts.lock().clear();
        resolver.resolve_all(&[Some("https://covers/ok.png")]).await;
        assert!(fetcher.attempts.lock().is_empty());
        assert!(resolver.progress().is_complete());

        resolver.clear();
        assert_eq!(resolver.progress().percent(), None);
    }

    #[tokio::test]
    async fn test_http_fetcher_accepts_inline_images_only_locally() {
        let fetcher = HttpImageFetcher::new().unwrap();
        assert!(fetcher.fetch(PLACEHOLDER_COVER).await.is_ok());
        assert!(matches!(
            fetcher.fetch("ftp://covers/dune.png").await,
            Err(ImageLoadError::Unsupported(_))
        ));
    }
}
