use std::fmt::Write;
use std::sync::Arc;

use itertools::Itertools;

use bookfinder_recommendations::api::{BookResult, FilterField, RecommendationsApi};
use bookfinder_saved_books::api::SavedBooksApi;
use bookfinder_saved_books::saved_books_view::{saved_books_view, SortOrder};

use crate::image_resolver::{CoverResolver, ImageFetcher, ImageState};
use crate::notifications::Notifier;
use crate::persistence::PersistenceBridge;
use crate::saved_books_store::SavedBooksStore;
use crate::search_orchestrator::{SearchSession, VisibleResults};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Discover,
    Saved,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Discover, Tab::Saved];

    pub fn id(&self) -> &'static str {
        match self {
            Tab::Discover => "discover",
            Tab::Saved => "saved",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Discover => "Discover Books",
            Tab::Saved => "Saved Books",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tab::Discover => "Find new book recommendations",
            Tab::Saved => "Your personal book collection",
        }
    }
}

/// Everything the shell needs from the outside world
#[derive(Clone)]
pub struct Services {
    pub recommendations_api: Arc<dyn RecommendationsApi>,
    pub saved_books_api: Arc<dyn SavedBooksApi>,
    pub persistence: PersistenceBridge,
    pub notifier: Arc<dyn Notifier>,
    pub image_fetcher: Arc<dyn ImageFetcher>,
}

pub struct Shell {
    active_tab: Tab,
    pub search: SearchSession,
    pub saved_books: SavedBooksStore,
    pub covers: CoverResolver,
}

impl Shell {
    pub fn new(services: Services) -> Self {
        Self {
            active_tab: Tab::default(),
            search: SearchSession::new(
                services.recommendations_api,
                services.persistence,
                services.notifier.clone(),
            ),
            saved_books: SavedBooksStore::new(services.saved_books_api, services.notifier),
            covers: CoverResolver::new(services.image_fetcher),
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    /// Restores the search session, loads filter options and the saved collection
    pub async fn mount(&mut self) {
        self.search.mount().await;
        self.saved_books.init().await;
    }

    pub fn teardown(&mut self) {
        self.search.teardown();
        self.saved_books.teardown();
        self.covers.clear();
    }

    /// Resolves the covers of the books currently visible
    pub async fn refresh_covers(&mut self) {
        let requested: Vec<Option<String>> = match self.search.visible() {
            VisibleResults::Books(books) => books
                .iter()
                .map(|book| book.cover_image_url.clone())
                .collect(),
            _ => Vec::new(),
        };
        let requested: Vec<Option<&str>> = requested.iter().map(Option::as_deref).collect();
        self.covers.resolve_all(&requested).await;
    }

    /// Visible book at a one based position
    pub fn visible_book(&self, position: usize) -> Option<BookResult> {
        match self.search.visible() {
            VisibleResults::Books(books) => position
                .checked_sub(1)
                .and_then(|index| books.get(index))
                .map(|book| (*book).clone()),
            _ => None,
        }
    }

    pub fn render_tabs(&self) -> String {
        Tab::ALL
            .iter()
            .map(|tab| {
                let marker = if *tab == self.active_tab { "*" } else { " " };
                format!("{} {} ({}): {}", marker, tab.label(), tab.id(), tab.description())
            })
            .join("\n")
    }

    pub fn render_discover(&self) -> String {
        let mut out = String::new();
        match self.search.visible() {
            VisibleResults::NoData => {
                out.push_str("No recommendations yet. Try `search <query>`.\n");
            }
            VisibleResults::FilteredToZero { total } => {
                let _ = writeln!(
                    out,
                    "None of the {} books match the active filters. Adjust or clear them.",
                    total
                );
            }
            VisibleResults::Books(books) => {
                let covers = self.covers.covers();
                for (index, book) in books.iter().enumerate() {
                    let saved = if self.saved_books.is_saved(&book.title, &book.author) {
                        " [saved]"
                    } else {
                        ""
                    };
                    let year = book
                        .year()
                        .map(|year| format!(" ({})", year))
                        .unwrap_or_default();
                    let _ = writeln!(
                        out,
                        "{:>3}. {} by {}{}{}",
                        index + 1,
                        book.title,
                        book.author,
                        year,
                        saved
                    );
                    if let Some(summary) = book.summary() {
                        let _ = writeln!(out, "     {}", summary);
                    }
                    if let Some(cover) = covers.get(index) {
                        let _ = writeln!(out, "     cover: {}", cover_label(cover.state()));
                    }
                }
                let progress = self.covers.progress();
                if progress.total() > 0 {
                    let _ = writeln!(
                        out,
                        "Covers loaded: {}/{}",
                        progress.loaded(),
                        progress.total()
                    );
                }
            }
        }
        out
    }

    pub fn render_filters(&self) -> String {
        let options = self.search.filter_options();
        let criteria = &self.search.criteria().filters;
        let mut out = String::new();
        for field in FilterField::ALL {
            let active = criteria.get(field).unwrap_or("any");
            let _ = writeln!(
                out,
                "{} [{}]: {}",
                field.name(),
                active,
                options.values(field).join(", ")
            );
        }
        out
    }

    pub fn render_saved(&self, search_term: &str, sort_order: SortOrder) -> String {
        let all = self.saved_books.saved_books();
        let view = saved_books_view(all, search_term, sort_order);
        let mut out = String::new();
        let _ = writeln!(out, "Showing {} of {} saved books", view.len(), all.len());
        for (index, book) in view.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>3}. {} by {} [{}] saved {}",
                index + 1,
                book.title,
                book.author,
                book.genre,
                book.saved_at.format("%Y-%m-%d")
            );
        }
        out
    }
}

fn cover_label(state: ImageState) -> &'static str {
    match state {
        ImageState::Loading { .. } => "loading",
        ImageState::Loaded => "loaded",
        ImageState::Error => "No Cover",
    }
}

#[cfg(test)]
mod shell_tests {
    use anyhow::bail;

    use bookfinder_recommendations::api::{FilterOptions, RecommendationRequest};
    use bookfinder_saved_books::api::{NewSavedBook, SaveBookResponse, SavedBook};

    use super::*;
    use crate::image_resolver::ImageLoadError;
    use crate::notifications::RecordingNotifier;
    use crate::persistence::InMemoryKeyValueStore;

    struct Catalog;

    #[async_trait::async_trait]
    impl RecommendationsApi for Catalog {
        async fn get_recommendations(
            &self,
            request: RecommendationRequest,
        ) -> anyhow::Result<Vec<BookResult>> {
            Ok((0..request.count + 5)
                .map(|i| BookResult::new(format!("Book {}", i), "Author"))
                .collect())
        }

        async fn get_filters(&self) -> anyhow::Result<FilterOptions> {
            Ok(FilterOptions::fallback())
        }
    }

    struct Offline;

    #[async_trait::async_trait]
    impl SavedBooksApi for Offline {
        async fn list_saved_books(&self) -> anyhow::Result<Vec<SavedBook>> {
            bail!("offline")
        }

        async fn add_saved_book(&self, _book: NewSavedBook) -> anyhow::Result<SaveBookResponse> {
            bail!("offline")
        }

        async fn remove_saved_book(&self, _id: &str) -> anyhow::Result<()> {
            bail!("offline")
        }
    }

    struct Images;

    #[async_trait::async_trait]
    impl ImageFetcher for Images {
        async fn fetch(&self, _source: &str) -> Result<(), ImageLoadError> {
            Ok(())
        }
    }

    fn shell() -> (Arc<RecordingNotifier>, Shell) {
        let notifier = Arc::new(RecordingNotifier::default());
        let services = Services {
            recommendations_api: Arc::new(Catalog),
            saved_books_api: Arc::new(Offline),
            persistence: PersistenceBridge::new(Arc::new(InMemoryKeyValueStore::default())),
            notifier: notifier.clone(),
            image_fetcher: Arc::new(Images),
        };
        (notifier, Shell::new(services))
    }

    #[test]
    fn test_tabs() {
        let (_, mut shell) = shell();
        assert_eq!(shell.active_tab(), Tab::Discover);
        assert!(shell.render_tabs().starts_with("* Discover Books (discover)"));

        shell.select_tab(Tab::Saved);
        assert_eq!(shell.active_tab().id(), "saved");
        assert_eq!(shell.active_tab().description(), "Your personal book collection");
    }

    #[tokio::test]
    /// Mounts the shell, searches and resolves covers of the visible books
    async fn test_mount_search_and_covers() {
        let (notifier, mut shell) = shell();
        shell.mount().await;
        assert_eq!(shell.saved_books.error(), Some("offline"));
        assert_eq!(notifier.messages(), vec!["offline".to_string()]);
        assert!(shell.render_discover().starts_with("No recommendations yet"));

        shell.search.set_query("anything");
        shell.search.search().await.unwrap();
        shell.refresh_covers().await;

        assert_eq!(shell.covers.covers().len(), 20);
        assert!(shell.covers.progress().is_complete());
        assert_eq!(shell.visible_book(1).unwrap().title, "Book 0");
        assert_eq!(shell.visible_book(0), None);
        assert_eq!(shell.visible_book(21), None);
        assert!(shell.render_discover().contains("Covers loaded: 20/20"));
        assert!(shell.render_filters().contains("language [any]: English"));

        shell.teardown();
        assert!(shell.covers.covers().is_empty());
        assert!(shell.search.books().is_empty());
    }
}
