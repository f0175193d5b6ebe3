use std::sync::Arc;

use bookfinder_recommendations::api::{
    BookResult, FilterField, FilterOptions, RecommendationsApi, SearchCriteria,
};
use bookfinder_recommendations::filter_engine::filter_books;
use bookfinder_recommendations::query::recommendation_request;
use bookfinder_recommendations::size_range::SizeRange;

use crate::error::AppError;
use crate::notifications::Notifier;
use crate::persistence::PersistenceBridge;

const EMPTY_QUERY: &str = "Please enter a search query";
const NO_BOOKS_FOUND: &str = "No books found. Try a different search query or adjust your filters.";

/// What the result area shows
#[derive(Debug, PartialEq)]
pub enum VisibleResults<'a> {
    /// No search produced results yet
    NoData,
    /// Results exist but none passes the active filters
    FilteredToZero { total: usize },
    Books(Vec<&'a BookResult>),
}

/// Search form, last results and filter vocabulary of the discover view
pub struct SearchSession {
    recommendations_api: Arc<dyn RecommendationsApi>,
    persistence: PersistenceBridge,
    notifier: Arc<dyn Notifier>,
    criteria: SearchCriteria,
    books: Vec<BookResult>,
    filter_options: FilterOptions,
    show_filters: bool,
}

impl SearchSession {
    pub fn new(
        recommendations_api: Arc<dyn RecommendationsApi>,
        persistence: PersistenceBridge,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            recommendations_api,
            persistence,
            notifier,
            criteria: SearchCriteria::default(),
            books: Vec::new(),
            filter_options: FilterOptions::default(),
            show_filters: false,
        }
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn books(&self) -> &[BookResult] {
        &self.books
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.filter_options
    }

    pub fn show_filters(&self) -> bool {
        self.show_filters
    }

    /// Brings back the form, results and filter panel state of the previous session
    pub fn restore(&mut self) {
        let books = self.persistence.load_results();
        if !books.is_empty() {
            self.notifier.success(&format!(
                "Restored {} book recommendations from previous search",
                books.len()
            ));
            self.books = books;
        }
        if let Some(criteria) = self.persistence.load_search_form() {
            self.criteria = criteria;
        }
        self.show_filters = self.persistence.load_show_filters();
    }

    pub async fn load_filter_options(&mut self) {
        self.filter_options = match self.recommendations_api.get_filters().await {
            Ok(options) => options,
            Err(err) => {
                tracing::error!("Error loading filters: {:#}", err);
                self.notifier
                    .error("Failed to load filter options - using defaults");
                FilterOptions::fallback()
            }
        };
    }

    pub async fn mount(&mut self) {
        self.restore();
        self.load_filter_options().await;
    }

    pub fn set_query(&mut self, query: &str) {
        self.criteria.query = query.to_string();
        self.persist_form();
    }

    pub fn set_range(&mut self, range: SizeRange) {
        self.criteria.range = range;
        self.persist_form();
    }

    pub fn set_get_all_available(&mut self, get_all_available: bool) {
        self.criteria.get_all_available = get_all_available;
        self.persist_form();
    }

    /// Sets one filter, a blank or missing value clears it
    pub fn set_filter(&mut self, field: FilterField, value: Option<&str>) {
        self.criteria.filters.set(field, value);
        self.persist_form();
    }

    pub fn clear_filters(&mut self) {
        self.criteria.filters.clear();
        self.persist_form();
        self.notifier.success("Filters cleared");
    }

    pub fn has_active_filters(&self) -> bool {
        !self.criteria.filters.is_empty()
    }

    pub fn toggle_filters(&mut self) -> bool {
        self.show_filters = !self.show_filters;
        self.persistence.save_show_filters(self.show_filters);
        self.show_filters
    }

    fn persist_form(&self) {
        self.persistence.save_search_form(&self.criteria);
    }

    /// Runs the current criteria against the recommendations API.
    /// Returns the number of books received.
    pub async fn search(&mut self) -> Result<usize, AppError> {
        if self.criteria.query.trim().is_empty() {
            self.notifier.error(EMPTY_QUERY);
            return Err(AppError::Validation(EMPTY_QUERY.to_string()));
        }

        let request = recommendation_request(&self.criteria);
        tracing::info!("Starting search with query {:?}", request.query);
        match self.recommendations_api.get_recommendations(request).await {
            Ok(books) if books.is_empty() => {
                tracing::warn!("No recommendations returned");
                self.books.clear();
                self.notifier.error(NO_BOOKS_FOUND);
                Ok(0)
            }
            Ok(books) => {
                let count = books.len();
                self.persistence.save_results(&books);
                self.books = books;
                self.notifier
                    .success(&format!("Found {} book recommendations!", count));
                Ok(count)
            }
            Err(err) => {
                tracing::error!("Search failed: {:#}", err);
                self.books.clear();
                self.notifier.error(&err.to_string());
                Err(AppError::Network(err))
            }
        }
    }

    pub fn filtered_books(&self) -> Vec<&BookResult> {
        filter_books(&self.books, &self.criteria.filters)
    }

    /// How many books are shown for the selected range
    pub fn display_limit(&self) -> usize {
        self.criteria.range.requested_count()
    }

    pub fn visible(&self) -> VisibleResults<'_> {
        if self.books.is_empty() {
            return VisibleResults::NoData;
        }
        let filtered = self.filtered_books();
        if filtered.is_empty() {
            return VisibleResults::FilteredToZero {
                total: self.books.len(),
            };
        }
        VisibleResults::Books(filtered.into_iter().take(self.display_limit()).collect())
    }

    /// Forgets persisted search state and resets the form
    pub fn clear_persisted(&mut self) {
        self.persistence.clear_search_state();
        self.books.clear();
        self.criteria = SearchCriteria::default();
        self.show_filters = false;
        self.notifier.success("Search history cleared");
    }

    pub fn teardown(&mut self) {
        self.books.clear();
        self.filter_options = FilterOptions::default();
    }
}
