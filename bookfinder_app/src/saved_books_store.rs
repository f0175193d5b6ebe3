use std::sync::Arc;

use bookfinder_recommendations::api::BookResult;
use bookfinder_saved_books::api::{
    NewSavedBook, SaveBookResponse, SavedBook, SavedBookId, SavedBooksApi,
};

use crate::error::AppError;
use crate::notifications::Notifier;

const ALREADY_SAVED: &str = "Book is already saved to your collection";
const UNKNOWN_GENRE: &str = "Unknown";

/// Body posted when saving a recommended book
pub fn saved_book_projection(book: &BookResult) -> NewSavedBook {
    NewSavedBook {
        title: book.title.clone(),
        author: book.author.clone(),
        genre: book
            .genre
            .clone()
            .filter(|genre| !genre.is_empty())
            .unwrap_or_else(|| UNKNOWN_GENRE.to_string()),
        summary: book.summary().unwrap_or_default().to_string(),
        cover_image_url: book.cover_image_url.clone(),
        rating: book.rating,
        isbn: book.isbn.clone(),
        publication_year: book.year(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Saved(SavedBookId),
    Removed,
}

/// Local copy of the user's collection kept in sync with the saved books API
pub struct SavedBooksStore {
    api: Arc<dyn SavedBooksApi>,
    notifier: Arc<dyn Notifier>,
    saved_books: Vec<SavedBook>,
    error: Option<String>,
}

impl SavedBooksStore {
    pub fn new(api: Arc<dyn SavedBooksApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            saved_books: Vec::new(),
            error: None,
        }
    }

    /// Newest first
    pub fn saved_books(&self) -> &[SavedBook] {
        &self.saved_books
    }

    /// Message of the last failed fetch
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn init(&mut self) {
        // Failures are already reported through the notifier
        let _ = self.fetch().await;
    }

    /// Replaces the local collection with the server one
    pub async fn fetch(&mut self) -> Result<(), AppError> {
        self.error = None;
        match self.api.list_saved_books().await {
            Ok(saved_books) => {
                tracing::info!("Fetched {} saved books", saved_books.len());
                self.saved_books = saved_books;
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!("Failed to fetch saved books: {:#}", err);
                self.notifier.error(&message);
                self.error = Some(message);
                Err(AppError::Network(err))
            }
        }
    }

    pub async fn save(&mut self, book: NewSavedBook) -> Result<SavedBookId, AppError> {
        let title = book.title.clone();
        match self.api.add_saved_book(book).await {
            Ok(SaveBookResponse::Created(saved)) => {
                let id = saved.id.clone();
                self.saved_books.insert(0, saved);
                self.notifier
                    .success(&format!("\"{}\" saved to your collection!", title));
                Ok(id)
            }
            Ok(SaveBookResponse::AlreadySaved) => {
                tracing::info!("{} is already saved", title);
                self.notifier.error(ALREADY_SAVED);
                Err(AppError::Conflict(ALREADY_SAVED.to_string()))
            }
            Err(err) => {
                tracing::error!("Failed to save {}: {:#}", title, err);
                self.notifier.error(&err.to_string());
                Err(AppError::Network(err))
            }
        }
    }

    pub async fn remove(&mut self, id: &str) -> Result<(), AppError> {
        match self.api.remove_saved_book(id).await {
            Ok(()) => {
                self.saved_books.retain(|book| book.id != id);
                self.notifier.success("Book removed from your collection");
                Ok(())
            }
            Err(err) => {
                tracing::error!("Failed to remove saved book {}: {:#}", id, err);
                self.notifier.error(&err.to_string());
                Err(AppError::Network(err))
            }
        }
    }

    /// Looks at the local collection only
    pub fn is_saved(&self, title: &str, author: &str) -> bool {
        self.id_for(title, author).is_some()
    }

    pub fn id_for(&self, title: &str, author: &str) -> Option<&str> {
        self.saved_books
            .iter()
            .find(|book| book.is_same_book(title, author))
            .map(|book| book.id.as_str())
    }

    /// Removes a saved recommendation, saves it otherwise
    pub async fn toggle(&mut self, book: &BookResult) -> Result<Toggled, AppError> {
        match self.id_for(&book.title, &book.author).map(str::to_string) {
            Some(id) => self.remove(&id).await.map(|_| Toggled::Removed),
            None => self
                .save(saved_book_projection(book))
                .await
                .map(Toggled::Saved),
        }
    }

    pub fn teardown(&mut self) {
        self.saved_books.clear();
        self.error = None;
    }
}
