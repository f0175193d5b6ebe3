pub use in_memory_saved_books_repository::InMemorySavedBooksRepository;

use crate::api::{NewSavedBook, SavedBook, SavedBookId, UserId};

mod in_memory_saved_books_repository;

#[derive(Debug, thiserror::Error)]
pub enum SavedBooksRepositoryError {
    #[error("Saved book {0} not found")]
    NotFound(SavedBookId),

    #[error("Book {0} is already saved to your collection")]
    AlreadySaved(String),
}

#[async_trait::async_trait]
pub trait SavedBooksRepository: Send + Sync {
    /// Adds a book to the user's collection, fails when the same title and author are already there
    async fn add_saved_book(
        &self,
        user_id: &UserId,
        book: NewSavedBook,
    ) -> Result<SavedBook, SavedBooksRepositoryError>;

    /// Lists the user's collection, most recently saved first
    async fn list_saved_books(&self, user_id: &UserId) -> Vec<SavedBook>;

    async fn remove_saved_book(
        &self,
        user_id: &UserId,
        id: &str,
    ) -> Result<(), SavedBooksRepositoryError>;
}
