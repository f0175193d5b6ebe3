pub use in_memory_books_catalog::InMemoryBooksCatalog;

use crate::api::BookResult;

mod in_memory_books_catalog;

/// Source of recommendations served by the local stub backend
#[async_trait::async_trait]
pub trait BooksCatalog: Send + Sync {
    /// Adds a book that may later be recommended
    async fn add_book(&self, book: BookResult);
    /// Returns up to `count` books matching the query, in catalog order
    async fn recommend(&self, query: &str, count: usize) -> Vec<BookResult>;
}
