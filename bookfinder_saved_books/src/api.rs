use chrono::{DateTime, Utc};
use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type SavedBookId = String;
pub type UserId = String;

/// Books are the same when title and author match ignoring case. Whitespace is significant.
pub fn is_same_book(title: &str, author: &str, other_title: &str, other_author: &str) -> bool {
    title.to_lowercase() == other_title.to_lowercase()
        && author.to_lowercase() == other_author.to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Apiv2Schema)]
/// Body of POST /saved-books/
pub struct NewSavedBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Book stored in the user's collection, never modified after creation
pub struct SavedBook {
    pub id: SavedBookId,
    pub user_id: UserId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    pub saved_at: DateTime<Utc>,
}

impl SavedBook {
    pub fn from_new(
        id: SavedBookId,
        user_id: UserId,
        book: NewSavedBook,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            summary: book.summary,
            cover_image_url: book.cover_image_url,
            rating: book.rating,
            isbn: book.isbn,
            publication_year: book.publication_year,
            saved_at,
        }
    }

    pub fn is_same_book(&self, title: &str, author: &str) -> bool {
        is_same_book(&self.title, &self.author, title, author)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveBookResponse {
    Created(SavedBook),
    /// The collection already holds the same title and author
    AlreadySaved,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
/// Error body returned by the backend
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<String>,
}

#[async_trait::async_trait]
pub trait SavedBooksApi: Send + Sync {
    /// Lists the whole collection of the current user
    async fn list_saved_books(&self) -> anyhow::Result<Vec<SavedBook>>;
    /// Adds a book, a duplicate is reported as `AlreadySaved` rather than an error
    async fn add_saved_book(&self, book: NewSavedBook) -> anyhow::Result<SaveBookResponse>;
    /// Removes a book from the collection
    async fn remove_saved_book(&self, id: &str) -> anyhow::Result<()>;
}

#[cfg(test)]
mod api_tests {
    use super::*;

    #[test]
    fn test_same_book_ignores_case_but_not_whitespace() {
        assert!(is_same_book("Dune", "Frank Herbert", "DUNE", "frank herbert"));
        assert!(!is_same_book("Dune", "Frank Herbert", "Dune ", "Frank Herbert"));
        assert!(!is_same_book("Dune", "Frank Herbert", "Dune", "Brian Herbert"));
    }

    #[test]
    fn test_saved_book_decodes_server_payload() {
        let book: SavedBook = serde_json::from_value(serde_json::json!({
            "id": "42",
            "user_id": "u1",
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "Science Fiction",
            "summary": "Spice",
            "saved_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(book.id, "42");
        assert_eq!(book.cover_image_url, None);
        assert_eq!(book.saved_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }
}
