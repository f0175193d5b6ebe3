use itertools::Itertools;

use crate::api::BookResult;
use crate::books_catalog::BooksCatalog;

/// Marker the client uses to append filter hints to the free text
const FILTER_HINTS_MARKER: &str = " (specifically:";

#[derive(Default)]
pub struct InMemoryBooksCatalog {
    books: parking_lot::RwLock<Vec<BookResult>>,
}

impl InMemoryBooksCatalog {
    pub fn with_books(books: Vec<BookResult>) -> Self {
        Self {
            books: parking_lot::RwLock::new(books),
        }
    }
}

fn query_words(query: &str) -> Vec<String> {
    let free_text = query
        .split_once(FILTER_HINTS_MARKER)
        .map(|(text, _)| text)
        .unwrap_or(query);
    free_text
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|word| word.len() > 2)
        .unique()
        .collect()
}

fn book_matches(book: &BookResult, words: &[String]) -> bool {
    let haystack = [
        Some(book.title.as_str()),
        Some(book.author.as_str()),
        book.genre.as_deref(),
        book.summary(),
    ]
    .into_iter()
    .flatten()
    .map(str::to_lowercase)
    .join(" ");
    words.iter().any(|word| haystack.contains(word.as_str()))
}

#[async_trait::async_trait]
impl BooksCatalog for InMemoryBooksCatalog {
    async fn add_book(&self, book: BookResult) {
        self.books.write().push(book);
    }

    async fn recommend(&self, query: &str, count: usize) -> Vec<BookResult> {
        let words = query_words(query);
        let books = self.books.read();
        let matching = books
            .iter()
            .filter(|book| book_matches(book, &words))
            .take(count)
            .cloned()
            .collect_vec();
        if matching.is_empty() {
            tracing::info!("No catalog match for {:?}, recommending anything", words);
            books.iter().take(count).cloned().collect()
        } else {
            matching
        }
    }
}
