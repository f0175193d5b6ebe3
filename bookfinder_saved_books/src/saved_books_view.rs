use std::cmp::Ordering;

use itertools::Itertools;

use crate::api::SavedBook;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
    Author,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "newest" => Some(SortOrder::Newest),
            "oldest" => Some(SortOrder::Oldest),
            "title" => Some(SortOrder::Title),
            "author" => Some(SortOrder::Author),
            _ => None,
        }
    }

    fn compare(&self, a: &SavedBook, b: &SavedBook) -> Ordering {
        match self {
            SortOrder::Newest => b.saved_at.cmp(&a.saved_at),
            SortOrder::Oldest => a.saved_at.cmp(&b.saved_at),
            SortOrder::Title => compare_text(&a.title, &b.title),
            SortOrder::Author => compare_text(&a.author, &b.author),
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn matches_term(book: &SavedBook, term: &str) -> bool {
    [&book.title, &book.author, &book.genre]
        .iter()
        .any(|field| field.to_lowercase().contains(term))
}

/// Books of the collection containing the term in title, author or genre, in the requested order
pub fn saved_books_view<'a>(
    saved_books: &'a [SavedBook],
    search_term: &str,
    sort_order: SortOrder,
) -> Vec<&'a SavedBook> {
    let term = search_term.to_lowercase();
    saved_books
        .iter()
        .filter(|book| matches_term(book, &term))
        .sorted_by(|a, b| sort_order.compare(a, b))
        .collect()
}
