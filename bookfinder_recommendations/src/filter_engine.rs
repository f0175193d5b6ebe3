use std::collections::BTreeMap;

use itertools::Itertools;

use crate::api::{BookResult, CategoryFilters, FilterField};

/// Single field predicate: no filter passes, a missing book value fails,
/// otherwise both sides are compared trimmed and case folded.
pub fn matches_filter(book_value: Option<&str>, filter_value: Option<&str>) -> bool {
    let Some(filter_value) = filter_value.map(str::trim).filter(|v| !v.is_empty()) else {
        return true;
    };
    match book_value.filter(|v| !v.is_empty()) {
        Some(book_value) => book_value.trim().to_lowercase() == filter_value.to_lowercase(),
        None => false,
    }
}

pub fn passes_filters(book: &BookResult, filters: &CategoryFilters) -> bool {
    FilterField::ALL
        .iter()
        .all(|field| matches_filter(book.category(*field), filters.get(*field)))
}

/// Narrows books to the ones passing every active filter, keeping server order.
/// Without active filters the input is returned as is.
pub fn filter_books<'a>(books: &'a [BookResult], filters: &CategoryFilters) -> Vec<&'a BookResult> {
    if filters.is_empty() {
        return books.iter().collect();
    }

    let filtered = books
        .iter()
        .filter(|book| passes_filters(book, filters))
        .collect_vec();

    tracing::debug!(
        "Filter results: {}/{} books matched {:?}",
        filtered.len(),
        books.len(),
        filters
    );
    if filtered.is_empty() && !books.is_empty() {
        tracing::debug!("Available filter values: {:?}", available_values(books));
    }
    filtered
}

/// Distinct values present in the books for every filter field
pub fn available_values(books: &[BookResult]) -> BTreeMap<FilterField, Vec<String>> {
    FilterField::ALL
        .into_iter()
        .map(|field| {
            let values = books
                .iter()
                .filter_map(|book| book.category(field))
                .filter(|value| !value.is_empty())
                .unique()
                .map(str::to_string)
                .collect();
            (field, values)
        })
        .collect()
}
