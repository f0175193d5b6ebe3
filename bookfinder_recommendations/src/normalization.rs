use std::sync::OnceLock;

use serde_json::{json, Value};

use crate::api::BookResult;

/// Field names that may hold a downloadable resource, most specific first
pub const RESOURCE_URL_KEYS: [&str; 8] = [
    "pdf_url",
    "download_url",
    "pdf_link",
    "file_url",
    "resource_url",
    "url",
    "link",
    "download_link",
];

/// Wrappers the generator sometimes nests the book under, `None` is the item itself
const ITEM_SCOPES: [Option<&str>; 3] = [None, Some("book"), Some("data")];
const NESTED_SECTIONS: [&str; 2] = ["metadata", "ai"];
const LINKS_FIELD: &str = "links";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleLocation {
    /// `scope.key`
    Field(&'static str),
    /// `scope.section.key`
    Nested(&'static str, &'static str),
    /// first `.pdf` entry of `scope.links`
    PdfLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One place a resource url may be found, lower priority wins
pub struct ResourceUrlRule {
    pub scope: Option<&'static str>,
    pub location: RuleLocation,
    pub priority: usize,
}

impl ResourceUrlRule {
    fn lookup<'a>(&self, item: &'a Value) -> Option<&'a str> {
        let scope = match self.scope {
            Some(wrapper) => item.get(wrapper)?,
            None => item,
        };
        if !scope.is_object() {
            return None;
        }
        match self.location {
            RuleLocation::Field(key) => non_empty_str(scope.get(key)?),
            RuleLocation::Nested(section, key) => {
                let section = scope.get(section).filter(|s| s.is_object())?;
                non_empty_str(section.get(key)?)
            }
            RuleLocation::PdfLink => scope
                .get(LINKS_FIELD)?
                .as_array()?
                .iter()
                .find_map(pdf_href),
        }
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn pdf_href(link: &Value) -> Option<&str> {
    let href = match link {
        Value::String(href) => href.as_str(),
        Value::Object(object) => object.get("href")?.as_str()?,
        _ => return None,
    };
    href.ends_with(".pdf").then_some(href)
}

/// Ordered rules used to find a resource url in a raw recommendation item
pub fn resource_url_rules() -> &'static [ResourceUrlRule] {
    static RULES: OnceLock<Vec<ResourceUrlRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let mut locations = Vec::new();
        for scope in ITEM_SCOPES {
            locations.extend(
                RESOURCE_URL_KEYS
                    .iter()
                    .map(|&key| (scope, RuleLocation::Field(key))),
            );
            for section in NESTED_SECTIONS {
                locations.extend(
                    RESOURCE_URL_KEYS
                        .iter()
                        .map(|&key| (scope, RuleLocation::Nested(section, key))),
                );
            }
            locations.push((scope, RuleLocation::PdfLink));
        }
        locations
            .into_iter()
            .enumerate()
            .map(|(priority, (scope, location))| ResourceUrlRule {
                scope,
                location,
                priority,
            })
            .collect()
    })
}

/// Best effort resource url of a raw item
pub fn resource_url(item: &Value) -> Option<&str> {
    resource_url_rules()
        .iter()
        .find_map(|rule| rule.lookup(item))
}

/// Accepts a bare array or an object with `recommendations`, anything else has no items
pub fn extract_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("recommendations") {
            Some(Value::Array(items)) => items,
            _ => {
                tracing::warn!("Response has no recommendations field");
                vec![]
            }
        },
        other => {
            tracing::warn!("Unexpected recommendations response {}", other);
            vec![]
        }
    }
}

pub fn normalize_item(mut item: Value) -> Result<BookResult, serde_json::Error> {
    if let Some(url) = resource_url(&item).map(str::to_string) {
        json_patch::merge(&mut item, &json!({ "pdf_url": url }));
    }
    serde_json::from_value(item)
}

/// Turns a raw response body into books, items that are not books are skipped
pub fn normalize_response(body: Value) -> Vec<BookResult> {
    extract_items(body)
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match normalize_item(item) {
            Ok(book) => Some(book),
            Err(err) => {
                tracing::warn!("Skipping recommendation {} that failed to decode: {}", index, err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod normalization_tests {
    use super::*;

    #[test]
    fn test_both_response_shapes_are_accepted() {
        let bare = json!([{"title": "A", "author": "X"}, {"title": "B", "author": "Y"}]);
        let wrapped = json!({"recommendations": [{"title": "A", "author": "X"}, {"title": "B", "author": "Y"}]});

        assert_eq!(normalize_response(bare), normalize_response(wrapped.clone()));
        assert_eq!(normalize_response(wrapped).len(), 2);
        assert!(normalize_response(json!({"message": "nothing"})).is_empty());
        assert!(normalize_response(json!("oops")).is_empty());
    }

    #[test]
    fn test_items_without_title_are_skipped() {
        let books = normalize_response(json!([{"author": "X"}, {"title": "B", "author": "Y"}]));
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "B");
    }

    #[test]
    fn test_optional_fields_of_unexpected_type_keep_the_book() {
        let books = normalize_response(json!([
            {"title": "A", "author": "X", "year_published": "1965"},
            {"title": "B", "author": "X", "rating": "4.5"},
            {"title": "C", "author": "X", "book_links": [{"url": "https://shop/c"}]},
            {"title": "D", "author": "X", "pages": 350.5, "description": 7},
            {"title": "E", "author": "X", "year_published": 1965, "rating": null}
        ]));

        let titles: Vec<&str> = books.iter().map(|book| book.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(books[0].year_published, None);
        assert_eq!(books[1].rating, None);
        let links = books[2].book_links.as_ref().unwrap();
        assert_eq!(links[0].url, "https://shop/c");
        assert_eq!(links[0].source, "");
        assert_eq!(books[3].pages, None);
        assert_eq!(books[3].description, None);
        assert_eq!(books[4].year(), Some(1965));
    }

    #[test]
    fn test_existing_pdf_url_wins() {
        let book = normalize_item(json!({
            "title": "A", "author": "X",
            "pdf_url": "https://a/a.pdf",
            "download_url": "https://a/other.pdf"
        }))
        .unwrap();
        assert_eq!(book.pdf_url.as_deref(), Some("https://a/a.pdf"));
    }

    #[test]
    fn test_resource_url_priority() {
        let item = json!({
            "title": "A", "author": "X",
            "pdf_url": "",
            "link": "https://top/link",
            "metadata": {"download_url": "https://meta/download"}
        });
        assert_eq!(resource_url(&item), Some("https://top/link"));

        let nested = json!({
            "title": "A", "author": "X",
            "metadata": "not an object",
            "ai": {"file_url": "https://ai/file"},
            "links": ["https://links/a.pdf"]
        });
        assert_eq!(resource_url(&nested), Some("https://ai/file"));
    }

    #[test]
    fn test_pdf_links_and_wrappers() {
        let links = json!({
            "title": "A", "author": "X",
            "links": ["https://x/page.html", {"href": "https://x/book.pdf"}]
        });
        assert_eq!(
            normalize_item(links).unwrap().pdf_url.as_deref(),
            Some("https://x/book.pdf")
        );

        let wrapped = json!({
            "title": "A", "author": "X",
            "book": {"metadata": {"pdf_link": "https://book/meta.pdf"}},
            "data": {"url": "https://data/url"}
        });
        assert_eq!(resource_url(&wrapped), Some("https://book/meta.pdf"));

        let nothing = json!({"title": "A", "author": "X", "links": "https://x/a.pdf"});
        assert_eq!(normalize_item(nothing).unwrap().pdf_url, None);
    }

    #[test]
    fn test_rules_are_ordered_by_priority() {
        let rules = resource_url_rules();
        assert_eq!(rules.len(), 3 * (RESOURCE_URL_KEYS.len() * 3 + 1));
        assert!(rules.windows(2).all(|w| w[0].priority < w[1].priority));
        assert_eq!(rules[0].location, RuleLocation::Field("pdf_url"));
        assert_eq!(rules[0].scope, None);
    }
}
