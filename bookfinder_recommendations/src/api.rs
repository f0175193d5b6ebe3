use paperclip::actix::Apiv2Schema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::size_range::SizeRange;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Official purchase or access link of a book
pub struct BookLink {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
}

/// Decodes an optional field, a value of an unexpected type reads as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value::<Option<T>>(value).ok().flatten())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// One recommended book as returned by the recommendations endpoint
pub struct BookResult {
    pub title: String,
    pub author: String,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub genre: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_image_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub year_published: Option<i32>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub publisher: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub language: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub book_links: Option<Vec<BookLink>>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_audience: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub book_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub reading_level: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub pages: Option<u32>,
    // Legacy names still produced by some generator versions
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub brief_summary: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub short_description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub publication_year: Option<i32>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub isbn: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_count: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub series_info: Option<String>,
    /// Downloadable resource, filled by response normalization when the item only carries it under another name
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub pdf_url: Option<String>,
}

impl BookResult {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.year_published.or(self.publication_year)
    }

    /// First non-empty of description, brief summary and short description
    pub fn summary(&self) -> Option<&str> {
        [
            &self.description,
            &self.brief_summary,
            &self.short_description,
        ]
        .into_iter()
        .filter_map(|text| text.as_deref())
        .find(|text| !text.is_empty())
    }

    pub fn page_total(&self) -> Option<u32> {
        self.pages.or(self.page_count)
    }

    /// Value of the categorical field used by the given filter
    pub fn category(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Language => self.language.as_deref(),
            FilterField::TargetAudience => self.target_audience.as_deref(),
            FilterField::BookType => self.book_type.as_deref(),
            FilterField::ContentType => self.content_type.as_deref(),
            FilterField::ReadingLevel => self.reading_level.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    Language,
    TargetAudience,
    BookType,
    ContentType,
    ReadingLevel,
}

impl FilterField {
    pub const ALL: [FilterField; 5] = [
        FilterField::Language,
        FilterField::TargetAudience,
        FilterField::BookType,
        FilterField::ContentType,
        FilterField::ReadingLevel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FilterField::Language => "language",
            FilterField::TargetAudience => "target_audience",
            FilterField::BookType => "book_type",
            FilterField::ContentType => "content_type",
            FilterField::ReadingLevel => "reading_level",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Optional categorical constraints. A present value is never blank and never has surrounding whitespace.
pub struct CategoryFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    book_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reading_level: Option<String>,
}

impl CategoryFilters {
    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.slot(field)
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Sets a filter value, a blank value clears the filter
    pub fn set(&mut self, field: FilterField, value: Option<&str>) {
        *self.slot_mut(field) = value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
    }

    pub fn with(mut self, field: FilterField, value: &str) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when no filter carries a value
    pub fn is_empty(&self) -> bool {
        FilterField::ALL.iter().all(|field| self.get(*field).is_none())
    }

    pub fn active(&self) -> impl Iterator<Item = (FilterField, &str)> + '_ {
        FilterField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }

    fn slot(&self, field: FilterField) -> &Option<String> {
        match field {
            FilterField::Language => &self.language,
            FilterField::TargetAudience => &self.target_audience,
            FilterField::BookType => &self.book_type,
            FilterField::ContentType => &self.content_type,
            FilterField::ReadingLevel => &self.reading_level,
        }
    }

    fn slot_mut(&mut self, field: FilterField) -> &mut Option<String> {
        match field {
            FilterField::Language => &mut self.language,
            FilterField::TargetAudience => &mut self.target_audience,
            FilterField::BookType => &mut self.book_type,
            FilterField::ContentType => &mut self.content_type,
            FilterField::ReadingLevel => &mut self.reading_level,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// What the user asked for: free text, how many books and optional filters
pub struct SearchCriteria {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub range: SizeRange,
    #[serde(default)]
    pub get_all_available: bool,
    #[serde(flatten)]
    pub filters: CategoryFilters,
}

impl SearchCriteria {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Body of POST /books/recommendations
pub struct RecommendationRequest {
    pub query: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct FilterOption {
    pub value: String,
    pub description: String,
}

impl FilterOption {
    fn new(value: &str, description: &str) -> Self {
        Self {
            value: value.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
/// Vocabulary advertised by the server for each filter, used to populate choices only
pub struct FilterOptions {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub target_audiences: Vec<FilterOption>,
    #[serde(default)]
    pub book_types: Vec<FilterOption>,
    #[serde(default)]
    pub content_types: Vec<FilterOption>,
    #[serde(default)]
    pub reading_levels: Vec<FilterOption>,
}

impl FilterOptions {
    /// Vocabulary used when the server cannot provide one
    pub fn fallback() -> Self {
        Self {
            languages: [
                "English",
                "Spanish",
                "French",
                "German",
                "Italian",
                "Portuguese",
                "Japanese",
                "Chinese",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            target_audiences: vec![
                FilterOption::new("children", "Ages 4-12"),
                FilterOption::new("young_adult", "Ages 13-18"),
                FilterOption::new("adult", "Adult readers"),
                FilterOption::new("general", "Suitable for all ages"),
            ],
            book_types: vec![
                FilterOption::new("fiction", "Fiction"),
                FilterOption::new("non_fiction", "Non-fiction"),
                FilterOption::new("biography", "Biography"),
            ],
            content_types: vec![
                FilterOption::new("novel", "Novel"),
                FilterOption::new("short_stories", "Short stories"),
                FilterOption::new("poetry", "Poetry"),
            ],
            reading_levels: vec![
                FilterOption::new("beginner", "Beginner"),
                FilterOption::new("intermediate", "Intermediate"),
                FilterOption::new("advanced", "Advanced"),
            ],
        }
    }

    /// Allowed values of a filter, in advertised order
    pub fn values(&self, field: FilterField) -> Vec<&str> {
        match field {
            FilterField::Language => self.languages.iter().map(String::as_str).collect(),
            FilterField::TargetAudience => option_values(&self.target_audiences),
            FilterField::BookType => option_values(&self.book_types),
            FilterField::ContentType => option_values(&self.content_types),
            FilterField::ReadingLevel => option_values(&self.reading_levels),
        }
    }
}

fn option_values(options: &[FilterOption]) -> Vec<&str> {
    options.iter().map(|option| option.value.as_str()).collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
/// Error body returned by the backend
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<String>,
}

#[async_trait::async_trait]
pub trait RecommendationsApi: Send + Sync {
    /// Requests recommendations, returns normalized books in server order
    async fn get_recommendations(
        &self,
        request: RecommendationRequest,
    ) -> anyhow::Result<Vec<BookResult>>;

    /// Retrieves the filter vocabulary
    async fn get_filters(&self) -> anyhow::Result<FilterOptions>;
}
