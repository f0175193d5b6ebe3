use itertools::Itertools;

use crate::api::{FilterField, RecommendationRequest, SearchCriteria};

/// Human readable hint describing one active filter
fn filter_clause(field: FilterField, value: &str) -> String {
    match field {
        FilterField::Language => format!("in {} language", value),
        FilterField::TargetAudience => format!("for {} audience", value),
        FilterField::BookType => format!("{} books", value),
        FilterField::ContentType => format!("{} format", value.replacen('_', " ", 1)),
        FilterField::ReadingLevel => format!("at {} reading level", value),
    }
}

/// Appends the active filters to the free text query.
/// The generator treats them as hints only, the filter engine enforces them on the results.
pub fn augment_query(criteria: &SearchCriteria) -> String {
    let clauses = criteria
        .filters
        .active()
        .map(|(field, value)| filter_clause(field, value))
        .join(", ");

    if clauses.is_empty() {
        criteria.query.clone()
    } else {
        format!("{} (specifically: {})", criteria.query, clauses)
    }
}

pub fn recommendation_request(criteria: &SearchCriteria) -> RecommendationRequest {
    RecommendationRequest {
        query: augment_query(criteria),
        count: criteria.range.requested_count(),
    }
}

#[cfg(test)]
mod query_tests {
    use super::*;
    use crate::api::CategoryFilters;
    use crate::size_range::SizeRange;

    #[test]
    fn test_query_without_filters_is_unchanged() {
        let criteria = SearchCriteria::new("mystery novels");
        assert_eq!(augment_query(&criteria), "mystery novels");
    }

    #[test]
    fn test_all_filters_are_described_in_order() {
        let criteria = SearchCriteria {
            query: "dragons".to_string(),
            range: SizeRange::Over50,
            get_all_available: false,
            filters: CategoryFilters::default()
                .with(FilterField::ReadingLevel, "advanced")
                .with(FilterField::ContentType, "short_stories_collection")
                .with(FilterField::Language, "English")
                .with(FilterField::BookType, "fiction")
                .with(FilterField::TargetAudience, "young_adult"),
        };

        let request = recommendation_request(&criteria);
        assert_eq!(
            request.query,
            "dragons (specifically: in English language, for young_adult audience, fiction books, \
             short stories_collection format, at advanced reading level)"
        );
        assert_eq!(request.count, 75);
    }
}
