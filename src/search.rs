//! Normalized pagination, sorting, and filtering contract shared by the query
//! handlers and the repositories.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Raw, untrusted search inputs as they arrive from callers.
///
/// Pages arrive as floats on purpose: JSON and query strings happily carry
/// `2.7`, and the normalization contract floors rather than rejects.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParamsInput<F> {
    pub page: Option<f64>,
    pub per_page: Option<f64>,
    pub sort: Option<String>,
    pub sort_dir: Option<SortDirection>,
    pub filter: Option<F>,
}

impl<F> Default for SearchParamsInput<F> {
    fn default() -> Self {
        Self {
            page: None,
            per_page: None,
            sort: None,
            sort_dir: None,
            filter: None,
        }
    }
}

/// Normalized search parameters. Immutable once constructed.
///
/// - `page` and `per_page` fall back to their defaults whenever the input is
///   absent, zero, negative, or NaN; fractional values are floored.
/// - `sort` is trimmed; a present-but-blank sort field is rejected.
/// - `sort_dir` is only meaningful alongside `sort` and is dropped otherwise.
/// - `filter` is an opaque payload interpreted by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams<F = String> {
    page: u64,
    per_page: u64,
    sort: Option<String>,
    sort_dir: Option<SortDirection>,
    filter: Option<F>,
}

impl<F> SearchParams<F> {
    pub fn new(input: SearchParamsInput<F>) -> Result<Self, ServiceError> {
        let page = normalize_positive(input.page, DEFAULT_PAGE);
        let per_page = normalize_positive(input.per_page, DEFAULT_PER_PAGE);

        let sort = match input.sort {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(ServiceError::ValidationError(
                        "Sort field cannot be an empty string.".into(),
                    ));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        let sort_dir = if sort.is_some() { input.sort_dir } else { None };

        Ok(Self {
            page,
            per_page,
            sort,
            sort_dir,
            filter: input.filter,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn sort_dir(&self) -> Option<SortDirection> {
        self.sort_dir
    }

    pub fn filter(&self) -> Option<&F> {
        self.filter.as_ref()
    }

    /// Zero-based row offset for the current page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

impl<F> Default for SearchParams<F> {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            sort: None,
            sort_dir: None,
            filter: None,
        }
    }
}

/// A page of results plus the pagination facts needed to render navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<T> {
    items: Vec<T>,
    total: u64,
    current_page: u64,
    per_page: u64,
}

impl<T> SearchResult<T> {
    pub fn new(
        items: Vec<T>,
        total: u64,
        current_page: u64,
        per_page: u64,
    ) -> Result<Self, ServiceError> {
        if current_page == 0 {
            return Err(ServiceError::ValidationError(
                "Current page must be a positive number.".into(),
            ));
        }
        if per_page == 0 {
            return Err(ServiceError::ValidationError(
                "Per page must be a positive number.".into(),
            ));
        }
        Ok(Self {
            items,
            total,
            current_page,
            per_page,
        })
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of pages, derived on access.
    pub fn last_page(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    /// Maps the items while keeping the pagination facts intact.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SearchResult<U> {
        SearchResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            current_page: self.current_page,
            per_page: self.per_page,
        }
    }
}

fn normalize_positive(value: Option<f64>, default: u64) -> u64 {
    match value {
        Some(v) if v.floor() >= 1.0 => v.floor() as u64,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn input(page: Option<f64>, per_page: Option<f64>) -> SearchParamsInput<String> {
        SearchParamsInput {
            page,
            per_page,
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_takes_defaults() {
        let params = SearchParams::<String>::new(SearchParamsInput::default()).unwrap();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 15);
        assert_eq!(params.sort(), None);
        assert_eq!(params.sort_dir(), None);
        assert_eq!(params.filter(), None);
    }

    #[rstest]
    #[case(None, 1)]
    #[case(Some(0.0), 1)]
    #[case(Some(-3.0), 1)]
    #[case(Some(0.5), 1)]
    #[case(Some(f64::NAN), 1)]
    #[case(Some(2.0), 2)]
    #[case(Some(2.7), 2)]
    fn page_is_normalized(#[case] raw: Option<f64>, #[case] expected: u64) {
        let params = SearchParams::new(input(raw, None)).unwrap();
        assert_eq!(params.page(), expected);
    }

    #[rstest]
    #[case(None, 15)]
    #[case(Some(0.0), 15)]
    #[case(Some(-1.0), 15)]
    #[case(Some(10.9), 10)]
    #[case(Some(25.0), 25)]
    fn per_page_is_normalized(#[case] raw: Option<f64>, #[case] expected: u64) {
        let params = SearchParams::new(input(None, raw)).unwrap();
        assert_eq!(params.per_page(), expected);
    }

    #[test]
    fn sort_field_is_trimmed() {
        let params = SearchParams::<String>::new(SearchParamsInput {
            sort: Some("  name  ".into()),
            sort_dir: Some(SortDirection::Desc),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(params.sort(), Some("name"));
        assert_eq!(params.sort_dir(), Some(SortDirection::Desc));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_sort_field_is_rejected(#[case] raw: &str) {
        let err = SearchParams::<String>::new(SearchParamsInput {
            sort: Some(raw.into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_matches!(
            err,
            ServiceError::ValidationError(msg) if msg == "Sort field cannot be an empty string."
        );
    }

    #[test]
    fn sort_dir_is_dropped_without_sort() {
        let params = SearchParams::<String>::new(SearchParamsInput {
            sort_dir: Some(SortDirection::Asc),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(params.sort_dir(), None);
    }

    #[test]
    fn filter_passes_through_untouched() {
        let params = SearchParams::new(SearchParamsInput {
            filter: Some("acme".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(params.filter().map(String::as_str), Some("acme"));
    }

    #[test]
    fn offset_reflects_page_and_size() {
        let params = SearchParams::<String>::new(SearchParamsInput {
            page: Some(3.0),
            per_page: Some(10.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn result_rejects_zero_current_page() {
        let err = SearchResult::new(vec![1, 2], 2, 0, 10).unwrap_err();
        assert_matches!(
            err,
            ServiceError::ValidationError(msg) if msg == "Current page must be a positive number."
        );
    }

    #[test]
    fn result_rejects_zero_per_page() {
        let err = SearchResult::new(vec![1, 2], 2, 1, 0).unwrap_err();
        assert_matches!(
            err,
            ServiceError::ValidationError(msg) if msg == "Per page must be a positive number."
        );
    }

    #[rstest]
    #[case(23, 10, 3)]
    #[case(10, 5, 2)]
    #[case(1, 10, 1)]
    #[case(0, 10, 0)]
    #[case(9, 3, 3)]
    fn last_page_is_derived(#[case] total: u64, #[case] per_page: u64, #[case] expected: u64) {
        let result = SearchResult::new(Vec::<u32>::new(), total, 1, per_page).unwrap();
        assert_eq!(result.last_page(), expected);
    }

    #[test]
    fn map_converts_items_and_keeps_meta() {
        let result = SearchResult::new(vec![1, 2, 3], 9, 2, 3).unwrap();
        let mapped = result.map(|n| n.to_string());
        assert_eq!(mapped.items(), ["1", "2", "3"]);
        assert_eq!(mapped.total(), 9);
        assert_eq!(mapped.current_page(), 2);
        assert_eq!(mapped.last_page(), 3);
    }
}
