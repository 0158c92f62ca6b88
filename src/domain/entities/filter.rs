//! Query criteria built from request input.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use super::record::{Attributes, Record, value_text};
use crate::error::AppError;

pub const DEFAULT_PER_PAGE: i64 = 15;
pub const MAX_PER_PAGE: i64 = 1000;

/// Requested page of a listing (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Rows skipped before this page; saturates instead of overflowing.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// Case-insensitive substring search over a fixed set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub fields: Vec<String>,
    pub term: String,
}

/// Equality conditions, keyword search and pagination for a listing.
///
/// Input keys starting with `_` are control parameters and never become
/// conditions; `page` and `per_page` drive pagination. A listing is paginated
/// only when one of them is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub conditions: BTreeMap<String, String>,
    pub keyword: Option<Keyword>,
    pub page: Option<PageRequest>,
}

impl Filter {
    /// Builds a filter from merged query/route input.
    ///
    /// `_keyword` searches `keyword_fields`; it is ignored when no fields are
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when `page` is not a positive integer,
    /// `per_page` is outside `1..=1000`, or the page starts beyond the last
    /// addressable row.
    pub fn from_input(input: &Attributes, keyword_fields: &[String]) -> Result<Self, AppError> {
        let mut filter = Filter::default();

        for (key, value) in input {
            if key.starts_with('_') || key == "page" || key == "per_page" {
                continue;
            }
            if let Some(text) = value_text(value) {
                filter.conditions.insert(key.clone(), text);
            }
        }

        if !keyword_fields.is_empty()
            && let Some(term) = input.get("_keyword").and_then(value_text)
            && !term.trim().is_empty()
        {
            filter.keyword = Some(Keyword {
                fields: keyword_fields.to_vec(),
                term: term.trim().to_string(),
            });
        }

        let page = parse_positive(input, "page")?;
        let per_page = parse_positive(input, "per_page")?;

        if page.is_some() || per_page.is_some() {
            let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
            if per_page > MAX_PER_PAGE {
                return Err(AppError::validation(
                    format!("per_page must be between 1 and {}", MAX_PER_PAGE),
                    json!({ "per_page": [format!("must be at most {}", MAX_PER_PAGE)] }),
                ));
            }
            let page = page.unwrap_or(1);
            if (page - 1).checked_mul(per_page).is_none() {
                return Err(AppError::validation(
                    "page is too large",
                    json!({ "page": ["is too large"] }),
                ));
            }
            filter.page = Some(PageRequest { page, per_page });
        }

        Ok(filter)
    }

    /// Adds an equality condition.
    pub fn with_condition(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    /// Evaluates conditions and keyword search against a record in memory.
    pub fn matches(&self, record: &Record) -> bool {
        let conditions_hold = self
            .conditions
            .iter()
            .all(|(field, expected)| record.text_of(field).as_deref() == Some(expected.as_str()));

        let keyword_holds = self.keyword.as_ref().is_none_or(|keyword| {
            let term = keyword.term.to_lowercase();
            keyword.fields.iter().any(|field| {
                record
                    .text_of(field)
                    .is_some_and(|text| text.to_lowercase().contains(&term))
            })
        });

        conditions_hold && keyword_holds
    }
}

fn parse_positive(input: &Attributes, key: &str) -> Result<Option<i64>, AppError> {
    let Some(value) = input.get(key) else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n > 0 => Ok(Some(n)),
        _ => Err(AppError::validation(
            format!("{} must be a positive integer", key),
            json!({ key: ["must be a positive integer"] }),
        )),
    }
}
