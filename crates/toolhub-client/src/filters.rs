//! Structured filter query encoding.
//!
//! Filters are sent as bracketed, index-free repeated keys so one field can
//! carry several alternative comparisons:
//!
//! ```text
//! filters[error.status][][type]=eq&filters[error.status][][value]=open
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Comparison applied to a filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterComparison {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Empty / not empty, value is `true` or `false`
    Empty,
}

impl FilterComparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterComparison::Eq => "eq",
            FilterComparison::Ne => "ne",
            FilterComparison::Empty => "empty",
        }
    }
}

/// One comparison for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValue {
    /// Comparison type
    #[serde(rename = "type")]
    pub comparison: FilterComparison,

    /// Value to compare against
    pub value: String,
}

impl FilterValue {
    pub fn eq(value: impl Into<String>) -> Self {
        Self {
            comparison: FilterComparison::Eq,
            value: value.into(),
        }
    }

    pub fn ne(value: impl Into<String>) -> Self {
        Self {
            comparison: FilterComparison::Ne,
            value: value.into(),
        }
    }
}

/// Field name → alternative comparisons.
pub type Filters = BTreeMap<String, Vec<FilterValue>>;

/// Encode filters as query pairs, in field order then comparison order.
pub fn encode_filters(filters: &Filters) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (field, values) in filters {
        for filter in values {
            pairs.push((
                format!("filters[{}][][type]", field),
                filter.comparison.as_str().to_string(),
            ));
            pairs.push((format!("filters[{}][][value]", field), filter.value.clone()));
        }
    }
    pairs
}
