//! Query type definitions: page, sort, filters, search, and the patch that
//! edits them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Sort
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

// ============================================================================
// Query
// ============================================================================

/// Parameters of one list request. `page` is 1-based; `page_size` is fixed
/// for the lifetime of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub page: u32,
    pub page_size: usize,
    pub sort_field: String,
    pub sort_order: SortOrder,
    pub filters: BTreeMap<String, String>,
    pub search: String,
}

impl Query {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            sort_field: "createdAt".to_string(),
            sort_order: SortOrder::Desc,
            filters: BTreeMap::new(),
            search: String::new(),
        }
    }

    /// Merge `patch` into this query. Returns whether anything changed.
    ///
    /// Any change other than page navigation sends the query back to page 1.
    pub fn apply(&mut self, patch: &QueryPatch) -> bool {
        let mut reshaped = false;

        if let Some(field) = &patch.sort_field {
            if *field != self.sort_field {
                self.sort_field = field.clone();
                reshaped = true;
            }
        }
        if let Some(order) = patch.sort_order {
            if order != self.sort_order {
                self.sort_order = order;
                reshaped = true;
            }
        }
        if let Some(search) = &patch.search {
            let search = search.trim();
            if search != self.search {
                self.search = search.to_string();
                reshaped = true;
            }
        }
        for (key, value) in &patch.filters {
            let value = value.trim();
            let changed = if value.is_empty() {
                self.filters.remove(key).is_some()
            } else if self.filters.get(key).map(String::as_str) != Some(value) {
                self.filters.insert(key.clone(), value.to_string());
                true
            } else {
                false
            };
            reshaped |= changed;
        }

        if reshaped {
            self.page = 1;
            return true;
        }

        match patch.page {
            Some(page) if page.max(1) != self.page => {
                self.page = page.max(1);
                true
            }
            _ => false,
        }
    }

    /// Patch that sorts by `field`, flipping the order when it is already the
    /// sort field.
    pub fn sort_toggled(&self, field: &str) -> QueryPatch {
        let order = if self.sort_field == field {
            self.sort_order.flipped()
        } else {
            SortOrder::Asc
        };
        QueryPatch::sort(field, order)
    }

    /// Ordered `(key, value)` pairs for the list collaborator. Empty search is
    /// omitted; filters follow in key order.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.page_size.to_string()),
            ("sort".to_string(), self.sort_field.clone()),
            ("order".to_string(), self.sort_order.as_str().to_string()),
        ];
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        params.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}

/// Number of pages for `total` records; never less than 1.
pub fn total_pages(total: u64, page_size: usize) -> u32 {
    let size = page_size.max(1) as u64;
    u32::try_from(total.div_ceil(size).max(1)).unwrap_or(u32::MAX)
}

// ============================================================================
// QueryPatch
// ============================================================================

/// A partial edit of a [`Query`]. Filter entries with an empty value remove
/// that filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPatch {
    pub page: Option<u32>,
    pub sort_field: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filters: BTreeMap<String, String>,
    pub search: Option<String>,
}

impl QueryPatch {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn filter(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().and_filter(key, value)
    }

    pub fn sort(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort_field: Some(field.into()),
            sort_order: Some(order),
            ..Default::default()
        }
    }

    pub fn and_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
