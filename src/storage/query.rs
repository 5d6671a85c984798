//! Listing queries: free-text filter, sort and pagination

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::InventoryRecord;

/// Default page size when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Record field used for sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    Quantity,
    Category,
    HospitalLocation,
    IsVentilator,
    Status,
    LastUpdated,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Parse a camelCase record field name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "quantity" => Some(Self::Quantity),
            "category" => Some(Self::Category),
            "hospitalLocation" => Some(Self::HospitalLocation),
            "isVentilator" => Some(Self::IsVentilator),
            "status" => Some(Self::Status),
            "lastUpdated" => Some(Self::LastUpdated),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    /// Backing SQL column
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Quantity => "quantity",
            Self::Category => "category",
            Self::HospitalLocation => "hospital_location",
            Self::IsVentilator => "is_ventilator",
            Self::Status => "status",
            Self::LastUpdated => "last_updated",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    fn compare(&self, a: &InventoryRecord, b: &InventoryRecord) -> Ordering {
        match self {
            Self::Name => a.name.cmp(&b.name),
            Self::Quantity => a.quantity.cmp(&b.quantity),
            Self::Category => a.category.as_str().cmp(b.category.as_str()),
            Self::HospitalLocation => a.hospital_location.cmp(&b.hospital_location),
            Self::IsVentilator => a.is_ventilator.cmp(&b.is_ventilator),
            Self::Status => a.status.as_str().cmp(b.status.as_str()),
            Self::LastUpdated => a.last_updated.cmp(&b.last_updated),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc` selects ascending; anything else is descending
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    /// SQL keyword
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    /// Set the free-text filter
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Set the sort
    pub fn sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_field = field;
        self.sort_order = order;
        self
    }

    /// Set the page and page size; both are clamped to at least 1
    pub fn page(mut self, page: usize, limit: usize) -> Self {
        self.page = page.max(1);
        self.limit = limit.max(1);
        self
    }

    /// Trimmed, non-empty search term
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Number of records skipped before this page
    pub fn offset(&self) -> usize {
        self.page.max(1).saturating_sub(1).saturating_mul(self.limit.max(1))
    }

    /// Substring match on name, category or location.
    ///
    /// Only ASCII letters fold case, matching SQLite's `LIKE`, so every
    /// store returns the same rows for the same term.
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        let Some(term) = self.search_term() else {
            return true;
        };
        let needle = term.to_ascii_lowercase();

        record.name.to_ascii_lowercase().contains(&needle)
            || record.category.as_str().to_ascii_lowercase().contains(&needle)
            || record.hospital_location.to_ascii_lowercase().contains(&needle)
    }
}

/// One page of listing results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPage {
    pub items: Vec<InventoryRecord>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
}

impl InventoryPage {
    /// Assemble a page from its items and the unpaginated match count
    pub fn new(items: Vec<InventoryRecord>, total_items: usize, query: &ListQuery) -> Self {
        let limit = query.limit.max(1);
        Self {
            items,
            current_page: query.page.max(1),
            total_pages: total_items.div_ceil(limit),
            total_items,
            items_per_page: limit,
        }
    }
}

/// Filter, sort and paginate an in-memory record set.
///
/// Sorting is stable, so records that compare equal keep their input
/// (insertion) order in both directions.
pub fn apply_query(records: Vec<InventoryRecord>, query: &ListQuery) -> InventoryPage {
    let mut matched: Vec<InventoryRecord> =
        records.into_iter().filter(|r| query.matches(r)).collect();

    let field = query.sort_field;
    match query.sort_order {
        SortOrder::Asc => matched.sort_by(|a, b| field.compare(a, b)),
        SortOrder::Desc => matched.sort_by(|a, b| field.compare(a, b).reverse()),
    }

    let total = matched.len();
    let items = matched
        .into_iter()
        .skip(query.offset())
        .take(query.limit.max(1))
        .collect();

    InventoryPage::new(items, total, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, InventoryDraft, ItemStatus};

    fn record(name: &str, quantity: u32, category: Category, location: &str) -> InventoryRecord {
        InventoryRecord::new(InventoryDraft {
            name: name.to_string(),
            quantity,
            category,
            hospital_location: location.to_string(),
            is_ventilator: false,
            status: ItemStatus::Available,
        })
    }

    fn sample() -> Vec<InventoryRecord> {
        vec![
            record("Gloves", 40, Category::Ppe, "Central Hospital"),
            record("Syringe", 10, Category::Supplies, "North General Hospital"),
            record("N95 Mask", 25, Category::Ppe, "South Medical Center"),
            record("Insulin", 5, Category::Medicine, "Central Hospital"),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let page = apply_query(sample(), &ListQuery::default().search("ppe"));
        assert_eq!(page.total_items, 2);

        let page = apply_query(sample(), &ListQuery::default().search("CENTRAL"));
        assert_eq!(page.total_items, 2);

        let page = apply_query(sample(), &ListQuery::default().search("syr"));
        assert_eq!(page.items[0].name, "Syringe");
    }

    #[test]
    fn test_blank_search_matches_everything() {
        let page = apply_query(sample(), &ListQuery::default().search("   "));
        assert_eq!(page.total_items, 4);
    }

    #[test]
    fn test_sort_by_quantity() {
        let query = ListQuery::default().sort(SortField::Quantity, SortOrder::Asc);
        let page = apply_query(sample(), &query);
        let quantities: Vec<u32> = page.items.iter().map(|r| r.quantity).collect();
        assert_eq!(quantities, vec![5, 10, 25, 40]);

        let query = ListQuery::default().sort(SortField::Quantity, SortOrder::Desc);
        let page = apply_query(sample(), &query);
        assert_eq!(page.items[0].quantity, 40);
    }

    #[test]
    fn test_pagination() {
        let query = ListQuery::default()
            .sort(SortField::Name, SortOrder::Asc)
            .page(2, 3);
        let page = apply_query(sample(), &query);

        assert_eq!(page.total_items, 4);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.items_per_page, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Syringe");
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = apply_query(sample(), &ListQuery::default().page(9, 10));
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 4);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_empty_result_set() {
        let page = apply_query(Vec::new(), &ListQuery::default());
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(SortField::parse("hospitalLocation"), Some(SortField::HospitalLocation));
        assert_eq!(SortField::parse("bogus"), None);
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("whatever"), SortOrder::Desc);
    }

    #[test]
    fn test_page_clamps_to_one() {
        let query = ListQuery::default().page(0, 0);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 1);
        assert_eq!(query.offset(), 0);
    }
}
