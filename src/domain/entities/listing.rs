//! Query results: plain or paginated.

use super::filter::PageRequest;
use super::record::Record;

/// Result of a repository query.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    Items(Vec<Record>),
    Paginated {
        items: Vec<Record>,
        page: i64,
        per_page: i64,
        total: i64,
    },
}

impl Listing {
    /// Slices an already-filtered, ordered result set.
    ///
    /// Returns [`Listing::Items`] when no page was requested.
    pub fn from_records(records: Vec<Record>, page: Option<PageRequest>) -> Self {
        let Some(page) = page else {
            return Listing::Items(records);
        };

        let total = records.len() as i64;
        let items = records
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();

        Listing::Paginated {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        }
    }

    pub fn items(&self) -> &[Record] {
        match self {
            Listing::Items(items) => items,
            Listing::Paginated { items, .. } => items,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Attributes;
    use chrono::Utc;

    fn records(n: i64) -> Vec<Record> {
        let now = Utc::now();
        (1..=n)
            .map(|id| Record::new(id, Attributes::new(), now, now, None))
            .collect()
    }

    #[test]
    fn test_without_page_returns_items() {
        let listing = Listing::from_records(records(3), None);
        assert!(matches!(listing, Listing::Items(_)));
        assert_eq!(listing.len(), 3);
    }

    #[test]
    fn test_second_page() {
        let listing = Listing::from_records(
            records(5),
            Some(PageRequest {
                page: 2,
                per_page: 2,
            }),
        );

        match listing {
            Listing::Paginated {
                items,
                page,
                per_page,
                total,
            } => {
                assert_eq!(items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 4]);
                assert_eq!(page, 2);
                assert_eq!(per_page, 2);
                assert_eq!(total, 5);
            }
            other => panic!("expected paginated listing, got {:?}", other),
        }
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let listing = Listing::from_records(
            records(2),
            Some(PageRequest {
                page: 5,
                per_page: 10,
            }),
        );
        assert!(listing.is_empty());
    }
}
