/// Identifies one cached listing: a page of results for a search term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub page: u32,
    pub search: String,
}

impl QueryKey {
    /// Pages are 1-based; a zero page is treated as the first.
    pub fn new(page: u32, search: impl Into<String>) -> Self {
        Self {
            page: page.max(1),
            search: search.into(),
        }
    }

    /// The search term as sent to the API, `None` when blank.
    pub fn search_param(&self) -> Option<&str> {
        Some(self.search.as_str()).filter(|s| !s.is_empty())
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "notes[page={}, search={:?}]", self.page, self.search)
    }
}

/// Selects cached listings for invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Every note listing, regardless of page or search.
    All,
    /// Every search term on one page.
    Page(u32),
    Exact(QueryKey),
}

impl KeyPrefix {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Self::All => true,
            Self::Page(page) => key.page == *page,
            Self::Exact(exact) => exact == key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_is_first_page() {
        assert_eq!(QueryKey::new(0, "").page, 1);
    }

    #[test]
    fn blank_search_is_not_sent() {
        assert_eq!(QueryKey::new(1, "").search_param(), None);
        assert_eq!(QueryKey::new(1, "work").search_param(), Some("work"));
    }

    #[test]
    fn prefixes_match_expected_keys() {
        let a = QueryKey::new(1, "");
        let b = QueryKey::new(2, "work");

        assert!(KeyPrefix::All.matches(&a) && KeyPrefix::All.matches(&b));
        assert!(KeyPrefix::Page(2).matches(&b));
        assert!(!KeyPrefix::Page(2).matches(&a));
        assert!(KeyPrefix::Exact(a.clone()).matches(&a));
        assert!(!KeyPrefix::Exact(a).matches(&b));
    }
}
