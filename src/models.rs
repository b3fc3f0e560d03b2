// Core data structures for linkmark

use serde::Serialize;

/// Structured record produced from one successfully fetched profile page
///
/// Immutable once built; a record is only constructed with a non-empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    /// Normalized source URL
    pub url: String,

    /// Person's display name
    pub name: String,

    /// Role/headline, when the page exposed one
    pub title: Option<String>,

    /// Employer, when the page exposed one
    pub company: Option<String>,
}

impl ProfileRecord {
    /// Last-name initial used for bookmark grouping
    #[must_use]
    pub fn last_initial(&self) -> char {
        self.name
            .split_whitespace()
            .last()
            .and_then(|word| word.chars().next())
            .map_or('#', |c| c.to_ascii_uppercase())
    }
}
