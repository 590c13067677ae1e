//! In-memory search over loaded loot rows.

use crate::error::{LootError, Result};
use crate::models::LootRow;

/// A parsed, non-empty search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    text: String,
    lowered: String,
    number: Option<i32>,
}

impl SearchTerm {
    /// Trim and validate user input. Blank input is a validation error.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        if text.is_empty() {
            return Err(LootError::Validation("Please enter a valid search term.".to_string()));
        }
        Ok(Self {
            text: text.to_string(),
            lowered: text.to_lowercase(),
            number: text.parse().ok(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn number(&self) -> Option<i32> {
        self.number
    }

    /// Numeric terms match item id or loot pack id exactly, or the name as a substring.
    /// Other terms match the name only. Name matching ignores case.
    pub fn matches(&self, row: &LootRow) -> bool {
        let name_match = row.display_name.to_lowercase().contains(&self.lowered);
        match self.number {
            Some(n) => row.entry.item_id == n || row.entry.loot_pack_id == n || name_match,
            None => name_match,
        }
    }
}

/// Result of running a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Indices into the searched rows, in their original order. Never empty.
    Matches(Vec<usize>),
    NoMatches,
}

impl FilterOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, FilterOutcome::NoMatches)
    }
}

pub fn filter_rows(rows: &[LootRow], term: &SearchTerm) -> FilterOutcome {
    let matched: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| term.matches(row))
        .map(|(idx, _)| idx)
        .collect();

    if matched.is_empty() {
        FilterOutcome::NoMatches
    } else {
        FilterOutcome::Matches(matched)
    }
}
