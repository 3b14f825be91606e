//! Pure ranking and filtering over parsed decisions. No I/O.

use crate::decision::DecisionEntry;
use crate::error::{Result, SquadError};
use chrono::NaiveDate;

const TITLE_WEIGHT: u32 = 10;
const AUTHOR_WEIGHT: u32 = 5;
const CONTENT_WEIGHT: u32 = 3;

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Relevance of `entry` for the lowercased `terms`.
pub fn score(entry: &DecisionEntry, terms: &[String]) -> u32 {
    terms
        .iter()
        .map(|term| {
            let mut s = 0;
            if contains_ci(&entry.title, term) {
                s += TITLE_WEIGHT;
            }
            if entry.author.as_deref().is_some_and(|a| contains_ci(a, term)) {
                s += AUTHOR_WEIGHT;
            }
            if contains_ci(&entry.content, term) {
                s += CONTENT_WEIGHT;
            }
            s
        })
        .sum()
}

fn query_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Entries matching `query`, highest score first. Ties keep their input
/// order, which for loaded decisions is most recent first.
pub fn search<'a, I>(entries: I, query: &str) -> Vec<&'a DecisionEntry>
where
    I: IntoIterator<Item = &'a DecisionEntry>,
{
    let terms = query_terms(query);
    if terms.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<(u32, &DecisionEntry)> = entries
        .into_iter()
        .map(|e| (score(e, &terms), e))
        .filter(|(s, _)| *s > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, e)| e).collect()
}

/// Inclusive `YYYY-MM-DD` range compared as strings. Undated entries are
/// dropped whenever a bound is given.
pub fn filter_by_date<'a, I>(entries: I, start: Option<&str>, end: Option<&str>) -> Vec<&'a DecisionEntry>
where
    I: IntoIterator<Item = &'a DecisionEntry>,
{
    entries
        .into_iter()
        .filter(|e| {
            if start.is_none() && end.is_none() {
                return true;
            }
            let Some(date) = e.date.as_deref() else {
                return false;
            };
            start.map_or(true, |s| date >= s) && end.map_or(true, |end| date <= end)
        })
        .collect()
}

/// Case-insensitive substring match on the author. Entries without an author never match.
pub fn filter_by_author<'a, I>(entries: I, author: &str) -> Vec<&'a DecisionEntry>
where
    I: IntoIterator<Item = &'a DecisionEntry>,
{
    let needle = author.to_lowercase();
    entries
        .into_iter()
        .filter(|e| e.author.as_deref().is_some_and(|a| contains_ci(a, &needle)))
        .collect()
}

/// Validate a `YYYY-MM-DD` filter bound given by a user.
pub fn parse_date_bound(s: &str) -> Result<String> {
    let s = s.trim();
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(d) if d.format("%Y-%m-%d").to_string() == s => Ok(s.to_string()),
        _ => Err(SquadError::InvalidDate(s.to_string())),
    }
}

/// Combined criteria; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionFilter {
    pub query: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub author: Option<String>,
}

impl DecisionFilter {
    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.start.is_none() && self.end.is_none() && self.author.is_none()
    }

    /// Search first so relevance order is set, then narrow by date and
    /// author. The later filters only remove entries, never reorder.
    pub fn apply<'a>(&self, entries: &'a [DecisionEntry]) -> Vec<&'a DecisionEntry> {
        let mut out: Vec<&DecisionEntry> = match self.query.as_deref().filter(|q| !q.trim().is_empty()) {
            Some(q) => search(entries, q),
            None => entries.iter().collect(),
        };
        if self.start.is_some() || self.end.is_some() {
            out = filter_by_date(out, self.start.as_deref(), self.end.as_deref());
        }
        if let Some(author) = self.author.as_deref() {
            out = filter_by_author(out, author);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
