//! Decision records.
//!
//! Two heading conventions coexist, sometimes in one repository:
//!
//! - `# Decision: Title` at the top level, with `Date:`/`Author:`/`Issue:`
//!   metadata below and arbitrary sub-headings as content;
//! - `## Title` entries, plus `### YYYY-MM-DD: Title` entries. Undated
//!   third-level headings are subsections of the entry above them.

use crate::config::SquadConfig;
use crate::io::DocumentSource;
use crate::log::first_date_in;
use crate::paths;
use crate::text::{labeled_value, strip_emphasis, Heading, Outline};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionEntry {
    pub title: String,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    /// Full section body, subsections included.
    pub content: String,
    pub file_path: PathBuf,
    /// One-based line of the decision's heading.
    pub line_number: usize,
}

// ---------------------------------------------------------------------------
// Heading classification
// ---------------------------------------------------------------------------

static DATED_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

/// `2026-02-14: Title`, also tolerating a dash separator.
fn dated_prefix_re() -> &'static Regex {
    DATED_PREFIX_RE
        .get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:/\d{1,2})?\s*(?::|—|–|-)\s*").unwrap())
}

const DECISION_PREFIX: &str = "decision:";

fn h1_decision_title(text: &str) -> Option<String> {
    let plain = strip_emphasis(text);
    let head = plain.get(..DECISION_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(DECISION_PREFIX) {
        return None;
    }
    Some(plain[DECISION_PREFIX.len()..].trim().to_string())
}

fn is_dated(text: &str) -> bool {
    dated_prefix_re().is_match(&strip_emphasis(text))
}

fn clean_title(text: &str) -> String {
    let plain = strip_emphasis(text);
    dated_prefix_re().replace(&plain, "").trim().to_string()
}

/// Ends an entry of the second/third-level convention.
fn ends_minor_entry(h: &Heading) -> bool {
    h.level <= 2 || (h.level == 3 && is_dated(&h.text))
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Metadata {
    date: Option<String>,
    author: Option<String>,
    issue: Option<String>,
}

const METADATA_LABELS: &[&str] = &["date", "author", "by", "issue"];

/// Metadata lines between a heading and its first sub-heading.
fn scan_metadata(lines: &[&str]) -> Metadata {
    let mut meta = Metadata::default();
    for line in lines {
        let Some((label, value)) = labeled_value(line, METADATA_LABELS) else {
            continue;
        };
        match label {
            "date" if meta.date.is_none() => {
                meta.date = first_date_in(&value).map(|d| d.format("%Y-%m-%d").to_string());
            }
            "author" | "by" if meta.author.is_none() => meta.author = Some(value),
            "issue" if meta.issue.is_none() => meta.issue = Some(value),
            _ => {}
        }
    }
    meta
}

fn body_text(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].join("\n"),
        _ => String::new(),
    }
}

/// Every decision in one document, in document order.
pub fn parse_decisions(text: &str, file_path: &Path) -> Vec<DecisionEntry> {
    let outline = Outline::new(text);
    let lines = outline.lines();
    let headings = outline.headings();
    let mut out = Vec::new();
    // Line index where the current top-level decision's span ends.
    let mut h1_span_end: Option<usize> = None;

    for (i, h) in headings.iter().enumerate() {
        let rest = &headings[i + 1..];

        if h.level == 1 {
            let end = rest.iter().find(|n| n.level == 1).map_or(lines.len(), |n| n.line);
            match h1_decision_title(&h.text) {
                Some(title) => {
                    h1_span_end = Some(end);
                    out.push(build_entry(lines, headings, i, end, title, file_path));
                }
                None => {
                    tracing::debug!(heading = %h.text, "skipping non-decision top-level heading");
                    h1_span_end = None;
                }
            }
            continue;
        }

        if h1_span_end.is_some_and(|end| h.line < end) {
            continue;
        }
        let is_entry = h.level == 2 || (h.level == 3 && is_dated(&h.text));
        if !is_entry {
            continue;
        }
        let end = rest
            .iter()
            .find(|n| ends_minor_entry(n))
            .map_or(lines.len(), |n| n.line);
        out.push(build_entry(lines, headings, i, end, clean_title(&h.text), file_path));
    }
    out
}

fn build_entry(
    lines: &[&str],
    headings: &[Heading],
    idx: usize,
    end: usize,
    title: String,
    file_path: &Path,
) -> DecisionEntry {
    let h = &headings[idx];
    let body = &lines[h.line + 1..end];
    let meta_end = headings[idx + 1..]
        .iter()
        .find(|n| n.line < end)
        .map_or(end, |n| n.line);
    let meta = scan_metadata(&lines[h.line + 1..meta_end]);

    let heading_date = first_date_in(&h.text).map(|d| d.format("%Y-%m-%d").to_string());

    DecisionEntry {
        title: clean_title(&title),
        date: heading_date.or(meta.date),
        author: meta.author,
        issue: meta.issue,
        content: body_text(body),
        file_path: file_path.to_path_buf(),
        line_number: h.line + 1,
    }
}

// ---------------------------------------------------------------------------
// Ordering and loading
// ---------------------------------------------------------------------------

/// Most recent first; undated entries after every dated one. Stable.
pub fn sort_most_recent_first(entries: &mut [DecisionEntry]) {
    entries.sort_by(|a, b| match (&a.date, &b.date) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn is_markdown(name: &str) -> bool {
    name.ends_with(".md") || name.ends_with(".markdown")
}

const MAX_DIR_DEPTH: usize = 8;

fn collect_documents(source: &dyn DocumentSource, dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > MAX_DIR_DEPTH {
        tracing::warn!(dir = %dir.display(), "decision directory nesting too deep; skipping");
        return;
    }
    for entry in source.list_dir(dir).unwrap_or_default() {
        if entry.name.starts_with('.') {
            continue;
        }
        let path = dir.join(&entry.name);
        if entry.is_dir {
            collect_documents(source, &path, depth + 1, out);
        } else if is_markdown(&entry.name) {
            out.push(path);
        }
    }
}

/// Decision documents: the primary file, then the directory tree in path order.
pub fn decision_documents(source: &dyn DocumentSource, root: &Path, config: &SquadConfig) -> Vec<PathBuf> {
    let mut docs = vec![paths::decisions_path(root, config)];
    let mut extra = Vec::new();
    collect_documents(source, &paths::decisions_dir(root, config), 0, &mut extra);
    extra.sort();
    docs.extend(extra);
    docs
}

/// Parse every decision document, most recent first. Unreadable documents are skipped.
pub fn load_decisions(source: &dyn DocumentSource, root: &Path, config: &SquadConfig) -> Vec<DecisionEntry> {
    let mut entries: Vec<DecisionEntry> = decision_documents(source, root, config)
        .into_iter()
        .filter_map(|path| {
            let text = source.read_text(&path)?;
            Some(parse_decisions(&text, &path))
        })
        .flatten()
        .collect();
    sort_most_recent_first(&mut entries);
    entries
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemorySource;

    fn parse(text: &str) -> Vec<DecisionEntry> {
        parse_decisions(text, Path::new("decisions.md"))
    }

    fn titles(entries: &[DecisionEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn h1_decision_with_nested_content() {
        let text = "\
# Decision: Use Rust

**Date:** 2026-02-14
**Author:** Fury
**Issue:** #42

## Context
We need speed.

## Rationale
Types.
";
        let d = parse(text);
        assert_eq!(d.len(), 1);
        let e = &d[0];
        assert_eq!(e.title, "Use Rust");
        assert_eq!(e.date.as_deref(), Some("2026-02-14"));
        assert_eq!(e.author.as_deref(), Some("Fury"));
        assert_eq!(e.issue.as_deref(), Some("#42"));
        assert_eq!(e.line_number, 1);
        assert!(e.content.contains("## Context"));
        assert!(e.content.contains("Types."));
    }

    #[test]
    fn non_decision_h1_is_noise() {
        let text = "# Decisions Log\n\nIntro.\n\n# Decision: A\nbody a\n\n# Appendix\nstuff\n";
        let d = parse(text);
        assert_eq!(titles(&d), vec!["A"]);
        assert_eq!(d[0].content, "body a");
    }

    #[test]
    fn h2_always_and_dated_h3_only() {
        let text = "\
# Team Decisions

## Adopt tracing
**By:** Banner
Details.
### Notes
Nested note.

### 2026-02-10: Drop SQLite
Reason.
### Follow-up
More.
";
        let d = parse(text);
        assert_eq!(titles(&d), vec!["Adopt tracing", "Drop SQLite"]);
        assert_eq!(d[0].author.as_deref(), Some("Banner"));
        assert!(d[0].content.contains("Nested note."));
        assert_eq!(d[1].date.as_deref(), Some("2026-02-10"));
        assert!(d[1].content.contains("### Follow-up"));
        assert_eq!(d[1].line_number, 9);
    }

    #[test]
    fn heading_date_beats_metadata() {
        let text = "### 2026-02-14: Ship it\n**Date:** 2026-01-01\n";
        let d = parse(text);
        assert_eq!(d[0].date.as_deref(), Some("2026-02-14"));
        assert_eq!(d[0].title, "Ship it");
    }

    #[test]
    fn first_date_of_range_used() {
        let text = "## Pick a name\n- **Date:** 2026-02-14/15\n";
        assert_eq!(parse(text)[0].date.as_deref(), Some("2026-02-14"));
    }

    #[test]
    fn metadata_below_subheading_ignored() {
        let text = "## Choice\n### Context\n**Date:** 2026-02-14\n";
        let d = parse(text);
        assert_eq!(d[0].date, None);
    }

    #[test]
    fn h2_inside_h1_decision_is_content() {
        let text = "# Decision: One\n## Two\nx\n# Other\n## Three\ny\n";
        let d = parse(text);
        assert_eq!(titles(&d), vec!["One", "Three"]);
    }

    #[test]
    fn fenced_headings_are_content() {
        let text = "## Real\n```\n## not a decision\n```\n";
        let d = parse(text);
        assert_eq!(titles(&d), vec!["Real"]);
    }

    #[test]
    fn sorted_most_recent_first_undated_last() {
        let text = "## Undated\n### 2026-01-05: Old\n## New\n**Date:** 2026-02-20\n## Undated two\n";
        let mut d = parse(text);
        sort_most_recent_first(&mut d);
        assert_eq!(titles(&d), vec!["New", "Old", "Undated", "Undated two"]);
    }

    #[test]
    fn load_reads_primary_then_directory_recursively() {
        let mut src = MemorySource::new();
        src.insert("/r/.ai-team/decisions.md", "## Primary\n**Date:** 2026-02-01\n")
            .insert("/r/.ai-team/decisions/b.md", "## From b\n**Date:** 2026-02-03\n")
            .insert("/r/.ai-team/decisions/inbox/a.md", "## From inbox\n")
            .insert("/r/.ai-team/decisions/notes.txt", "## Ignored\n");
        let d = load_decisions(&src, Path::new("/r"), &SquadConfig::default());
        assert_eq!(titles(&d), vec!["From b", "Primary", "From inbox"]);
        assert_eq!(d[2].file_path, PathBuf::from("/r/.ai-team/decisions/inbox/a.md"));
    }

    #[test]
    fn missing_documents_yield_nothing() {
        let src = MemorySource::new();
        assert!(load_decisions(&src, Path::new("/r"), &SquadConfig::default()).is_empty());
    }
}
