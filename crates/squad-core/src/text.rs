//! Text normalization and the small set of markdown primitives the
//! extractors share: headings, sections, bullet lists, and pipe tables.
//!
//! None of this is a general markdown parser. It recognizes exactly the
//! shapes squad documents are written in and nothing more.

use regex::Regex;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Line endings
// ---------------------------------------------------------------------------

/// Collapse CRLF and bare CR line endings to LF.
pub fn normalize_eol(raw: &str) -> String {
    if !raw.contains('\r') {
        return raw.to_string();
    }
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

// ---------------------------------------------------------------------------
// Inline cleanup
// ---------------------------------------------------------------------------

static LINK_RE: OnceLock<Regex> = OnceLock::new();

fn link_re() -> &'static Regex {
    LINK_RE.get_or_init(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap())
}

/// Remove bold/italic markers and unwrap `[text](url)` links.
pub fn strip_emphasis(s: &str) -> String {
    let unlinked = link_re().replace_all(s, "$1");
    unlinked
        .replace("**", "")
        .replace("__", "")
        .trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
        .to_string()
}

/// Drop a trailing parenthetical such as the role in `Fury (Lead)`.
pub fn strip_parenthetical(s: &str) -> &str {
    match s.find('(') {
        Some(i) if i > 0 => s[..i].trim_end(),
        _ => s.trim(),
    }
}

/// Lowercased heading text with emphasis and leading decoration removed,
/// so `## 📋 **Summary**` compares equal to `summary`.
pub fn heading_key(text: &str) -> String {
    strip_emphasis(text)
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim()
        .to_lowercase()
}

/// Truncate to at most `max` characters, marking the cut with `...`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str("...");
    out
}

// ---------------------------------------------------------------------------
// Labeled values
// ---------------------------------------------------------------------------

fn strip_prefix_ignore_case<'t>(s: &'t str, prefix: &str) -> Option<&'t str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Recognize a `Label: value` line in any of the shapes squad documents use:
/// `**Date:** x`, `**Date**: x`, `- Date: x`, or a table row `| **Date** | x |`.
///
/// Returns the matched label (as given in `labels`) and the cleaned value.
pub fn labeled_value<'l>(line: &str, labels: &[&'l str]) -> Option<(&'l str, String)> {
    let body = line.trim_start_matches(|c: char| c.is_whitespace() || "|>*-+_".contains(c));
    for label in labels {
        let Some(rest) = strip_prefix_ignore_case(body, label) else {
            continue;
        };
        let rest = rest.trim_start_matches(|c: char| c == '*' || c == '_' || c == ' ');
        let Some(rest) = rest.strip_prefix(':').or_else(|| rest.strip_prefix('|')) else {
            continue;
        };
        let value = rest.trim().trim_end_matches('|').trim();
        let value = strip_emphasis(value);
        if !value.is_empty() {
            return Some((label, value));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Headings and sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    /// Zero-based line index within the document.
    pub line: usize,
}

/// Parse an ATX heading line into `(level, text)`.
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.bytes().take_while(|b| *b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    Some((level, rest.trim()))
}

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Line-indexed view of a document with its headings pre-scanned.
/// Headings inside fenced code blocks are ignored.
pub struct Outline<'a> {
    lines: Vec<&'a str>,
    headings: Vec<Heading>,
}

impl<'a> Outline<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut headings = Vec::new();
        let mut in_fence = false;
        for (i, line) in lines.iter().enumerate() {
            if is_fence(line) {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            if let Some((level, text)) = parse_heading(line) {
                headings.push(Heading {
                    level,
                    text: text.to_string(),
                    line: i,
                });
            }
        }
        Self { lines, headings }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    /// Index of the first line after heading `idx`'s section: the next
    /// heading at the same or a shallower level, or end of document.
    pub fn section_end(&self, idx: usize) -> usize {
        let h = &self.headings[idx];
        self.headings[idx + 1..]
            .iter()
            .find(|next| next.level <= h.level)
            .map(|next| next.line)
            .unwrap_or(self.lines.len())
    }

    /// Body of the first section whose heading satisfies `matches`.
    pub fn section_where(&self, matches: impl Fn(&str) -> bool) -> Option<&[&'a str]> {
        let idx = self
            .headings
            .iter()
            .position(|h| matches(&heading_key(&h.text)))?;
        let start = self.headings[idx].line + 1;
        Some(&self.lines[start..self.section_end(idx)])
    }

    /// Body of the first section whose normalized heading starts with any of `names`.
    pub fn section(&self, names: &[&str]) -> Option<&[&'a str]> {
        self.section_where(|key| names.iter().any(|n| key.starts_with(n)))
    }
}

// ---------------------------------------------------------------------------
// Bullets
// ---------------------------------------------------------------------------

static NUMBERED_RE: OnceLock<Regex> = OnceLock::new();

fn numbered_re() -> &'static Regex {
    NUMBERED_RE.get_or_init(|| Regex::new(r"^\d+[.)]\s+").unwrap())
}

/// The text of a bullet line (`-`, `*`, `+`, or `1.`), or `None`.
pub fn bullet_text(line: &str) -> Option<&str> {
    let t = line.trim_start();
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = t.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    numbered_re().find(t).map(|m| t[m.end()..].trim())
}

/// All non-empty bullet items in `body`, in order.
pub fn bullets(body: &[&str]) -> Vec<String> {
    body.iter()
        .filter_map(|l| bullet_text(l))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Header cells, present when the first row is followed by a separator row.
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Column index whose header (normalized) starts with any of `names`.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        self.header.as_ref()?.iter().position(|cell| {
            let key = heading_key(cell);
            names.iter().any(|n| key.starts_with(n))
        })
    }
}

pub fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

pub fn split_row(line: &str) -> Vec<String> {
    let t = line.trim();
    let t = t.strip_prefix('|').unwrap_or(t);
    let t = t.strip_suffix('|').unwrap_or(t);
    t.split('|').map(|c| c.trim().to_string()).collect()
}

fn is_separator(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|c| {
            !c.is_empty() && c.contains('-') && c.chars().all(|ch| matches!(ch, '-' | ':' | ' '))
        })
}

/// Every contiguous block of pipe rows in `body`, one `Table` per block.
pub fn tables(body: &[&str]) -> Vec<Table> {
    let mut out = Vec::new();
    let mut block: Vec<Vec<String>> = Vec::new();
    for line in body.iter().chain(std::iter::once(&"")) {
        if is_table_row(line) {
            block.push(split_row(line));
            continue;
        }
        if block.is_empty() {
            continue;
        }
        let rows = std::mem::take(&mut block);
        let has_header = rows.len() >= 2 && is_separator(&rows[1]);
        let mut table = Table::default();
        let mut iter = rows.into_iter();
        if has_header {
            table.header = iter.next();
        }
        table.rows = iter.filter(|r| !is_separator(r)).collect();
        out.push(table);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_all_variants() {
        assert_eq!(normalize_eol("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert_eq!(normalize_eol("plain\n"), "plain\n");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_eol("x\r\n\r\ny\r");
        assert_eq!(normalize_eol(&once), once);
        assert_eq!(once, "x\n\ny\n");
    }

    #[test]
    fn heading_requires_space() {
        assert_eq!(parse_heading("## Summary"), Some((2, "Summary")));
        assert_eq!(parse_heading("#42 fixed"), None);
        assert_eq!(parse_heading("plain"), None);
    }

    #[test]
    fn headings_inside_fences_ignored() {
        let doc = "# Real\n```\n# not a heading\n```\n## Also real\n";
        let outline = Outline::new(doc);
        let texts: Vec<_> = outline.headings().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["Real", "Also real"]);
    }

    #[test]
    fn section_stops_at_same_level() {
        let doc = "# T\n## Summary\nline one\n### Detail\nnested\n## Next\nother\n";
        let outline = Outline::new(doc);
        let body = outline.section(&["summary"]).unwrap();
        assert_eq!(body, &["line one", "### Detail", "nested"]);
    }

    #[test]
    fn heading_key_strips_decoration() {
        assert_eq!(heading_key("📋 **Summary**"), "summary");
    }

    #[test]
    fn bullets_accept_all_markers() {
        let body = ["- one", "* two", "+ three", "4. four", "not a bullet", "-   "];
        assert_eq!(bullets(&body), vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn tables_split_header_and_separator() {
        let body = [
            "| Name | Role |",
            "|------|:----:|",
            "| Alice | Dev |",
            "",
            "| solo | row |",
        ];
        let t = tables(&body);
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].header.as_deref(), Some(&["Name".to_string(), "Role".to_string()][..]));
        assert_eq!(t[0].rows, vec![vec!["Alice".to_string(), "Dev".to_string()]]);
        assert_eq!(t[0].column(&["role"]), Some(1));
        assert!(t[1].header.is_none());
        assert_eq!(t[1].rows.len(), 1);
    }

    #[test]
    fn strip_helpers() {
        assert_eq!(strip_emphasis("**Fixed** the _parser_"), "Fixed the _parser");
        assert_eq!(strip_emphasis("[Fury](agents/fury)"), "Fury");
        assert_eq!(strip_parenthetical("Fury (Lead)"), "Fury");
        assert_eq!(strip_parenthetical("(odd)"), "(odd)");
    }

    #[test]
    fn labeled_value_shapes() {
        let labels = ["agent routed", "date", "by"];
        assert_eq!(
            labeled_value("| **Agent routed** | Fury (Lead) |", &labels),
            Some(("agent routed", "Fury (Lead)".to_string()))
        );
        assert_eq!(
            labeled_value("**Date:** 2026-02-14", &labels),
            Some(("date", "2026-02-14".to_string()))
        );
        assert_eq!(
            labeled_value("- **By**: Banner", &labels),
            Some(("by", "Banner".to_string()))
        );
        assert_eq!(labeled_value("Bypass: nothing", &labels), None);
        assert_eq!(labeled_value("**Date:**", &labels), None);
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghijkl", 8), "abcde...");
    }
}
