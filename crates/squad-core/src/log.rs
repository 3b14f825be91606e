//! Parsing one squad log document into a `LogEntry`.
//!
//! Logs have been written in several dialects over time (session logs,
//! routing tables, bullet-only notes), so every field is recovered through a
//! priority chain of extractors and the parser never fails: a document that
//! matches nothing still yields an entry with a date and an `unknown` topic.

use crate::extract::{first_match, Document, Extractor};
use crate::text::{
    bullet_text, bullets, heading_key, is_table_row, labeled_value, strip_emphasis,
    strip_parenthetical, tables,
};
use crate::types::LogKind;
use chrono::{Local, NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const UNKNOWN_TOPIC: &str = "unknown";

// ---------------------------------------------------------------------------
// LogEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub agent: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Filename the entry was parsed from.
    pub source: String,
    pub date: NaiveDate,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveTime>,
    /// First participant is the default assignee of derived tasks.
    pub participants: Vec<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub what_was_done: Vec<WorkItem>,
}

impl LogEntry {
    pub fn kind(&self) -> LogKind {
        if self.timestamp.is_some() {
            LogKind::Routing
        } else {
            LogKind::Session
        }
    }
}

// ---------------------------------------------------------------------------
// Filenames
// ---------------------------------------------------------------------------

/// Date, optional time, and topic encoded in `YYYY-MM-DD[Thhmm]-topic.ext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileName {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub topic: String,
}

static FILENAME_RE: OnceLock<Regex> = OnceLock::new();

fn filename_re() -> &'static Regex {
    FILENAME_RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:T(\d{2})(\d{2}))?-(.+)\.[A-Za-z0-9]+$").unwrap()
    })
}

static DATE_RE: OnceLock<Regex> = OnceLock::new();

pub(crate) fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap())
}

pub fn parse_log_filename(name: &str) -> Option<LogFileName> {
    let caps = filename_re().captures(name)?;
    let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
    let time = match (caps.get(2), caps.get(3)) {
        (Some(h), Some(m)) => {
            let h = h.as_str().parse().ok();
            let m = m.as_str().parse().ok();
            h.zip(m).and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0))
        }
        _ => None,
    };
    Some(LogFileName {
        date,
        time,
        topic: caps[4].to_string(),
    })
}

/// First calendar-valid `YYYY-MM-DD` anywhere in `text`.
pub fn first_date_in(text: &str) -> Option<NaiveDate> {
    date_re()
        .captures_iter(text)
        .find_map(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
}

// ---------------------------------------------------------------------------
// Participant extractors
// ---------------------------------------------------------------------------

pub static PARTICIPANT_EXTRACTORS: &[Extractor<Vec<String>>] = &[
    Extractor {
        id: "participants-label",
        extract: participants_label,
    },
    Extractor {
        id: "who-worked-section",
        extract: who_worked_section,
    },
    Extractor {
        id: "agent-routed-field",
        extract: agent_routed_field,
    },
];

fn push_unique(names: &mut Vec<String>, name: &str) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        names.push(name.to_string());
    }
}

fn name_list(value: &str) -> Vec<String> {
    let mut names = Vec::new();
    for part in value.split([',', ';']) {
        let cleaned = strip_emphasis(part);
        push_unique(&mut names, strip_parenthetical(&cleaned));
    }
    names
}

fn non_empty(names: Vec<String>) -> Option<Vec<String>> {
    (!names.is_empty()).then_some(names)
}

fn participants_label(doc: &Document<'_>) -> Option<Vec<String>> {
    doc.outline
        .lines()
        .iter()
        .filter(|l| !is_table_row(l))
        .find_map(|l| labeled_value(l, &["participants"]))
        .and_then(|(_, value)| non_empty(name_list(&value)))
}

/// Name part of a bullet such as `**Alice:** fixed it` or `Bob (Dev) — review`.
fn name_from_bullet(item: &str) -> String {
    let plain = strip_emphasis(item);
    let cut = [":", " — ", " – ", " - "]
        .iter()
        .filter_map(|sep| plain.find(sep))
        .min()
        .unwrap_or(plain.len());
    strip_parenthetical(&plain[..cut]).to_string()
}

fn who_worked_section(doc: &Document<'_>) -> Option<Vec<String>> {
    let body = doc.outline.section(&["who worked"])?;
    let mut names = Vec::new();

    if let Some(table) = tables(body).into_iter().find(|t| !t.rows.is_empty()) {
        // First column; a header row without a separator is skipped by its text.
        for row in &table.rows {
            let Some(cell) = row.first() else { continue };
            let cell = strip_emphasis(cell);
            if matches!(heading_key(&cell).as_str(), "name" | "agent" | "who") {
                continue;
            }
            push_unique(&mut names, strip_parenthetical(&cell));
        }
    } else {
        for item in bullets(body) {
            push_unique(&mut names, &name_from_bullet(&item));
        }
    }
    non_empty(names)
}

fn agent_routed_field(doc: &Document<'_>) -> Option<Vec<String>> {
    doc.outline
        .lines()
        .iter()
        .find_map(|l| labeled_value(l, &["agent routed"]))
        .and_then(|(_, value)| non_empty(name_list(&value)))
}

// ---------------------------------------------------------------------------
// Summary extractors
// ---------------------------------------------------------------------------

pub static SUMMARY_EXTRACTORS: &[Extractor<String>] = &[
    Extractor {
        id: "summary-section",
        extract: summary_section,
    },
    Extractor {
        id: "outcome-field",
        extract: outcome_field,
    },
    Extractor {
        id: "heading-title",
        extract: heading_title,
    },
    Extractor {
        id: "first-paragraph",
        extract: first_paragraph,
    },
];

fn non_blank(s: String) -> Option<String> {
    let s = s.trim().to_string();
    (!s.is_empty()).then_some(s)
}

fn summary_section(doc: &Document<'_>) -> Option<String> {
    let body = doc.outline.section(&["summary"])?;
    let text: Vec<&str> = body
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !is_table_row(l) && !l.starts_with('#'))
        .map(|l| bullet_text(l).unwrap_or(l))
        .collect();
    non_blank(text.join(" "))
}

fn outcome_field(doc: &Document<'_>) -> Option<String> {
    doc.outline
        .lines()
        .iter()
        .filter(|l| is_table_row(l))
        .find_map(|l| labeled_value(l, &["outcome"]))
        .map(|(_, value)| value)
}

fn heading_title(doc: &Document<'_>) -> Option<String> {
    let heading = doc.outline.headings().first()?;
    let (_, title) = heading.text.split_once(['—', '–'])?;
    non_blank(strip_emphasis(title))
}

/// Lines like `**Participants:** ...` are metadata, not prose.
fn is_metadata_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("**") && t[2..].contains(":**") || t.starts_with("---")
}

fn first_paragraph(doc: &Document<'_>) -> Option<String> {
    let lines = doc.outline.lines();
    let start = doc.outline.headings().first().map_or(0, |h| h.line + 1);
    let mut paragraph: Vec<&str> = Vec::new();
    for line in &lines[start.min(lines.len())..] {
        let t = line.trim();
        let breaks = t.is_empty() || t.starts_with('#') || is_table_row(t);
        if breaks {
            if paragraph.is_empty() {
                continue;
            }
            break;
        }
        if is_metadata_line(t) || t.starts_with("```") || bullet_text(t).is_some() {
            if paragraph.is_empty() {
                continue;
            }
            break;
        }
        paragraph.push(t);
    }
    non_blank(strip_emphasis(&paragraph.join(" ")))
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn section_bullets(doc: &Document<'_>, matches: impl Fn(&str) -> bool) -> Vec<String> {
    doc.outline
        .section_where(matches)
        .map(bullets)
        .unwrap_or_default()
}

static WORK_ITEM_RE: OnceLock<Regex> = OnceLock::new();

fn work_item_re() -> &'static Regex {
    WORK_ITEM_RE.get_or_init(|| Regex::new(r"^\*\*([^*]+?):?\*\*:?\s*(.+)$").unwrap())
}

fn parse_work_item(item: &str) -> Option<WorkItem> {
    let (agent, description) = match work_item_re().captures(item) {
        Some(c) => (c[1].to_string(), c[2].to_string()),
        None => {
            let (agent, description) = item.split_once(": ")?;
            if agent.chars().count() > 40 {
                return None;
            }
            (agent.to_string(), description.to_string())
        }
    };
    let agent = strip_parenthetical(agent.trim_end_matches(':')).to_string();
    let description = strip_emphasis(&description);
    (!agent.is_empty() && !description.is_empty()).then_some(WorkItem { agent, description })
}

fn what_was_done(doc: &Document<'_>) -> Vec<WorkItem> {
    section_bullets(doc, |k| k.starts_with("what was done"))
        .iter()
        .filter_map(|item| parse_work_item(item))
        .collect()
}

// ---------------------------------------------------------------------------
// parse_log
// ---------------------------------------------------------------------------

/// Parse one log document. `text` should already be line-ending normalized.
pub fn parse_log(filename: &str, text: &str) -> LogEntry {
    parse_log_at(filename, text, Local::now().date_naive())
}

/// `parse_log` with an explicit "today" used as the date of last resort.
pub fn parse_log_at(filename: &str, text: &str, today: NaiveDate) -> LogEntry {
    let doc = Document::new(filename, text);

    let (date, timestamp, topic) = match parse_log_filename(filename) {
        Some(f) => (f.date, f.time, f.topic),
        None => {
            tracing::debug!(file = filename, "filename has no date; falling back to content");
            let date = first_date_in(text).unwrap_or(today);
            (date, None, UNKNOWN_TOPIC.to_string())
        }
    };

    let participants = first_match(PARTICIPANT_EXTRACTORS, &doc)
        .map(|(_, names)| names)
        .unwrap_or_default();

    let summary = first_match(SUMMARY_EXTRACTORS, &doc)
        .map(|(_, s)| s)
        .unwrap_or_else(|| topic.replace('-', " "));

    LogEntry {
        source: filename.to_string(),
        date,
        topic,
        timestamp,
        participants,
        summary,
        decisions: section_bullets(&doc, |k| {
            k.starts_with("decisions") || k.starts_with("key decisions")
        }),
        outcomes: section_bullets(&doc, |k| k.starts_with("outcome")),
        related_issues: section_bullets(&doc, |k| {
            k.starts_with("related") || k.starts_with("issues")
        }),
        what_was_done: what_was_done(&doc),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        day("2026-03-01")
    }

    #[test]
    fn filename_session_style() {
        let f = parse_log_filename("2026-02-14-parser-fix.md").unwrap();
        assert_eq!(f.date, day("2026-02-14"));
        assert_eq!(f.time, None);
        assert_eq!(f.topic, "parser-fix");
    }

    #[test]
    fn filename_routing_style() {
        let f = parse_log_filename("2026-02-14T0930-triage.md").unwrap();
        assert_eq!(f.time, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(f.topic, "triage");
    }

    #[test]
    fn filename_extraction_is_total_for_valid_names() {
        for name in [
            "2026-01-01-a.md",
            "2025-12-31T2359-long-topic-name.markdown",
            "2024-02-29-leap.txt",
        ] {
            let first = parse_log_filename(name).unwrap();
            assert_eq!(parse_log_filename(name).unwrap(), first);
            assert!(!first.topic.is_empty());
        }
    }

    #[test]
    fn filename_rejects_non_matching() {
        assert!(parse_log_filename("notes.md").is_none());
        assert!(parse_log_filename("2026-13-45-bad-date.md").is_none());
    }

    #[test]
    fn participants_label_with_what_was_done() {
        let text = "# Session\n\n**Participants:** Alice, Bob\n\n## What Was Done\n- **Alice:** Fixed the parser\n";
        let e = parse_log_at("2026-02-14-parser.md", text, today());
        assert_eq!(e.participants, vec!["Alice", "Bob"]);
        assert_eq!(
            e.what_was_done,
            vec![WorkItem {
                agent: "Alice".to_string(),
                description: "Fixed the parser".to_string()
            }]
        );
    }

    #[test]
    fn routing_table_agent_routed_only() {
        let text = "# Routing\n\n| Field | Value |\n|---|---|\n| **Agent routed** | Fury (Lead) |\n| **Why** | triage |\n";
        let e = parse_log_at("2026-02-14T1010-route.md", text, today());
        assert_eq!(e.participants, vec!["Fury"]);
        assert_eq!(e.kind(), LogKind::Routing);
    }

    #[test]
    fn who_worked_table_skips_header() {
        let text = "# Log\n## Who Worked\n| Name | Role |\n|------|------|\n| **Banner** | Dev |\n| Fury (Lead) | Lead |\n";
        let e = parse_log_at("2026-02-14-x.md", text, today());
        assert_eq!(e.participants, vec!["Banner", "Fury"]);
    }

    #[test]
    fn who_worked_table_uses_first_column() {
        let text = "# Log\n## Who Worked\n| Agent | Task |\n| Banner | tests |\n| Fury (Lead) | review |\n";
        let e = parse_log_at("2026-02-14-x.md", text, today());
        assert_eq!(e.participants, vec!["Banner", "Fury"]);

        let text = "# Log\n## Who Worked\n| Role | Name |\n|---|---|\n| Dev | Banner |\n";
        let e = parse_log_at("2026-02-14-x.md", text, today());
        assert_eq!(e.participants, vec!["Dev"]);
    }

    #[test]
    fn who_worked_bullets() {
        let text = "# Log\n## Who Worked\n- **Banner:** tests\n- Fury (Lead) — review\n";
        let e = parse_log_at("2026-02-14-x.md", text, today());
        assert_eq!(e.participants, vec!["Banner", "Fury"]);
    }

    #[test]
    fn participants_label_beats_later_strategies() {
        let text = "# Log\n**Participants:** Alice\n## Who Worked\n- Bob\n| **Agent routed** | Carol (QA) |\n";
        let e = parse_log_at("2026-02-14-x.md", text, today());
        assert_eq!(e.participants, vec!["Alice"]);
    }

    #[test]
    fn no_participants_is_empty() {
        let e = parse_log_at("2026-02-14-x.md", "just words", today());
        assert!(e.participants.is_empty());
    }

    #[test]
    fn summary_section_wins() {
        let text = "# Log — Heading title\n\nIntro prose.\n\n## Summary\nShipped the parser.\nAll green.\n";
        let e = parse_log_at("2026-02-14-x.md", text, today());
        assert_eq!(e.summary, "Shipped the parser. All green.");
    }

    #[test]
    fn summary_from_outcome_field_strips_emphasis() {
        let text = "# Routing — ignored\n| Field | Value |\n|---|---|\n| **Outcome** | **Routed** to Fury |\n";
        let e = parse_log_at("2026-02-14T0800-r.md", text, today());
        assert_eq!(e.summary, "Routed to Fury");
    }

    #[test]
    fn summary_from_heading_title() {
        let text = "# Session Log — Refactored discovery\n\nBody text.\n";
        let e = parse_log_at("2026-02-14-x.md", text, today());
        assert_eq!(e.summary, "Refactored discovery");
    }

    #[test]
    fn summary_first_paragraph_skips_tables() {
        let text = "# Session\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n**Participants:** Alice\n\nReal prose here\ncontinues.\n\nSecond paragraph.\n";
        let e = parse_log_at("2026-02-14-x.md", text, today());
        assert_eq!(e.summary, "Real prose here continues.");
    }

    #[test]
    fn summary_falls_back_to_topic() {
        let e = parse_log_at("2026-02-14-parser-fix.md", "# Only heading\n", today());
        assert_eq!(e.summary, "parser fix");
    }

    #[test]
    fn date_falls_back_to_content_then_today() {
        let e = parse_log_at("notes.md", "Worked on 2026-02-10 stuff", today());
        assert_eq!(e.date, day("2026-02-10"));
        assert_eq!(e.topic, UNKNOWN_TOPIC);

        let e = parse_log_at("notes.md", "no dates", today());
        assert_eq!(e.date, today());
    }

    #[test]
    fn labeled_lists() {
        let text = "# Log\n## Decisions\n- Use Rust\n## Outcomes\n- Tests pass\n## Related Issues\n- #42 parser\n- #7\n";
        let e = parse_log_at("2026-02-14-x.md", text, today());
        assert_eq!(e.decisions, vec!["Use Rust"]);
        assert_eq!(e.outcomes, vec!["Tests pass"]);
        assert_eq!(e.related_issues, vec!["#42 parser", "#7"]);
        assert_eq!(e.summary, "x");
    }

    #[test]
    fn missing_sections_are_empty() {
        let e = parse_log_at("2026-02-14-x.md", "# Log\n", today());
        assert!(e.decisions.is_empty());
        assert!(e.outcomes.is_empty());
        assert!(e.related_issues.is_empty());
        assert!(e.what_was_done.is_empty());
    }

    #[test]
    fn work_item_shapes() {
        assert_eq!(
            parse_work_item("**Fury (Lead):** Reviewed PR").unwrap().agent,
            "Fury"
        );
        assert_eq!(
            parse_work_item("**Banner**: wrote tests").unwrap().description,
            "wrote tests"
        );
        assert_eq!(parse_work_item("Carol: triaged").unwrap().agent, "Carol");
        assert!(parse_work_item("no separator here").is_none());
    }

    #[test]
    fn crlf_input_parses_after_normalization() {
        let raw = "# Log\r\n**Participants:** Alice\r\n## Summary\r\nDone.\r\n";
        let text = crate::text::normalize_eol(raw);
        let e = parse_log_at("2026-02-14-x.md", &text, today());
        assert_eq!(e.participants, vec!["Alice"]);
        assert_eq!(e.summary, "Done.");
    }
}
