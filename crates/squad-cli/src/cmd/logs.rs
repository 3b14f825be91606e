use crate::output::{or_dash, print_json, print_table};
use anyhow::Context;
use squad_core::text::truncate_chars;
use squad_core::types::LogScope;
use squad_core::Squad;
use std::path::Path;

pub fn run(root: &Path, all: bool, json: bool) -> anyhow::Result<()> {
    let squad = Squad::open(root).context("failed to open squad")?;
    let scope = if all { LogScope::All } else { LogScope::Status };
    let entries = squad.log_entries(scope);

    if json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| -> anyhow::Result<serde_json::Value> {
                let mut value = serde_json::to_value(e)?;
                value["kind"] = serde_json::to_value(e.kind())?;
                Ok(value)
            })
            .collect::<anyhow::Result<_>>()?;
        print_json(&items)?;
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries found ({scope} logs).");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            let date = match e.timestamp {
                Some(t) => format!("{} {}", e.date, t.format("%H:%M")),
                None => e.date.to_string(),
            };
            let participants = e.participants.join(", ");
            vec![
                date,
                e.kind().to_string(),
                e.topic.clone(),
                or_dash(Some(participants.as_str())),
                truncate_chars(&e.summary, 60),
            ]
        })
        .collect();
    print_table(&["DATE", "KIND", "TOPIC", "PARTICIPANTS", "SUMMARY"], rows);
    Ok(())
}
