use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::Local;
use squad_core::task::velocity;
use squad_core::types::LogScope;
use squad_core::Squad;
use std::path::Path;

pub fn run(root: &Path, days: u32, json: bool) -> anyhow::Result<()> {
    let squad = Squad::open(root).context("failed to open squad")?;
    let derivation = squad.tasks(LogScope::All);
    let today = Local::now().date_naive();
    let per_day = velocity(&derivation.tasks, today, days);
    let total: usize = per_day.iter().map(|(_, n)| n).sum();

    if json {
        let days: Vec<_> = per_day
            .iter()
            .map(|(date, n)| serde_json::json!({ "date": date, "completed": n }))
            .collect();
        print_json(&serde_json::json!({ "days": days, "total": total }))?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = per_day
        .iter()
        .map(|(date, n)| vec![date.to_string(), n.to_string(), "#".repeat(*n)])
        .collect();
    print_table(&["DATE", "COMPLETED", ""], rows);
    println!();
    println!("{total} task(s) completed in the last {days} day(s)");
    Ok(())
}
