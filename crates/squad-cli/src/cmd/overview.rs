use crate::output::{print_json, print_table};
use anyhow::Context;
use squad_core::task::summarize;
use squad_core::types::LogScope;
use squad_core::{Squad, SquadCache};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let squad = Squad::open(root).context("failed to open squad")?;
    let mut cache = SquadCache::new(squad);

    let members = cache.members().to_vec();
    let tier = cache.roster().tier;
    let active = summarize(&cache.tasks(LogScope::Status).tasks);
    let history = summarize(&cache.tasks(LogScope::All).tasks);
    let decisions = cache.decisions().len();
    let latest = cache.decisions().first().map(|d| d.title.clone());

    if json {
        print_json(&serde_json::json!({
            "members": members,
            "roster_source": tier,
            "active_tasks": active,
            "all_tasks": history,
            "decisions": decisions,
            "latest_decision": latest,
        }))?;
        return Ok(());
    }

    match tier {
        Some(tier) => println!("Members ({}, from {tier}):", members.len()),
        None => println!("Members: none found"),
    }
    if !members.is_empty() {
        let rows: Vec<Vec<String>> = members
            .iter()
            .map(|m| vec![m.name.clone(), m.status.to_string()])
            .collect();
        print_table(&["NAME", "STATUS"], rows);
    }
    println!();
    println!("Active tasks:  {active}");
    println!("All tasks:     {history}");
    match latest {
        Some(title) => println!("Decisions:     {decisions} (latest: {title})"),
        None => println!("Decisions:     {decisions}"),
    }
    Ok(())
}
