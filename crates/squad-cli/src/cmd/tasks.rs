use crate::output::{print_json, print_table};
use anyhow::Context;
use squad_core::paths::slugify;
use squad_core::task::summarize;
use squad_core::types::{LogScope, TaskStatus};
use squad_core::Squad;
use std::path::Path;

pub fn run(
    root: &Path,
    all: bool,
    member: Option<&str>,
    status: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let status = status
        .map(str::parse::<TaskStatus>)
        .transpose()
        .context("invalid --status")?;
    let squad = Squad::open(root).context("failed to open squad")?;
    let scope = if all { LogScope::All } else { LogScope::Status };
    let derivation = squad.tasks(scope);

    let member_slug = member.map(slugify);
    let tasks: Vec<_> = derivation
        .tasks
        .iter()
        .filter(|t| member_slug.as_ref().map_or(true, |s| slugify(&t.assignee) == *s))
        .filter(|t| status.map_or(true, |s| t.status == s))
        .collect();

    if json {
        print_json(&serde_json::json!({
            "scope": scope,
            "tasks": tasks,
            "collisions": derivation.collisions,
            "summary": summarize(&derivation.tasks),
        }))?;
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        let rows: Vec<Vec<String>> = tasks
            .iter()
            .map(|t| {
                vec![
                    t.id.clone(),
                    t.status.to_string(),
                    t.assignee.clone(),
                    t.origin.to_string(),
                    t.title.clone(),
                ]
            })
            .collect();
        print_table(&["ID", "STATUS", "ASSIGNEE", "ORIGIN", "TITLE"], rows);
    }

    println!();
    println!("{} ({scope} logs)", summarize(&derivation.tasks));
    if !derivation.collisions.is_empty() {
        println!("{} duplicate task id(s) dropped", derivation.collisions.len());
    }
    Ok(())
}
