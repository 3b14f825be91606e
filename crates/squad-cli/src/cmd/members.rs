use crate::output::{or_dash, print_json, print_table};
use anyhow::Context;
use squad_core::Squad;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let squad = Squad::open(root).context("failed to open squad")?;
    let members = squad.members();

    if json {
        print_json(&members)?;
        return Ok(());
    }

    if members.is_empty() {
        println!("No members found.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = members
        .iter()
        .map(|m| {
            vec![
                m.name.clone(),
                m.role.clone(),
                m.status.to_string(),
                or_dash(m.activity.as_ref().map(|a| a.short_label.as_str())),
            ]
        })
        .collect();
    print_table(&["NAME", "ROLE", "STATUS", "ACTIVITY"], rows);
    Ok(())
}
