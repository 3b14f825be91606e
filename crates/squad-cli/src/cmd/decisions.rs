use crate::output::{or_dash, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use squad_core::decision::DecisionEntry;
use squad_core::search::{parse_date_bound, search, DecisionFilter};
use squad_core::Squad;
use std::path::Path;

#[derive(Subcommand)]
pub enum DecisionsSubcommand {
    /// List decisions, most recent first
    List {
        /// Only decisions dated on or after this day (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// Only decisions dated on or before this day (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// Only decisions whose author contains this text
        #[arg(long)]
        author: Option<String>,
        /// Rank by relevance to these words
        #[arg(long)]
        query: Option<String>,
        /// Show at most this many decisions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Search decisions by title, author, and content
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// Show at most this many decisions
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub fn run(root: &Path, subcmd: DecisionsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DecisionsSubcommand::List {
            since,
            until,
            author,
            query,
            limit,
        } => {
            let filter = DecisionFilter {
                query,
                start: since.as_deref().map(parse_date_bound).transpose().context("invalid --since")?,
                end: until.as_deref().map(parse_date_bound).transpose().context("invalid --until")?,
                author,
            };
            list(root, &filter, limit, json)
        }
        DecisionsSubcommand::Search { query, limit } => find(root, &query.join(" "), limit, json),
    }
}

fn list(root: &Path, filter: &DecisionFilter, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let squad = Squad::open(root).context("failed to open squad")?;
    let decisions = squad.decisions();
    let mut hits = filter.apply(&decisions);
    if let Some(n) = limit {
        hits.truncate(n);
    }
    show(root, &hits, json)
}

fn find(root: &Path, query: &str, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let squad = Squad::open(root).context("failed to open squad")?;
    let decisions = squad.decisions();
    let mut hits = search(&decisions, query);
    if let Some(n) = limit {
        hits.truncate(n);
    }
    show(root, &hits, json)
}

fn show(root: &Path, hits: &[&DecisionEntry], json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&hits)?;
        return Ok(());
    }

    if hits.is_empty() {
        println!("No decisions found.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = hits
        .iter()
        .map(|d| {
            let file = d.file_path.strip_prefix(root).unwrap_or(d.file_path.as_path());
            vec![
                or_dash(d.date.as_deref()),
                or_dash(d.author.as_deref()),
                d.title.clone(),
                format!("{}:{}", file.display(), d.line_number),
            ]
        })
        .collect();
    print_table(&["DATE", "AUTHOR", "TITLE", "LOCATION"], rows);
    Ok(())
}
