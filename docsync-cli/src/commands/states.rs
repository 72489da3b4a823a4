use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use docsync_core::{resolve, DisplayState, SyncState};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::display_label;

#[derive(Args, Debug)]
pub struct StatesArgs {
    /// Print rows as a JSON array instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Resolution {
    content_loading: bool,
    has_content: bool,
    sync_state: SyncState,
    display_state: DisplayState,
}

#[derive(Tabled)]
struct ResolutionRow {
    #[tabled(rename = "content loading")]
    content_loading: String,
    #[tabled(rename = "content")]
    content: String,
    #[tabled(rename = "sync state")]
    sync_state: String,
    #[tabled(rename = "display state")]
    display_state: String,
}

impl StatesArgs {
    pub fn run(self) -> Result<()> {
        let rows = resolutions();
        if self.json {
            let json = serde_json::to_string_pretty(&rows).context("failed to serialize states")?;
            println!("{json}");
            return Ok(());
        }

        let table_rows: Vec<ResolutionRow> = rows
            .into_iter()
            .map(|row| ResolutionRow {
                content_loading: yes_no(row.content_loading),
                content: if row.content_loading {
                    "any".to_string()
                } else {
                    yes_no(row.has_content)
                },
                sync_state: if row.content_loading {
                    "any".to_string()
                } else {
                    sync_label(row.sync_state)
                },
                display_state: display_label(row.display_state).to_string(),
            })
            .collect();
        let mut table = Table::new(table_rows);
        table.with(Style::rounded());
        println!("{}", "Display state resolution".bold());
        println!("{table}");
        Ok(())
    }
}

/// Every settled combination of content presence and sync state, plus the
/// single row for an outstanding fetch.
fn resolutions() -> Vec<Resolution> {
    let mut rows = Vec::with_capacity(SyncState::ALL.len() * 2 + 1);
    for has_content in [false, true] {
        let content = has_content.then_some("page");
        for sync_state in SyncState::ALL {
            rows.push(Resolution {
                content_loading: false,
                has_content,
                sync_state,
                display_state: resolve(false, content, sync_state),
            });
        }
    }
    rows.push(Resolution {
        content_loading: true,
        has_content: false,
        sync_state: SyncState::Unset,
        display_state: resolve(true, None, SyncState::Unset),
    });
    rows
}

fn yes_no(value: bool) -> String {
    let label = if value { "yes" } else { "no" };
    label.to_string()
}

fn sync_label(state: SyncState) -> String {
    match state {
        SyncState::Unset => "(unset)".to_string(),
        other => other.as_str().to_string(),
    }
}
