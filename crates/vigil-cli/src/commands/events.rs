// crates/vigil-cli/src/commands/events.rs
//
// `vigil events`: read the persisted event journal.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use vigil_economics::{EngineEvent, StakingEngine};

use crate::output::{format_json, OutputFormat};
use crate::session::Session;

#[derive(Debug, Args)]
pub struct EventsCmd {
    /// First sequence number to read.
    #[arg(long, default_value_t = 1)]
    pub from: u64,
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Debug, Tabled)]
struct EventRow {
    #[tabled(rename = "Seq")]
    seq: u64,
    #[tabled(rename = "Event")]
    name: &'static str,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Serialize)]
struct JournalEntry<'a> {
    seq: u64,
    event: &'a EngineEvent,
}

/// Run the events command.
pub async fn run(cmd: &EventsCmd, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let events = StakingEngine::read_events(session.store(), cmd.from, cmd.limit).await?;
    match session.format {
        OutputFormat::Json => {
            let entries: Vec<JournalEntry<'_>> = events
                .iter()
                .map(|(seq, event)| JournalEntry { seq: *seq, event })
                .collect();
            println!("{}", format_json(&entries));
        }
        OutputFormat::Table => {
            let mut rows = Vec::with_capacity(events.len());
            for (seq, event) in &events {
                rows.push(EventRow {
                    seq: *seq,
                    name: event.name(),
                    detail: serde_json::to_string(event)?,
                });
            }
            println!("{}", crate::output::format_table(&rows));
        }
    }
    Ok(())
}
