use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use fable_engine::SessionConfig;
use fable_engine::random::session_rng;

/// Longest payload shown in the command table.
const PAYLOAD_WIDTH: usize = 60;

pub fn run(dir: &Path, file: Option<&Path>) -> Result<(), String> {
    let text = super::read_input(file)?;
    let parsed = fable_directive::parse(&text);

    if parsed.commands.is_empty() {
        println!("  No commands found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Command", "Payload"]);
    for (i, command) in parsed.commands.iter().enumerate() {
        table.add_row(vec![
            i.to_string(),
            command.kind.to_string(),
            truncate(&command.payload.to_string()),
        ]);
    }
    println!("{table}");

    let checked = fable_directive::validate(&parsed.commands);
    for e in &checked.errors {
        println!("  {}", e.to_string().yellow());
    }

    // Dry run against a copy of the saved state.
    let session = super::open_session(dir, SessionConfig::default())?;
    let mut state = session.state().clone();
    let mut rng = session_rng(None);
    let mut rejected = 0;
    for command in checked.valid.iter().cloned() {
        let label = command.label();
        if let Err(e) = state.apply(command, &mut rng) {
            println!("  {} {label}: {e}", "would reject".yellow());
            rejected += 1;
        }
    }

    println!();
    println!(
        "  {} valid, {} invalid, {} would be rejected",
        checked.valid.len(),
        checked.errors.len(),
        rejected
    );
    let narrative = state.narrative();
    println!(
        "  {} {} | depth {} | {}",
        "After".bold(),
        narrative.story_beat,
        narrative.depth_level,
        state.clock()
    );
    Ok(())
}

fn truncate(s: &str) -> String {
    if s.chars().count() > PAYLOAD_WIDTH {
        let head: String = s.chars().take(PAYLOAD_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}
