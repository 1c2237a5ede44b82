use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use fable_core::EntityKind;
use fable_engine::SessionConfig;

pub fn run(dir: &Path) -> Result<(), String> {
    let session = super::open_session(dir, SessionConfig::default())?;
    let state = session.state();
    let narrative = state.narrative();

    println!("  {} {}", "Fable".bold(), dir.display().to_string().dimmed());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Narrative", "Value"]);
    table.add_row(vec!["beat".to_string(), narrative.story_beat.to_string()]);
    table.add_row(vec!["cycle".to_string(), narrative.current_cycle.to_string()]);
    table.add_row(vec!["depth".to_string(), narrative.depth_level.to_string()]);
    table.add_row(vec!["time".to_string(), state.clock().to_string()]);
    table.add_row(vec!["total words".to_string(), narrative.total_words.to_string()]);
    table.add_row(vec![
        "cycle words".to_string(),
        narrative.current_cycle_words.to_string(),
    ]);
    if let Some(words) = narrative.current_beat_words() {
        table.add_row(vec!["beat words".to_string(), words.to_string()]);
    }
    let history: Vec<String> = state.rhythm().depth_history().map(|d| d.to_string()).collect();
    if !history.is_empty() {
        table.add_row(vec!["depth history".to_string(), history.join(" ")]);
    }
    println!("{table}");

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Collection", "Count", "Names"]);
    let doc = state.document();
    for kind in EntityKind::ALL {
        let names = doc.names(kind);
        let listed = if names.is_empty() {
            "—".to_string()
        } else {
            names.join(", ")
        };
        table.add_row(vec![kind.to_string(), doc.count(kind).to_string(), listed]);
    }
    println!("{table}");

    let achievements = state.achievements();
    let done = achievements
        .achievements
        .iter()
        .filter(|a| a.is_completed)
        .count();
    println!();
    println!(
        "  {done}/{} achievements completed",
        achievements.achievements.len()
    );
    Ok(())
}
