use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use fable_engine::SessionConfig;

pub fn define(dir: &Path, name: &str, hidden: bool) -> Result<(), String> {
    let mut session = super::open_session(dir, SessionConfig::default())?;
    if !session.state_mut().define_achievement(name, hidden) {
        return Err(format!("achievement '{name}' already exists"));
    }
    session.save().map_err(|e| e.to_string())?;

    println!("  {} achievement '{name}'", "Defined".green().bold());
    Ok(())
}

pub fn list(dir: &Path) -> Result<(), String> {
    let session = super::open_session(dir, SessionConfig::default())?;
    let book = session.state().achievements();

    let visible: Vec<_> = book.visible().collect();
    if visible.is_empty() {
        println!("  No achievements.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Status", "Completed at"]);
    for a in &visible {
        let status = if a.is_completed { "completed" } else { "open" };
        let at = book
            .completed_log
            .iter()
            .find(|c| c.name == a.name)
            .map(|c| c.completed_at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "—".to_string());
        table.add_row(vec![a.name.clone(), status.to_string(), at]);
    }
    println!("{table}");

    let hidden = book.achievements.len() - visible.len();
    if hidden > 0 {
        println!("  {hidden} hidden");
    }
    Ok(())
}

pub fn clear(dir: &Path) -> Result<(), String> {
    let mut session = super::open_session(dir, SessionConfig::default())?;
    session.state_mut().clear_completed_achievements();
    session.save().map_err(|e| e.to_string())?;

    println!("  {} achievement progress", "Cleared".green().bold());
    Ok(())
}
