use std::path::Path;

use colored::Colorize;
use fable_engine::{SessionConfig, TurnReport};

pub fn run(
    dir: &Path,
    file: Option<&Path>,
    json: bool,
    seed: Option<u64>,
    count_words: bool,
) -> Result<(), String> {
    let text = super::read_input(file)?;
    let mut config = SessionConfig::default().with_word_count(count_words);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let mut session = super::open_session(dir, config)?;
    let report = session.process_turn(&text);

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{out}");
    } else {
        print_report(&report);
        let narrative = session.state().narrative();
        println!(
            "  {} {} | depth {} | {}",
            "Beat".bold(),
            narrative.story_beat,
            narrative.depth_level,
            session.state().clock()
        );
    }

    match report.error {
        Some(e) if !report.success => Err(e),
        _ => Ok(()),
    }
}

fn print_report(report: &TurnReport) {
    if !report.prose.trim().is_empty() {
        println!("{}", report.prose.trim_end());
        println!();
    }

    println!(
        "  {} command{} applied, {} validation error{}",
        report.commands_applied,
        if report.commands_applied == 1 { "" } else { "s" },
        report.validation_error_count,
        if report.validation_error_count == 1 { "" } else { "s" },
    );
    for e in &report.validation_errors {
        println!("    {}", e.to_string().yellow());
    }
    for r in &report.rejected {
        println!("    {} {r}", "rejected:".yellow());
    }
}
