use std::path::Path;

use colored::Colorize;
use fable_engine::SessionConfig;

pub fn run(dir: &Path) -> Result<(), String> {
    let mut session = super::open_session(dir, SessionConfig::default())?;
    session
        .new_game()
        .map_err(|e| format!("failed to start a new game: {e}"))?;

    println!(
        "  {} a new game at {}",
        "Started".green().bold(),
        session.state().clock()
    );
    let kept = session.state().achievements().achievements.len();
    if kept > 0 {
        println!("  {kept} achievement definition(s) kept");
    }
    Ok(())
}
