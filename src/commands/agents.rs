//! Detect installed AI agents on the system.

use crate::agents::AGENTS;
use anyhow::Result;
use colored::Colorize;

pub fn run() -> Result<()> {
    println!("{}", "Detecting installed AI agents...".bold());
    println!();

    let mut found_any = false;
    for agent in AGENTS {
        if !agent.detect() {
            continue;
        }
        found_any = true;
        println!("  {} {}", "✓".green().bold(), agent.display_name.bold());
        println!("    Project skills: {}", agent.skills_dir.dimmed());
        match agent.global_skills_dir {
            Some(dir) => println!("    Global skills:  {}", dir.dimmed()),
            None => println!("    Global skills:  {}", "not supported".dimmed()),
        }
        println!();
    }

    if !found_any {
        println!("  {} No supported AI agents detected.", "!".yellow().bold());
        println!();
        println!("  Supported agents:");
        for agent in AGENTS {
            println!("    - {}", agent.display_name);
        }
    } else {
        println!(
            "{}",
            "Skill installs target detected agents unless --agent says otherwise.".dimmed()
        );
    }

    Ok(())
}
