//! MCP server install commands: compile a descriptor and emit it through a
//! target adapter.

use crate::adapters::claude::ClaudeCliAdapter;
use crate::adapters::codex::CodexCliAdapter;
use crate::adapters::editor::EditorAdapter;
use crate::adapters::{InstallRequest, TargetAdapter};
use crate::compiler::{compile_auto, InstallCommandPayload};
use crate::descriptor::normalize;
use crate::error::Error;
use crate::inputs::{collect, StdinPrompter};
use crate::paths::default_store_path;
use crate::store::JsonFileStore;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Target {
    Editor,
    Claude,
    Codex,
}

fn load_payload(
    descriptor_path: &Path,
    package: Option<usize>,
    remote: Option<usize>,
) -> Result<InstallCommandPayload> {
    let content = std::fs::read_to_string(descriptor_path)
        .with_context(|| format!("failed to read {}", descriptor_path.display()))?;
    let raw: serde_json::Value =
        serde_json::from_str(&content).context("descriptor is not valid JSON")?;
    let server = normalize(&raw);
    Ok(compile_auto(&server, package, remote)?)
}

fn make_adapter(target: Target, store_path: Option<PathBuf>) -> Result<Box<dyn TargetAdapter>> {
    Ok(match target {
        Target::Editor => {
            let path = store_path.unwrap_or_else(default_store_path);
            Box::new(EditorAdapter::new(Box::new(JsonFileStore::open(path)?)))
        }
        Target::Claude => Box::new(ClaudeCliAdapter),
        Target::Codex => Box::new(CodexCliAdapter),
    })
}

pub fn run_install(
    descriptor_path: &Path,
    target: Target,
    package: Option<usize>,
    remote: Option<usize>,
    store_path: Option<PathBuf>,
) -> Result<()> {
    let payload = load_payload(descriptor_path, package, remote)?;
    let mut adapter = make_adapter(target, store_path)?;

    // the editor store keeps placeholders and prompts on its own
    let values = if matches!(target, Target::Editor) {
        Default::default()
    } else {
        collect(&payload.inputs, &mut StdinPrompter)?
    };
    let resolved = payload.resolved(&values);
    let masked = payload.masked();

    let outcome = match adapter.install(&InstallRequest {
        payload: &payload,
        resolved: &resolved,
        masked: &masked,
    }) {
        Ok(outcome) => outcome,
        Err(Error::CliUnavailable {
            binary,
            manual_command,
        }) => {
            // non-fatal: hand the user the exact command instead
            println!(
                "{} The {} CLI is not available. Run this yourself:",
                "!".yellow().bold(),
                binary.bold()
            );
            println!();
            println!("  {}", manual_command.cyan());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if outcome.success {
        println!(
            "{} {} installed via {}",
            "✓".green().bold(),
            payload.name.bold(),
            adapter.id()
        );
    } else {
        println!(
            "{} Install of {} did not complete.",
            "✗".red().bold(),
            payload.name.bold()
        );
        if let Some(manual) = outcome.manual_command {
            println!("  Copy and run it yourself:");
            println!();
            println!("  {}", manual.cyan());
        }
    }
    Ok(())
}

/// Dry run: compile and print the payload plus the manual commands, touching
/// nothing.
pub fn run_show(
    descriptor_path: &Path,
    package: Option<usize>,
    remote: Option<usize>,
) -> Result<()> {
    let payload = load_payload(descriptor_path, package, remote)?;
    let masked = payload.masked();

    println!("{}", "Compiled payload".bold());
    println!("{}", serde_json::to_string_pretty(&payload)?);
    println!();
    if !payload.inputs.is_empty() {
        println!("{}", "Inputs to collect before execution".bold());
        for input in &payload.inputs {
            let secrecy = if input.password { " (secret)" } else { "" };
            println!(
                "  - {}{}: {}",
                input.id.cyan(),
                secrecy.dimmed(),
                input.description.as_deref().unwrap_or("")
            );
        }
        println!();
    }
    println!("{}", "Manual commands".bold());
    println!("  {}", ClaudeCliAdapter.manual_command(&masked).cyan());
    println!("  {}", CodexCliAdapter.manual_command(&masked).cyan());
    Ok(())
}
