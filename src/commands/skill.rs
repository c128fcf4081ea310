//! Skill commands: install from a source, list what is installed, uninstall.

use crate::agents::{by_id, detected, AgentDefinition, Scope};
use crate::skills::discovery::{discover, DiscoveryOptions};
use crate::skills::installer::{
    install_batch, uninstall_batch, BatchReport, CopyInstaller, InstallStrategy, SkillFiles,
    SymlinkWithCopyFallback,
};
use crate::skills::policy::{policy_for, scan_installed, UninstallPolicy};
use crate::skills::source::{resolve, SkillSource};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

fn resolve_agents(ids: &[String]) -> Result<Vec<&'static AgentDefinition>> {
    if ids.is_empty() {
        let agents: Vec<_> = detected()
            .into_iter()
            .filter(|agent| !agent.universal)
            .collect();
        if agents.is_empty() {
            bail!("no AI agents detected; pass --agent to pick one explicitly");
        }
        return Ok(agents);
    }
    ids.iter()
        .map(|id| by_id(id).with_context(|| format!("unknown agent '{id}'")))
        .collect()
}

fn print_report(report: &BatchReport) {
    for pair in &report.installed {
        let mode = if pair.symlink_failed {
            "copied (symlink failed)".to_string()
        } else {
            pair.mode.to_string()
        };
        println!(
            "  {} {} → {} ({})",
            "✓".green(),
            pair.skill.bold(),
            pair.agent,
            mode.dimmed()
        );
    }
    for failure in &report.failed {
        println!(
            "  {} {} → {}: {}",
            "✗".red(),
            failure.skill.bold(),
            failure.agent,
            failure.error
        );
    }
}

pub fn run_install(
    source_ref: &str,
    names: &[String],
    agent_ids: &[String],
    scope: Scope,
    workspace: Option<&Path>,
    full_depth: bool,
) -> Result<()> {
    let agents = resolve_agents(agent_ids)?;
    let source = SkillSource::parse(source_ref)?;

    println!(
        "{} Resolving skills from {}...",
        "→".blue().bold(),
        source_ref.cyan()
    );
    let resolved = resolve(&source)?;
    let root = resolved.scan_root();

    let options = DiscoveryOptions {
        full_depth,
        // naming specific skills implies internal ones are wanted too
        include_internal: !names.is_empty(),
    };
    let discovered = discover(&root, &options)?;
    if discovered.is_empty() {
        bail!("no skills found under {}", root.display());
    }

    let selected: Vec<SkillFiles> = if names.is_empty() {
        discovered
            .iter()
            .map(|skill| SkillFiles {
                name: skill.name.clone(),
                dir: root.join(&skill.path),
            })
            .collect()
    } else {
        names
            .iter()
            .map(|name| {
                discovered
                    .iter()
                    .find(|skill| &skill.name == name)
                    .map(|skill| SkillFiles {
                        name: skill.name.clone(),
                        dir: root.join(&skill.path),
                    })
                    .with_context(|| format!("skill '{name}' not found in source"))
            })
            .collect::<Result<_>>()?
    };

    // a clone is removed after this call returns; symlinks into it would
    // dangle, so temporary sources always install by copy
    let copy_only = CopyInstaller;
    let fallback = SymlinkWithCopyFallback::default();
    let strategy: &dyn InstallStrategy = if resolved.is_temporary() {
        &copy_only
    } else {
        &fallback
    };

    println!(
        "{} Installing {} skill(s) for {} agent(s) ({} scope)...",
        "→".blue().bold(),
        selected.len(),
        agents.len(),
        scope
    );
    let report = install_batch(&selected, &agents, scope, workspace, strategy);
    print_report(&report);

    println!();
    if report.failed.is_empty() {
        println!(
            "{} {} skill install(s) completed",
            "✓".green().bold(),
            report.installed.len()
        );
    } else if report.installed.is_empty() {
        bail!("all {} skill install(s) failed", report.failed.len());
    } else {
        println!(
            "{} {} installed, {} failed",
            "⚠".yellow().bold(),
            report.installed.len(),
            report.failed.len()
        );
    }
    Ok(())
}

#[derive(Tabled)]
struct SkillRow {
    #[tabled(rename = "Skill")]
    name: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Agents")]
    agents: String,
    #[tabled(rename = "Uninstall")]
    policy: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub fn run_list(scope: Scope, workspace: Option<&Path>) -> Result<()> {
    let records = scan_installed(scope, workspace);
    if records.is_empty() {
        println!("No skills installed at {scope} scope.");
        return Ok(());
    }

    let rows: Vec<SkillRow> = records
        .iter()
        .map(|record| SkillRow {
            name: record.name.clone(),
            scope: record.scope.to_string(),
            agents: record.agents.join(", "),
            policy: match &record.policy {
                UninstallPolicy::AgentSelect => "per agent".to_string(),
                UninstallPolicy::AllAgents { .. } => "all agents together".to_string(),
            },
            description: record.description.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

pub fn run_uninstall(
    name: &str,
    agent_ids: &[String],
    scope: Scope,
    workspace: Option<&Path>,
) -> Result<()> {
    // policy is recomputed from disk now, not from install time
    let record = policy_for(name, scope, workspace)
        .with_context(|| format!("skill '{name}' is not installed at {scope} scope"))?;

    let target_ids: Vec<String> = match &record.policy {
        UninstallPolicy::AllAgents { reason } => {
            let requested_subset = !agent_ids.is_empty()
                && agent_ids.iter().collect::<std::collections::HashSet<_>>()
                    != record.agents.iter().collect();
            if requested_subset {
                bail!(
                    "'{name}' cannot be uninstalled per agent: {reason}. \
                     Re-run without --agent to remove it everywhere."
                );
            }
            record.agents.clone()
        }
        UninstallPolicy::AgentSelect => {
            if agent_ids.is_empty() {
                record.agents.clone()
            } else {
                for id in agent_ids {
                    if !record.agents.contains(id) {
                        bail!("'{name}' is not installed for agent '{id}'");
                    }
                }
                agent_ids.to_vec()
            }
        }
    };

    let agents = resolve_agents(&target_ids)?;
    println!(
        "{} Removing {} from {} agent(s)...",
        "→".blue().bold(),
        name.bold(),
        agents.len()
    );
    let report = uninstall_batch(&[name.to_string()], &agents, scope, workspace);

    for pair in &report.removed {
        println!("  {} {} → {}", "✓".green(), pair.skill.bold(), pair.agent);
    }
    for failure in &report.failed {
        println!(
            "  {} {} → {}: {}",
            "✗".red(),
            failure.skill.bold(),
            failure.agent,
            failure.error
        );
    }

    if report.removed.is_empty() && !report.failed.is_empty() {
        bail!("uninstall failed for every agent");
    }
    Ok(())
}
