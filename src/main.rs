//! agentry - install MCP servers and agent skills across AI-agent
//! ecosystems.
//!
//! # Usage
//!
//! ```bash
//! agentry agents                                  # detect installed agents
//! agentry mcp install server.json --target claude # compile + install a server
//! agentry mcp show server.json                    # dry run, print commands
//! agentry skill install ./skills --agent codex    # deploy skills
//! agentry skill list --scope global
//! agentry skill uninstall my-skill
//! ```

use agentry::agents::Scope;
use agentry::commands;
use agentry::commands::mcp::Target;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Install MCP servers and skills for AI agents.
#[derive(Parser)]
#[command(name = "agentry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect installed AI agents on this machine
    Agents,

    /// Compile and install MCP server descriptors
    Mcp {
        #[command(subcommand)]
        command: McpCommands,
    },

    /// Install, list, and uninstall agent skills
    Skill {
        #[command(subcommand)]
        command: SkillCommands,
    },
}

#[derive(Subcommand)]
enum McpCommands {
    /// Install a server from a descriptor file
    Install {
        /// Path to the server descriptor JSON
        descriptor: PathBuf,

        /// Where the compiled server goes
        #[arg(long, value_enum, default_value = "editor")]
        target: Target,

        /// Pick a package entry by index instead of auto-selecting
        #[arg(long)]
        package: Option<usize>,

        /// Pick a remote entry by index instead of auto-selecting
        #[arg(long, conflicts_with = "package")]
        remote: Option<usize>,

        /// Override the editor store file location
        #[arg(long)]
        store_path: Option<PathBuf>,
    },

    /// Compile a descriptor and print the result without installing
    Show {
        /// Path to the server descriptor JSON
        descriptor: PathBuf,

        /// Pick a package entry by index instead of auto-selecting
        #[arg(long)]
        package: Option<usize>,

        /// Pick a remote entry by index instead of auto-selecting
        #[arg(long, conflicts_with = "package")]
        remote: Option<usize>,
    },
}

#[derive(Subcommand)]
enum SkillCommands {
    /// Install skills from a git URL or local directory
    Install {
        /// Skill source: local path, git URL, or owner/repo shorthand
        source: String,

        /// Install only these skills (default: every discovered skill)
        #[arg(long = "skill")]
        names: Vec<String>,

        /// Target agents by id (default: all detected agents)
        #[arg(long = "agent")]
        agents: Vec<String>,

        /// Install scope
        #[arg(long, value_enum, default_value = "project")]
        scope: Scope,

        /// Workspace root for project scope (default: current directory)
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// Search the whole source tree instead of the top few levels
        #[arg(long)]
        full_depth: bool,
    },

    /// List installed skills
    List {
        /// Scope to inspect
        #[arg(long, value_enum, default_value = "project")]
        scope: Scope,

        /// Workspace root for project scope (default: current directory)
        #[arg(long)]
        workspace: Option<PathBuf>,
    },

    /// Remove an installed skill
    Uninstall {
        /// Skill name
        name: String,

        /// Remove for these agents only (when the skill allows it)
        #[arg(long = "agent")]
        agents: Vec<String>,

        /// Scope to remove from
        #[arg(long, value_enum, default_value = "project")]
        scope: Scope,

        /// Workspace root for project scope (default: current directory)
        #[arg(long)]
        workspace: Option<PathBuf>,
    },
}

fn workspace_or_cwd(scope: Scope, workspace: Option<PathBuf>) -> Option<PathBuf> {
    match (scope, workspace) {
        (_, Some(path)) => Some(path),
        (Scope::Project, None) => std::env::current_dir().ok(),
        (Scope::Global, None) => None,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Agents => commands::agents::run(),
        Commands::Mcp { command } => match command {
            McpCommands::Install {
                descriptor,
                target,
                package,
                remote,
                store_path,
            } => commands::mcp::run_install(&descriptor, target, package, remote, store_path),
            McpCommands::Show {
                descriptor,
                package,
                remote,
            } => commands::mcp::run_show(&descriptor, package, remote),
        },
        Commands::Skill { command } => match command {
            SkillCommands::Install {
                source,
                names,
                agents,
                scope,
                workspace,
                full_depth,
            } => {
                let workspace = workspace_or_cwd(scope, workspace);
                commands::skill::run_install(
                    &source,
                    &names,
                    &agents,
                    scope,
                    workspace.as_deref(),
                    full_depth,
                )
            }
            SkillCommands::List { scope, workspace } => {
                let workspace = workspace_or_cwd(scope, workspace);
                commands::skill::run_list(scope, workspace.as_deref())
            }
            SkillCommands::Uninstall {
                name,
                agents,
                scope,
                workspace,
            } => {
                let workspace = workspace_or_cwd(scope, workspace);
                commands::skill::run_uninstall(&name, &agents, scope, workspace.as_deref())
            }
        },
    }
}
