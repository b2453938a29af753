//! Namesync — keep a profile display name in sync with a to-do list.
//!
//! # Usage
//!
//! ```text
//! namesync run [--dry-run] [--json]
//! namesync rules list [--json]
//! namesync rules add <user> --task-list <id> --normal-name <name> [...]
//! namesync rules enable <user>
//! namesync rules disable <user>
//! namesync credentials set <user> --provider tasks|profile --token <token>
//! namesync credentials remove <user> --provider tasks|profile
//! ```
//!
//! `run` is the entry point an external scheduler invokes on a fixed
//! cadence (conventionally every 15 minutes); everything else is local
//! administration of the rule and credential store.

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{credentials::CredentialsCommand, rules::RulesCommand, run::RunArgs};
use namesync_core::types::Provider;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "namesync",
    version,
    about = "Turn outstanding to-do items into a live profile display name",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process every eligible rule once (one scheduler tick).
    Run(RunArgs),

    /// Manage name-generation rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Manage provider bearer tokens.
    Credentials {
        #[command(subcommand)]
        command: CredentialsCommand,
    },
}

// ---------------------------------------------------------------------------
// Shared Provider argument — parsed from CLI strings, converts to core type
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse [`Provider`] from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct ProviderArg(pub Provider);

impl FromStr for ProviderArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tasks" => Ok(Self(Provider::Tasks)),
            "profile" => Ok(Self(Provider::Profile)),
            other => Err(format!(
                "unknown provider '{other}'; expected: tasks, profile"
            )),
        }
    }
}

impl fmt::Display for ProviderArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<ProviderArg> for Provider {
    fn from(p: ProviderArg) -> Self {
        p.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Rules { command } => commands::rules::run(command),
        Commands::Credentials { command } => commands::credentials::run(command),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
