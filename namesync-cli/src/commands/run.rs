//! `namesync run` — one synchronization tick over all eligible rules.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use namesync_engine::{DisableReason, RuleOutcome, RunReport, SkipReason};

/// Arguments for `namesync run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Report what would change without writing names or mutating rules.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;

        let engine = super::build_engine(&home)?.with_dry_run(self.dry_run);
        let report = super::runtime()?
            .block_on(engine.run_once())
            .context("sync run failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to render run JSON")?
            );
            return Ok(());
        }

        print_report(&report);
        Ok(())
    }
}

#[derive(Tabled)]
struct RunTableRow {
    #[tabled(rename = "user")]
    user: String,
    #[tabled(rename = "outcome")]
    outcome: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_report(report: &RunReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };

    if report.rules.is_empty() {
        println!("{prefix}✓ no eligible rules. Use `namesync rules add` first.");
        return;
    }

    let rows: Vec<RunTableRow> = report
        .rules
        .iter()
        .map(|r| {
            let (outcome, detail) = describe(&r.outcome);
            RunTableRow {
                user: r.user_id.to_string(),
                outcome,
                detail,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    println!(
        "{prefix}✓ processed {} rule(s) ({} updated, {} current, {} disabled, {} skipped, {} failed) in {}ms",
        report.rules.len(),
        report.updated(),
        report.already_current(),
        report.disabled(),
        report.skipped(),
        report.failed(),
        report.duration_ms,
    );
}

fn describe(outcome: &RuleOutcome) -> (String, String) {
    match outcome {
        RuleOutcome::Updated { name } => ("updated".green().to_string(), name.clone()),
        RuleOutcome::WouldUpdate { name } => ("would update".cyan().to_string(), name.clone()),
        RuleOutcome::AlreadyCurrent => ("current".dimmed().to_string(), String::new()),
        RuleOutcome::Disabled { reason } => ("disabled".red().to_string(), describe_disable(reason)),
        RuleOutcome::WouldDisable { reason } => {
            ("would disable".red().to_string(), describe_disable(reason))
        }
        RuleOutcome::Skipped { reason } => {
            ("skipped".yellow().to_string(), describe_skip(reason))
        }
        RuleOutcome::Failed { detail } => ("failed".yellow().to_string(), detail.clone()),
    }
}

fn describe_disable(reason: &DisableReason) -> String {
    match reason {
        DisableReason::Drift { remote_name } => {
            format!("manual edit detected: '{remote_name}'")
        }
        DisableReason::Auth { provider, detail } => {
            format!("{provider} credential rejected: {detail}")
        }
    }
}

fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::MissingCredentials { provider } => {
            format!("no {provider} credentials provisioned")
        }
        SkipReason::MissingBaseline => "no baseline name recorded".to_string(),
    }
}
