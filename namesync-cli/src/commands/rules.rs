//! `namesync rules` — rule administration (the excluded UI layer's job,
//! done locally).

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use namesync_core::types::{Rule, TaskListId, UserId};
use namesync_core::{JsonRuleStore, RuleStore};

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List all rules, enabled or not.
    List(ListArgs),
    /// Create or replace a rule and push its initial name.
    Add(AddArgs),
    /// Re-enable automation (re-applies the rule to get a fresh baseline).
    Enable(EnableArgs),
    /// Halt automation for a user.
    Disable(DisableArgs),
}

pub fn run(command: RulesCommand) -> Result<()> {
    let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
    match command {
        RulesCommand::List(args) => list(&home, args),
        RulesCommand::Add(args) => add(&home, args),
        RulesCommand::Enable(args) => enable(&home, args),
        RulesCommand::Disable(args) => disable(&home, args),
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct RuleTableRow {
    #[tabled(rename = "user")]
    user: String,
    #[tabled(rename = "task list")]
    task_list: String,
    #[tabled(rename = "automation")]
    automation: String,
    #[tabled(rename = "idle name")]
    normal_name: String,
    #[tabled(rename = "last written")]
    last_written: String,
}

fn list(home: &std::path::Path, args: ListArgs) -> Result<()> {
    let store = JsonRuleStore::at(home);
    let rules = store.list_rules().context("failed to load rules")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rules).context("failed to render rules JSON")?
        );
        return Ok(());
    }

    if rules.is_empty() {
        println!("No rules. Use `namesync rules add` first.");
        return Ok(());
    }

    let rows: Vec<RuleTableRow> = rules
        .iter()
        .map(|r| RuleTableRow {
            user: r.user_id.to_string(),
            task_list: r.task_list_id.to_string(),
            automation: if r.enabled {
                "on".green().to_string()
            } else {
                "off".red().to_string()
            },
            normal_name: r.normal_name.clone(),
            last_written: r.last_generated_name.clone().unwrap_or_default(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct AddArgs {
    /// User the rule belongs to.
    pub user: String,

    /// Task list to render the name from.
    #[arg(long)]
    pub task_list: String,

    /// Display name used when no outstanding tasks exist.
    #[arg(long)]
    pub normal_name: String,

    /// Prefix used when tasks exist.
    #[arg(long, default_value = "")]
    pub beginning_text: String,

    /// Joined between task titles.
    #[arg(long, default_value = ", ")]
    pub separator: String,

    /// Suffix used when tasks exist.
    #[arg(long, default_value = "")]
    pub end_text: String,

    /// Save the rule disabled without contacting any provider.
    #[arg(long)]
    pub no_apply: bool,
}

fn add(home: &std::path::Path, args: AddArgs) -> Result<()> {
    let store = JsonRuleStore::at(home);
    let user_id = UserId::from(args.user.as_str());
    let now = Utc::now();

    // Replacing an existing rule keeps its creation time.
    let created_at = store
        .get_rule(&user_id)
        .map(|existing| existing.created_at)
        .unwrap_or(now);

    let mut rule = Rule {
        user_id: user_id.clone(),
        task_list_id: TaskListId::from(args.task_list.as_str()),
        beginning_text: args.beginning_text,
        separator: args.separator,
        end_text: args.end_text,
        normal_name: args.normal_name,
        enabled: false,
        last_generated_name: None,
        created_at,
        updated_at: now,
    };

    if args.no_apply {
        store.save_rule(&rule).context("failed to save rule")?;
        println!(
            "✓ rule for '{user_id}' saved (automation off). Run `namesync rules enable {user_id}` to start."
        );
        return Ok(());
    }

    let name = apply(home, &rule)?;
    rule.enabled = true;
    rule.last_generated_name = Some(name.clone());
    store.save_rule(&rule).context("failed to save rule")?;

    println!("✓ rule for '{user_id}' enabled — profile name set to '{name}'");
    Ok(())
}

// ---------------------------------------------------------------------------
// enable / disable
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct EnableArgs {
    /// User whose rule to re-enable.
    pub user: String,
}

fn enable(home: &std::path::Path, args: EnableArgs) -> Result<()> {
    let store = JsonRuleStore::at(home);
    let user_id = UserId::from(args.user.as_str());
    let mut rule = store
        .get_rule(&user_id)
        .with_context(|| format!("no rule for '{user_id}'"))?;

    // A fresh apply establishes the new drift baseline.
    let name = apply(home, &rule)?;
    rule.enabled = true;
    rule.last_generated_name = Some(name.clone());
    rule.updated_at = Utc::now();
    store.save_rule(&rule).context("failed to save rule")?;

    println!("✓ automation for '{user_id}' enabled — profile name set to '{name}'");
    Ok(())
}

#[derive(Args, Debug)]
pub struct DisableArgs {
    /// User whose rule to halt.
    pub user: String,
}

fn disable(home: &std::path::Path, args: DisableArgs) -> Result<()> {
    let store = JsonRuleStore::at(home);
    let user_id = UserId::from(args.user.as_str());
    store
        .disable(&user_id)
        .with_context(|| format!("failed to disable rule for '{user_id}'"))?;
    println!("✓ automation for '{user_id}' disabled");
    Ok(())
}

fn apply(home: &std::path::Path, rule: &Rule) -> Result<String> {
    let engine = super::build_engine(home)?;
    super::runtime()?
        .block_on(engine.apply_rule(rule))
        .with_context(|| format!("failed to apply rule for '{}'", rule.user_id))
}
