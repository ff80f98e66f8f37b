//! Resource plan command line
//!
//! Reads opportunity snapshots and prints rollups or resolved rates as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rp_core::config::{AppConfig, LoggingConfig};
use rp_core::types::RecordId;
use rp_finance::{rollup_opportunity, weeks_between};
use rp_services::plans::ResolvePlanService;
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod snapshot;

use snapshot::Snapshot;

#[derive(Parser)]
#[command(author, version, about = "Resource plan rollups and rate resolution", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hours, cost, revenue and margins per line item, plan and opportunity
    Rollup {
        snapshot: PathBuf,
        /// First day of the reporting window; defaults to the earliest line item start
        #[arg(long = "weeks-from")]
        weeks_from: Option<NaiveDate>,
        /// Last day of the reporting window; defaults to the latest line item end
        #[arg(long = "weeks-to")]
        weeks_to: Option<NaiveDate>,
    },
    /// Resolved cost and rate for every line item of one plan
    Resolve {
        snapshot: PathBuf,
        #[arg(long)]
        plan: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting resource plan CLI");

    let output = match cli.command {
        Commands::Rollup {
            snapshot,
            weeks_from,
            weeks_to,
        } => rollup(&Snapshot::read(&snapshot)?, weeks_from, weeks_to)?,
        Commands::Resolve { snapshot, plan } => {
            resolve(&Snapshot::read(&snapshot)?, &RecordId::new(plan), &config)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Initialize tracing on stderr; stdout carries the JSON output
fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn rollup(
    snapshot: &Snapshot,
    weeks_from: Option<NaiveDate>,
    weeks_to: Option<NaiveDate>,
) -> Result<Value> {
    let weeks = match (weeks_from, weeks_to) {
        (None, None) => snapshot.weeks(),
        (from, to) => {
            let all = snapshot.weeks();
            let from = from.or_else(|| all.first().copied());
            let to = to.or_else(|| all.last().copied());
            match (from, to) {
                (Some(from), Some(to)) if to < from => {
                    bail!("--weeks-to {} is before --weeks-from {}", to, from)
                }
                (Some(from), Some(to)) => weeks_between(from, to),
                _ => Vec::new(),
            }
        }
    };
    debug!(weeks = weeks.len(), "Rolling up opportunity");

    let rollup = rollup_opportunity(&snapshot.opportunity, &weeks)?;
    Ok(serde_json::to_value(rollup)?)
}

fn resolve(snapshot: &Snapshot, plan_id: &RecordId, config: &AppConfig) -> Result<Value> {
    let Some(plan) = snapshot.plan(plan_id) else {
        bail!("Plan {} is not part of the snapshot", plan_id);
    };
    let reference = snapshot.reference_data(&config.currency)?;
    let service = ResolvePlanService::new(Arc::new(reference), config.rates.employee_cost_policy);

    let items = service
        .call(plan)
        .into_iter()
        .zip(&plan.line_items)
        .map(|(result, item)| match result.result() {
            Some(resolved) => serde_json::to_value(resolved).map_err(anyhow::Error::from),
            None => Ok(json!({
                "lineItemId": item.id,
                "errorCode": result.error_code(),
                "errors": result.full_messages(),
            })),
        })
        .collect::<Result<Vec<Value>>>()?;

    Ok(json!({
        "planId": plan.id,
        "currency": plan.currency,
        "lineItems": items,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tests::SNAPSHOT;

    fn snapshot() -> Snapshot {
        Snapshot::parse(SNAPSHOT.as_bytes()).unwrap()
    }

    #[test]
    fn test_rollup_whole_range() {
        let output = rollup(&snapshot(), None, None).unwrap();
        assert_eq!(output["totals"]["totalHours"], json!("40"));
        assert_eq!(output["totals"]["totalRevenue"], json!("4000.00"));
        assert_eq!(output["totals"]["billableExpenseAmount"], json!("400.00"));
    }

    #[test]
    fn test_rollup_window() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 17);
        let output = rollup(&snapshot(), from, None).unwrap();
        assert_eq!(output["totals"]["totalHours"], json!("20"));
    }

    #[test]
    fn test_rollup_inverted_window() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 17);
        let to = NaiveDate::from_ymd_opt(2024, 3, 10);
        assert!(rollup(&snapshot(), from, to).is_err());
    }

    #[test]
    fn test_resolve_plan() {
        let output = resolve(&snapshot(), &RecordId::from(4), &AppConfig::default()).unwrap();
        let item = &output["lineItems"][0];
        assert_eq!(item["cost"], json!("50.00"));
        assert_eq!(item["rate"], json!("100.00"));
    }

    #[test]
    fn test_resolve_unknown_plan() {
        assert!(resolve(&snapshot(), &RecordId::from(99), &AppConfig::default()).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "rp",
            "rollup",
            "snap.json",
            "--weeks-from",
            "2024-03-10",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Rollup { weeks_from: Some(_), weeks_to: None, .. }
        ));
    }
}
