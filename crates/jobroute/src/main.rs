//! Jobroute binary.
//!
//! Creates or reverts the job tree of a work order.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobroute::{
    dry_run_store, AppConfig, BatchError, ExpansionEngine, QuantityPolicy, ReversalEngine,
    WorkOrderForm, OPERATIONS,
};
use jobroute_store::RecordStore;

#[derive(Parser)]
#[command(name = "jobroute")]
#[command(version, about = "Work order expansion for the shop-floor job store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a work order into jobs, routes and machine assignments
    ///
    /// Examples:
    ///     jobroute create --work-order 123 --sub-ids 1 --qty 1=2 --qty 0=1 \
    ///         --cust-order-id SO-1001 --cust-order-line-no 1
    ///     jobroute create ... --dry-run --seed 7 --json
    #[command(verbatim_doc_comment)]
    Create {
        /// Work order suffix, appended to the configured prefix
        #[arg(long, value_name = "SUFFIX")]
        work_order: String,

        /// Number of sub-assemblies (the main assembly "0" is added)
        #[arg(long, value_name = "N")]
        sub_ids: u32,

        /// Quantity per sub-identifier
        #[arg(long = "qty", value_name = "SUB=QTY")]
        quantities: Vec<String>,

        /// Sales order identifier
        #[arg(long)]
        cust_order_id: String,

        /// Sales order line number
        #[arg(long)]
        cust_order_line_no: u32,

        /// Customer want date
        #[arg(long, value_name = "YYYY-MM-DD")]
        want_date: Option<String>,

        /// Drop sub-identifiers without a quantity instead of failing
        #[arg(long)]
        lenient: bool,

        /// Seed for synthesized field values
        #[arg(long)]
        seed: Option<u64>,

        /// Run against an in-memory store
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete everything created for a work order
    Delete {
        /// Work order suffix, appended to the configured prefix
        #[arg(long, value_name = "SUFFIX")]
        work_order: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the operation sequence every job is routed through
    Operations,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobroute=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    tracing::debug!(url = %config.url, prefix = %config.work_order_prefix, "Configuration loaded");

    match cli.command {
        Commands::Create {
            work_order,
            sub_ids,
            quantities,
            cust_order_id,
            cust_order_line_no,
            want_date,
            lenient,
            seed,
            dry_run,
            json,
        } => {
            let form = WorkOrderForm {
                work_order_suffix: work_order,
                sub_id_count: sub_ids,
                quantities: parse_quantities(&quantities)?,
                cust_order_id,
                cust_order_line_no,
                cust_order_want_date: want_date.as_deref().map(parse_want_date).transpose()?,
            };
            let policy = if lenient {
                QuantityPolicy::Lenient
            } else {
                QuantityPolicy::Strict
            };
            let request = form.into_request(&config.work_order_prefix, policy)?;

            let collections = config.collections();
            let store: Box<dyn RecordStore> = if dry_run {
                tracing::info!("Dry run against an in-memory store");
                Box::new(dry_run_store(&collections, &OPERATIONS).await)
            } else {
                Box::new(config.store_client())
            };
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let report = ExpansionEngine::new(&*store, collections, rng)
                .expand(&request)
                .await
                .context("Expansion failed")?;

            if json {
                print_json(&report)?;
            } else {
                println!("{}", report.summary());
                print_errors(&report.errors);
            }
        }

        Commands::Delete { work_order, json } => {
            let work_order = format!("{}{}", config.work_order_prefix, work_order.trim());
            if work_order == config.work_order_prefix {
                bail!("Work order number is required");
            }

            let store = config.store_client();
            let report = ReversalEngine::new(&store, config.collections())
                .revert(&work_order)
                .await
                .context("Revert failed")?;

            if json {
                print_json(&report)?;
            } else {
                println!("{}", report.summary());
                print_errors(&report.errors);
            }
        }

        Commands::Operations => {
            for op in OPERATIONS.iter() {
                println!("{:>4}  {:<14} {}", op.sequence, op.machine_id, op.name);
            }
        }
    }

    Ok(())
}

/// Parse `SUB=QTY` pairs.
fn parse_quantities(pairs: &[String]) -> Result<HashMap<String, u32>> {
    let mut quantities = HashMap::new();
    for pair in pairs {
        let (sub_id, qty) = pair
            .split_once('=')
            .with_context(|| format!("Invalid quantity '{}', expected SUB=QTY", pair))?;
        let qty: u32 = qty
            .trim()
            .parse()
            .with_context(|| format!("Invalid quantity '{}' for sub ID {}", qty, sub_id))?;
        quantities.insert(sub_id.trim().to_string(), qty);
    }
    Ok(quantities)
}

/// Midnight UTC of a calendar date.
fn parse_want_date(value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid want date '{}', expected YYYY-MM-DD", value))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid want date '{}'", value))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_errors(errors: &[BatchError]) {
    for err in errors {
        println!("  - {}", err);
    }
}
