//! Data maintenance commands for the DTS database.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use domain::models::Task;
use domain::services::backfill_bonus_dates;
use persistence::repositories::TaskRepository;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use dts_api::{config::Config, maintenance::task_from_legacy, middleware::logging::init_logging};

#[derive(Debug, Parser)]
#[command(name = "dts-maintenance", version, about = "DTS data maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Set the bonus month on fully approved tasks that are missing one
    BackfillBonusDates {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Import tasks from a JSON array export
    ImportLegacyTasks {
        /// Path to the exported JSON file
        #[arg(long)]
        file: PathBuf,
        /// Convert and report without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load()?;
    init_logging(&config.logging)?;

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config).await?;
    persistence::db::run_migrations(&pool).await?;
    let repo = TaskRepository::new(pool);

    match cli.command {
        Command::BackfillBonusDates { dry_run } => backfill(&repo, dry_run).await,
        Command::ImportLegacyTasks { file, dry_run } => import(&repo, &file, dry_run).await,
    }
}

async fn backfill(repo: &TaskRepository, dry_run: bool) -> Result<()> {
    let tasks: Vec<Task> = repo
        .list_without_bonus_date()
        .await?
        .into_iter()
        .map(Task::from)
        .collect();
    let (changed, report) = backfill_bonus_dates(tasks, &Utc::now());

    let mut written = 0u64;
    if !dry_run {
        for task in &changed {
            let Some(period) = task.bonus_approval_date else {
                continue;
            };
            if repo.set_bonus_approval_date(task.id, period).await? {
                written += 1;
            }
        }
    }

    info!(
        updated = report.updated,
        skipped = report.skipped,
        written,
        dry_run,
        "Bonus month backfill finished"
    );
    println!(
        "eligible: {}, skipped: {}, written: {}{}",
        report.updated,
        report.skipped,
        written,
        if dry_run { " (dry run)" } else { "" }
    );
    Ok(())
}

async fn import(repo: &TaskRepository, file: &Path, dry_run: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let documents: Vec<Value> =
        serde_json::from_str(&raw).context("export must be a JSON array of task documents")?;

    let now = Utc::now();
    let (mut imported, mut duplicates, mut invalid) = (0u64, 0u64, 0u64);
    for (index, document) in documents.into_iter().enumerate() {
        let task = match task_from_legacy(document, now) {
            Ok(task) => task,
            Err(e) => {
                warn!(index, error = %e, "Skipping task document");
                invalid += 1;
                continue;
            }
        };
        if dry_run {
            imported += 1;
        } else if repo.insert(&task).await? {
            imported += 1;
        } else {
            duplicates += 1;
        }
    }

    info!(imported, duplicates, invalid, dry_run, "Legacy task import finished");
    println!(
        "imported: {}, duplicates: {}, invalid: {}{}",
        imported,
        duplicates,
        invalid,
        if dry_run { " (dry run)" } else { "" }
    );
    Ok(())
}
