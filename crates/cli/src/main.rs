//! Timelens - batch consolidation of IDE feedback archives
//!
//! Wires the configuration, the filesystem adapters and the pipeline
//! together: consolidates raw archives into one cleaned archive per user,
//! then derives per-developer, per-day activity statistics.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use timelens_core::activities::report::build_report;
use timelens_core::ports::{ArchiveStore, EventSource};
use timelens_core::{
    default_filters, ActivityEngine, ArchiveMerger, EventCleaner, PipelineOrchestrator,
    PipelineReport,
};
use timelens_domain::{ActivityEvent, PipelineConfig};
use timelens_infra::{ArchiveLayout, CachedIdentityScanner, FsArchiveStore};

#[derive(Parser, Debug)]
#[command(
    name = "timelens",
    version,
    about = "Consolidates IDE feedback archives per user and derives activity timelines"
)]
struct Args {
    /// Configuration file (TOML). Without it, environment variables and
    /// default file locations are probed.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raw archive input directory (overrides the configuration).
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Merged working directory (overrides the configuration).
    #[arg(long)]
    merged_dir: Option<PathBuf>,

    /// Final output directory (overrides the configuration).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Worker pool size; 0 uses the available parallelism.
    #[arg(long)]
    workers: Option<usize>,

    /// Only consolidate archives, skip activity derivation.
    #[arg(long)]
    skip_activities: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = resolve_config(&args);

    let layout = ArchiveLayout::from_config(&config);
    let store: Arc<dyn ArchiveStore> = Arc::new(FsArchiveStore::new(layout.clone()));
    let scanner = Arc::new(CachedIdentityScanner::new(layout));
    let merger = Arc::new(ArchiveMerger::new(store.clone()));
    let cleaner = Arc::new(EventCleaner::with_filters(
        store.clone(),
        default_filters(&config.cleaning),
    ));

    let orchestrator =
        PipelineOrchestrator::new(store.clone(), scanner, merger, cleaner, config.worker_count);
    let report = orchestrator.run().await.context("pipeline run failed")?;

    write_json(&config.out_dir.join("pipeline_report.json"), &report)?;
    info!(
        users = report.cleaned.len(),
        failures = report.failures.len(),
        "consolidation finished"
    );

    if !args.skip_activities {
        derive_activities(&config, store.as_ref(), &report)?;
    }

    Ok(())
}

/// Merge configuration sources: file/env base, command line on top.
fn resolve_config(args: &Args) -> PipelineConfig {
    let mut config = match &args.config {
        Some(path) => timelens_infra::config::load_from_file(Some(path)).unwrap_or_else(|err| {
            warn!(error = %err, "failed to load configuration file, using defaults");
            PipelineConfig::default()
        }),
        None => timelens_infra::config::load().unwrap_or_default(),
    };

    if let Some(dir) = &args.raw_dir {
        config.raw_dir = dir.clone();
    }
    if let Some(dir) = &args.merged_dir {
        config.merged_dir = dir.clone();
    }
    if let Some(dir) = &args.out_dir {
        config.out_dir = dir.clone();
    }
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    config
}

/// Derive per-developer, per-day activity statistics from the cleaned
/// archives and write the activity report next to them.
fn derive_activities(
    config: &PipelineConfig,
    store: &dyn ArchiveStore,
    report: &PipelineReport,
) -> anyhow::Result<()> {
    let mut by_developer: BTreeMap<String, Vec<ActivityEvent>> = BTreeMap::new();
    for cleaned in &report.cleaned {
        let developer = developer_name(&cleaned.archive);
        let mut source = store
            .open_out(&cleaned.archive)
            .with_context(|| format!("open cleaned archive {}", cleaned.archive))?;
        let mut events = Vec::new();
        while let Some(event) = source
            .next_event()
            .with_context(|| format!("read cleaned archive {}", cleaned.archive))?
        {
            if let Some(resolved) = event.to_activity_event() {
                events.push(resolved);
            }
        }
        by_developer.insert(developer, events);
    }

    let engine = ActivityEngine::new(config.activity.clone());
    let timelines = engine.derive_timelines(&by_developer);
    let statistics = engine.evaluate(&timelines);
    let activity_report = build_report(&timelines, &statistics);

    write_json(&config.out_dir.join("activity_report.json"), &activity_report)?;
    info!(
        developers = activity_report.developers.len(),
        developer_days = activity_report.days.len(),
        "activity derivation finished"
    );
    Ok(())
}

/// The developer id of a cleaned archive: its relative path minus the
/// extension.
fn developer_name(rel: &str) -> String {
    Path::new(rel).with_extension("").to_string_lossy().replace('\\', "/")
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let payload = serde_json::to_vec_pretty(value).context("serialize report")?;
    std::fs::write(path, payload).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}
