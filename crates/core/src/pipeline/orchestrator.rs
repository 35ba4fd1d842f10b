//! The batch orchestrator coordinating scan, group, merge and clean

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use timelens_domain::{IdentitySet, Result, TimelensError};

use crate::cleaning::cleaner::{CleaningReport, EventCleaner};
use crate::identity::grouper::group_related_archives;
use crate::pipeline::merger::ArchiveMerger;
use crate::ports::{ArchiveStore, IdentityScanner};

/// One failed unit of work. Failures never abort the batch; unaffected
/// units complete normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub unit: String,
    pub error: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub archives_discovered: usize,
    pub archives_scanned: usize,
    pub groups: usize,
    pub cleaned: Vec<CleaningReport>,
    pub failures: Vec<UnitFailure>,
}

/// Runs the identity consolidation pipeline over many archives with a
/// bounded worker pool: identifier scanning fans out per archive, grouping
/// runs single-threaded over the complete scan results, and each resulting
/// user group is merged and cleaned as one independent unit.
pub struct PipelineOrchestrator {
    store: Arc<dyn ArchiveStore>,
    scanner: Arc<dyn IdentityScanner>,
    merger: Arc<ArchiveMerger>,
    cleaner: Arc<EventCleaner>,
    worker_count: usize,
}

impl PipelineOrchestrator {
    pub fn new(
        store: Arc<dyn ArchiveStore>,
        scanner: Arc<dyn IdentityScanner>,
        merger: Arc<ArchiveMerger>,
        cleaner: Arc<EventCleaner>,
        worker_count: usize,
    ) -> Self {
        Self { store, scanner, merger, cleaner, worker_count }
    }

    fn workers(&self) -> usize {
        if self.worker_count > 0 {
            self.worker_count
        } else {
            std::thread::available_parallelism().map(usize::from).unwrap_or(4)
        }
    }

    /// Run the whole batch. The returned report lists every cleaned
    /// archive and every failed unit; the orchestrator waits for all
    /// in-flight units before returning.
    pub async fn run(&self) -> Result<PipelineReport> {
        let run_id = Uuid::now_v7();
        let workers = self.workers();
        let archives = self.store.discover()?;
        info!(
            run_id = %run_id,
            archives = archives.len(),
            workers,
            "starting preprocessing run"
        );

        let mut failures = Vec::new();

        // Phase 1: identifier scanning, parallel per archive. Results are
        // re-ordered by discovery index so grouping stays deterministic
        // regardless of completion order.
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut join_set = JoinSet::new();
        for (index, rel) in archives.iter().cloned().enumerate() {
            let scanner = self.scanner.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(closed) => {
                        return (
                            index,
                            rel,
                            Err(TimelensError::Internal(format!("worker pool closed: {closed}"))),
                        )
                    }
                };
                let result = scanner.scan(&rel).await;
                (index, rel, result)
            });
        }

        let mut scans: Vec<Option<(String, IdentitySet)>> = vec![None; archives.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, rel, Ok(identifiers))) => scans[index] = Some((rel, identifiers)),
                Ok((_, rel, Err(err))) => {
                    warn!(archive = rel.as_str(), error = %err, "identifier scan failed");
                    failures.push(UnitFailure { unit: format!("scan {rel}"), error: err.to_string() });
                }
                Err(join_error) => {
                    error!(error = %join_error, "scan worker aborted");
                    failures.push(UnitFailure {
                        unit: "scan worker".to_string(),
                        error: join_error.to_string(),
                    });
                }
            }
        }

        let mut ordered: Vec<(String, IdentitySet)> = scans.into_iter().flatten().collect();
        let archives_scanned = ordered.len();

        // Phase 2: grouping is a global fixed-point computation; it must
        // see every scan result and runs single-threaded. Reverse
        // discovery order gives newer archives deterministic precedence.
        ordered.reverse();
        let groups = group_related_archives(&ordered);
        info!(groups = groups.len(), "grouped archives into users");

        // Phase 3: merge and clean, parallel per user group. One group's
        // merge and clean form a single unit of blocking work.
        let mut join_set = JoinSet::new();
        for group in groups.iter().cloned() {
            let merger = self.merger.clone();
            let cleaner = self.cleaner.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let unit = group.representative().unwrap_or("<empty group>").to_string();
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(closed) => {
                        return (
                            unit,
                            Err(TimelensError::Internal(format!("worker pool closed: {closed}"))),
                        )
                    }
                };
                let result = tokio::task::spawn_blocking(move || -> Result<CleaningReport> {
                    let rel = merger.merge(&group)?;
                    cleaner.clean(&rel)
                })
                .await
                .map_err(|join_error| {
                    TimelensError::Internal(format!("unit worker aborted: {join_error}"))
                })
                .and_then(|result| result);
                (unit, result)
            });
        }

        let mut cleaned = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(report))) => cleaned.push(report),
                Ok((unit, Err(err))) => {
                    warn!(unit = unit.as_str(), error = %err, "merge/clean unit failed");
                    failures.push(UnitFailure { unit, error: err.to_string() });
                }
                Err(join_error) => {
                    error!(error = %join_error, "merge/clean worker aborted");
                    failures.push(UnitFailure {
                        unit: "merge/clean worker".to_string(),
                        error: join_error.to_string(),
                    });
                }
            }
        }
        // Deterministic report order regardless of completion order.
        cleaned.sort_by(|a, b| a.archive.cmp(&b.archive));

        info!(
            run_id = %run_id,
            cleaned = cleaned.len(),
            failures = failures.len(),
            "preprocessing run finished"
        );
        Ok(PipelineReport {
            run_id,
            archives_discovered: archives.len(),
            archives_scanned,
            groups: groups.len(),
            cleaned,
            failures,
        })
    }
}
