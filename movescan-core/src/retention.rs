//! Periodic reclamation of the working-area and result pools.
//!
//! The scheduler sleeps until the next wall-clock period boundary (the top of
//! the hour by default), sweeps every pool, and goes back to sleep. Sweeps are
//! best effort: a child that cannot be removed is logged and counted, never
//! fatal. Pipeline runs and sweeps are not synchronised; runs only ever add
//! uniquely named entries and only the sweep deletes, so the worst case is a
//! run whose artifact disappears between creation and read.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default sweep cadence.
pub const DEFAULT_RETENTION_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Where the scheduler currently is in its cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RetentionState {
    Idle,
    Waiting { until: DateTime<Utc> },
    Sweeping,
    Stopped,
}

/// Observable scheduler status, published on every transition.
#[derive(Debug, Clone, Serialize)]
pub struct RetentionStatus {
    pub state: RetentionState,
    pub completed_sweeps: u64,
    pub last_report: Option<SweepReport>,
}

impl Default for RetentionStatus {
    fn default() -> Self {
        Self {
            state: RetentionState::Idle,
            completed_sweeps: 0,
            last_report: None,
        }
    }
}

/// Outcome of sweeping one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolSweep {
    pub root: PathBuf,
    pub removed: usize,
    pub failed: usize,
    /// The pool root could not be listed at all.
    pub unreadable: bool,
}

/// Outcome of one sweep over every pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub started_at: Option<DateTime<Utc>>,
    pub pools: Vec<PoolSweep>,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.pools.iter().map(|p| p.removed).sum()
    }

    pub fn failed(&self) -> usize {
        self.pools.iter().map(|p| p.failed).sum()
    }
}

/// First instant strictly after `now` that is a whole multiple of `period`
/// since the Unix epoch.
pub fn next_boundary(now: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    let period_ms = (period.as_millis() as i64).max(1);
    let now_ms = now.timestamp_millis();
    let next_ms = (now_ms.div_euclid(period_ms) + 1) * period_ms;
    DateTime::from_timestamp_millis(next_ms)
        .unwrap_or_else(|| now + chrono::Duration::milliseconds(period_ms))
}

/// How long to sleep from `now` until [`next_boundary`].
pub fn delay_until_next_boundary(now: DateTime<Utc>, period: Duration) -> Duration {
    (next_boundary(now, period) - now).to_std().unwrap_or(period)
}

/// Remove every immediate child of each pool that existed when the sweep
/// started. All pools are listed before anything is deleted, so entries
/// created during the sweep survive until the next one.
pub async fn sweep(pools: &[PathBuf]) -> SweepReport {
    let snapshot = take_snapshot(pools).await;
    remove_snapshot(snapshot).await
}

/// Pool listings captured at the start of a sweep. `None` marks a pool root
/// that could not be listed.
#[derive(Debug)]
pub(crate) struct SweepSnapshot {
    started_at: DateTime<Utc>,
    pools: Vec<(PathBuf, Option<Vec<PathBuf>>)>,
}

pub(crate) async fn take_snapshot(pools: &[PathBuf]) -> SweepSnapshot {
    let started_at = Utc::now();
    let mut listed = Vec::with_capacity(pools.len());
    for root in pools {
        listed.push((root.clone(), snapshot(root).await));
    }
    SweepSnapshot {
        started_at,
        pools: listed,
    }
}

/// Delete exactly the entries recorded in `snapshot`.
pub(crate) async fn remove_snapshot(snapshot: SweepSnapshot) -> SweepReport {
    let mut report = SweepReport {
        started_at: Some(snapshot.started_at),
        pools: Vec::with_capacity(snapshot.pools.len()),
    };

    for (root, children) in snapshot.pools {
        let mut pool = PoolSweep {
            root: root.clone(),
            ..PoolSweep::default()
        };

        let Some(children) = children else {
            pool.unreadable = true;
            report.pools.push(pool);
            continue;
        };

        for child in children {
            match remove_entry(&child).await {
                Ok(()) => pool.removed += 1,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    error!(path = %child.display(), error = %err, "failed to remove pool entry");
                    pool.failed += 1;
                }
            }
        }

        info!(
            pool = %root.display(),
            removed = pool.removed,
            failed = pool.failed,
            "pool swept"
        );
        report.pools.push(pool);
    }

    report
}

async fn snapshot(root: &Path) -> Option<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(pool = %root.display(), error = %err, "cannot list pool, skipping");
            return None;
        }
    };

    let mut children = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => children.push(entry.path()),
            Ok(None) => break,
            Err(err) => {
                warn!(pool = %root.display(), error = %err, "error while listing pool");
                break;
            }
        }
    }
    Some(children)
}

async fn remove_entry(path: &Path) -> std::io::Result<()> {
    let metadata = tokio::fs::symlink_metadata(path).await?;
    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}

/// Background task that sweeps the pools once per period boundary.
#[derive(Debug)]
pub struct RetentionScheduler {
    pools: Vec<PathBuf>,
    period: Duration,
    token: CancellationToken,
    status: watch::Sender<RetentionStatus>,
}

impl RetentionScheduler {
    pub fn new(pools: Vec<PathBuf>, period: Duration) -> Self {
        let (status, _) = watch::channel(RetentionStatus::default());
        Self {
            pools,
            period: period.max(Duration::from_millis(1)),
            token: CancellationToken::new(),
            status,
        }
    }


    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn pools(&self) -> &[PathBuf] {
        &self.pools
    }

    pub fn subscribe(&self) -> watch::Receiver<RetentionStatus> {
        self.status.subscribe()
    }

    /// Spawn [`RetentionScheduler::run`] onto the current runtime.
    pub fn spawn(self) -> RetentionHandle {
        let token = self.token.clone();
        let status = self.subscribe();
        let join = tokio::spawn(self.run());
        RetentionHandle {
            token,
            status,
            join,
        }
    }

    /// Wait, sweep, repeat, until cancelled. Cancellation is observed while
    /// waiting; a sweep already in progress runs to completion.
    pub async fn run(self) {
        info!(
            period_secs = self.period.as_secs(),
            pools = self.pools.len(),
            "retention scheduler started"
        );

        loop {
            let now = Utc::now();
            let until = next_boundary(now, self.period);
            let wait = (until - now).to_std().unwrap_or(self.period);
            self.status.send_modify(|s| s.state = RetentionState::Waiting { until });
            debug!(%until, wait_ms = wait.as_millis() as u64, "waiting for next sweep");

            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            self.status.send_modify(|s| s.state = RetentionState::Sweeping);
            let report = sweep(&self.pools).await;
            info!(
                removed = report.removed(),
                failed = report.failed(),
                "retention sweep finished"
            );
            self.status.send_modify(|s| {
                s.completed_sweeps += 1;
                s.last_report = Some(report);
            });
        }

        self.status.send_modify(|s| s.state = RetentionState::Stopped);
        info!("retention scheduler stopped");
    }
}

/// Owner handle for a spawned scheduler.
#[derive(Debug)]
pub struct RetentionHandle {
    token: CancellationToken,
    status: watch::Receiver<RetentionStatus>,
    join: JoinHandle<()>,
}

impl RetentionHandle {
    pub fn status(&self) -> watch::Receiver<RetentionStatus> {
        self.status.clone()
    }

    /// Cancel the scheduler and wait for its task to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(err) = self.join.await {
            error!(error = %err, "retention scheduler task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn boundary_is_next_top_of_hour() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 13, 27, 10).unwrap();
        let next = next_boundary(now, DEFAULT_RETENTION_PERIOD);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 9, 14, 0, 0).unwrap());
        assert_eq!(
            delay_until_next_boundary(now, DEFAULT_RETENTION_PERIOD),
            Duration::from_secs(32 * 60 + 50)
        );
    }

    #[test]
    fn boundary_on_exact_hour_moves_to_following_hour() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 0, 0).unwrap();
        let next = next_boundary(now, DEFAULT_RETENTION_PERIOD);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 9, 15, 0, 0).unwrap());
    }

    #[test]
    fn boundary_crosses_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let next = next_boundary(now, DEFAULT_RETENTION_PERIOD);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    fn populate(root: &Path) {
        fs::create_dir_all(root.join("area/extracted/pkg/bytecode_modules")).unwrap();
        fs::write(root.join("area/extracted/pkg/bytecode_modules/m.mv"), b"m").unwrap();
        fs::write(root.join("loose.json"), b"{}").unwrap();
    }

    #[tokio::test]
    async fn sweep_empties_every_pool() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("temp");
        let results = temp.path().join("results");
        populate(&work);
        populate(&results);

        let report = sweep(&[work.clone(), results.clone()]).await;

        assert_eq!(report.removed(), 4);
        assert_eq!(report.failed(), 0);
        assert_eq!(fs::read_dir(&work).unwrap().count(), 0);
        assert_eq!(fs::read_dir(&results).unwrap().count(), 0);
        assert!(work.is_dir(), "pool roots themselves are kept");
    }

    #[tokio::test]
    async fn missing_pool_does_not_stop_other_pools() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        let results = temp.path().join("results");
        populate(&results);

        let report = sweep(&[missing, results.clone()]).await;

        assert!(report.pools[0].unreadable);
        assert_eq!(report.pools[1].removed, 2);
        assert_eq!(fs::read_dir(&results).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn scheduler_sweeps_on_boundary_and_stops_on_cancel() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("temp");
        populate(&work);

        let scheduler =
            RetentionScheduler::new(vec![work.clone()], Duration::from_millis(50));
        let handle = scheduler.spawn();
        let mut status = handle.status();

        tokio::time::timeout(
            Duration::from_secs(5),
            status.wait_for(|s| s.completed_sweeps >= 1),
        )
        .await
        .expect("sweep within timeout")
        .unwrap();

        assert_eq!(fs::read_dir(&work).unwrap().count(), 0);

        let mut final_status = handle.status();
        handle.shutdown().await;
        let state = final_status.borrow_and_update().state.clone();
        assert_eq!(state, RetentionState::Stopped);
    }

    #[tokio::test]
    async fn entries_created_after_the_snapshot_survive_the_sweep() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("temp");
        let results = temp.path().join("results");
        populate(&work);
        fs::create_dir_all(&results).unwrap();

        let snapshot = take_snapshot(&[work.clone(), results.clone()]).await;
        fs::create_dir_all(work.join("fresh-area")).unwrap();
        fs::write(results.join("fresh.json"), b"{}").unwrap();

        let report = remove_snapshot(snapshot).await;

        assert_eq!(report.removed(), 2);
        assert!(work.join("fresh-area").is_dir());
        assert!(results.join("fresh.json").is_file());
        assert!(!work.join("area").exists());
        assert!(!work.join("loose.json").exists());

        let next = sweep(&[work.clone(), results.clone()]).await;
        assert_eq!(next.removed(), 2);
        assert_eq!(fs::read_dir(&work).unwrap().count(), 0);
    }
}
