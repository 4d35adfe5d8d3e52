//! Daily reset background daemon.
//!
//! Sleeps until the next calendar-day boundary of the engine's calendar and
//! then clears every user's checklist through
//! [`ProgressService::reset_all_daily`]. Lazy reconciliation already resets
//! progress on first access, so the daemon is optional.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::domain::models::SchedulerConfig;
use crate::domain::ports::ProgressRepository;
use crate::services::progress_service::{ProgressService, SweepReport};

/// Configuration for the daily reset daemon.
#[derive(Debug, Clone)]
pub struct DailyResetConfig {
    /// Sweep once immediately after starting.
    pub run_on_startup: bool,
    /// Consecutive failed sweeps before the daemon gives up. Zero never gives up.
    pub max_consecutive_failures: u32,
    /// Extra wait past midnight so the sweep observes the new day.
    pub boundary_grace: Duration,
}

impl Default for DailyResetConfig {
    fn default() -> Self {
        Self {
            run_on_startup: false,
            max_consecutive_failures: 5,
            boundary_grace: Duration::from_secs(1),
        }
    }
}

impl From<&SchedulerConfig> for DailyResetConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            run_on_startup: config.run_on_startup,
            max_consecutive_failures: config.max_consecutive_failures,
            ..Self::default()
        }
    }
}

/// Event emitted by the daily reset daemon.
#[derive(Debug, Clone)]
pub enum DailyResetEvent {
    /// The daemon loop began.
    Started,
    /// A sweep is about to run.
    SweepStarted {
        /// 1-based sweep counter.
        run_number: u64,
    },
    /// A sweep finished; per-user failures are in the report.
    SweepCompleted {
        /// 1-based sweep counter.
        run_number: u64,
        /// Per-user outcome.
        report: SweepReport,
        /// Wall time of the sweep.
        duration_ms: u64,
    },
    /// Listing users failed, so nothing was reset.
    SweepFailed {
        /// 1-based sweep counter.
        run_number: u64,
        /// Error text.
        error: String,
    },
    /// The daemon loop exited.
    Stopped {
        /// Why it exited.
        reason: StopReason,
    },
}

/// Reason the daemon stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// [`DaemonHandle::stop`] was called.
    Requested,
    /// `max_consecutive_failures` sweeps failed in a row.
    TooManyFailures,
    /// Nobody is listening for events anymore.
    ChannelClosed,
}

/// Status of the daily reset daemon.
#[derive(Debug, Clone, Default)]
pub struct DaemonStatus {
    /// Whether the loop is active.
    pub running: bool,
    /// Sweeps attempted.
    pub total_runs: u64,
    /// Sweeps that listed users and went through them.
    pub successful_runs: u64,
    /// Sweeps that could not list users.
    pub failed_runs: u64,
    /// Start of the most recent sweep.
    pub last_run: Option<DateTime<Utc>>,
    /// Day boundary the daemon is currently waiting for.
    pub next_run: Option<DateTime<Utc>>,
    /// Users reset across all sweeps.
    pub total_users_reset: u64,
}

/// Handle to control a running daemon.
#[derive(Clone)]
pub struct DaemonHandle {
    stop_flag: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    status: Arc<RwLock<DaemonStatus>>,
}

impl DaemonHandle {
    /// Ask the daemon to stop. Wakes it if it is waiting for midnight.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.stop_signal.notify_one();
    }

    /// Snapshot of the current status.
    pub async fn status(&self) -> DaemonStatus {
        self.status.read().await.clone()
    }
}

/// Background task that clears checklists at each day boundary.
pub struct DailyResetDaemon<R>
where
    R: ProgressRepository + 'static,
{
    service: Arc<ProgressService<R>>,
    config: DailyResetConfig,
    status: Arc<RwLock<DaemonStatus>>,
    stop_flag: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
}

impl<R> DailyResetDaemon<R>
where
    R: ProgressRepository + 'static,
{
    /// Daemon over `service`; nothing runs until [`Self::run`].
    pub fn new(service: Arc<ProgressService<R>>, config: DailyResetConfig) -> Self {
        Self {
            service,
            config,
            status: Arc::new(RwLock::new(DaemonStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            stop_signal: Arc::new(Notify::new()),
        }
    }

    /// Handle for stopping the daemon and reading its status.
    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            stop_flag: Arc::clone(&self.stop_flag),
            stop_signal: Arc::clone(&self.stop_signal),
            status: Arc::clone(&self.status),
        }
    }

    /// Spawn the daemon, returning a channel for its events.
    pub fn run(self) -> mpsc::Receiver<DailyResetEvent> {
        let (tx, rx) = mpsc::channel(100);
        tokio::spawn(async move {
            self.run_loop(tx).await;
        });
        rx
    }

    async fn run_loop(self, tx: mpsc::Sender<DailyResetEvent>) {
        self.status.write().await.running = true;
        let _ = tx.send(DailyResetEvent::Started).await;
        info!(
            offset = %self.service.calendar().offset(),
            "daily reset daemon started"
        );

        let mut consecutive_failures = 0u32;
        let reason = self.schedule(&tx, &mut consecutive_failures).await;

        {
            let mut status = self.status.write().await;
            status.running = false;
            status.next_run = None;
        }
        info!(?reason, "daily reset daemon stopped");
        let _ = tx.send(DailyResetEvent::Stopped { reason }).await;
    }

    async fn schedule(
        &self,
        tx: &mpsc::Sender<DailyResetEvent>,
        consecutive_failures: &mut u32,
    ) -> StopReason {
        if self.config.run_on_startup {
            if let Some(reason) = self.sweep(tx, consecutive_failures).await {
                return reason;
            }
        }

        loop {
            if self.stop_flag.load(Ordering::Acquire) {
                return StopReason::Requested;
            }

            let now = self.service.now();
            let next = self.service.calendar().next_day_start(now);
            let delay = (next - now).to_std().unwrap_or_default() + self.config.boundary_grace;
            self.status.write().await.next_run = Some(next);

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.stop_signal.notified() => return StopReason::Requested,
            }

            if let Some(reason) = self.sweep(tx, consecutive_failures).await {
                return reason;
            }
        }
    }

    /// One sweep. Returns a stop reason when the daemon should not continue.
    async fn sweep(
        &self,
        tx: &mpsc::Sender<DailyResetEvent>,
        consecutive_failures: &mut u32,
    ) -> Option<StopReason> {
        if self.stop_flag.load(Ordering::Acquire) {
            return Some(StopReason::Requested);
        }

        let run_number = {
            let mut status = self.status.write().await;
            status.total_runs += 1;
            status.total_runs
        };
        let _ = tx.send(DailyResetEvent::SweepStarted { run_number }).await;

        let start = Instant::now();
        let result = self.service.reset_all_daily().await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(report) => {
                *consecutive_failures = 0;
                {
                    let mut status = self.status.write().await;
                    status.successful_runs += 1;
                    status.last_run = Some(self.service.now());
                    status.total_users_reset += report.users_reset as u64;
                }
                let _ = tx
                    .send(DailyResetEvent::SweepCompleted {
                        run_number,
                        report,
                        duration_ms,
                    })
                    .await;
            }
            Err(err) => {
                *consecutive_failures += 1;
                self.status.write().await.failed_runs += 1;
                warn!(run_number, error = %err, consecutive_failures = *consecutive_failures, "daily reset sweep failed");
                let _ = tx
                    .send(DailyResetEvent::SweepFailed {
                        run_number,
                        error: err.to_string(),
                    })
                    .await;
            }
        }

        let limit = self.config.max_consecutive_failures;
        if limit > 0 && *consecutive_failures >= limit {
            return Some(StopReason::TooManyFailures);
        }
        if tx.is_closed() {
            return Some(StopReason::ChannelClosed);
        }
        None
    }
}
