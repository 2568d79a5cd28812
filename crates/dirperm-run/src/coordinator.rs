//! Background scan coordination.
//!
//! A [`ScanCoordinator`] runs the collector and then the formatter on a
//! blocking worker. Cancellation is cooperative: the token handed out by
//! [`ScanCoordinator::cancel_token`] can be triggered from any thread, before
//! or during [`ScanCoordinator::run`].

use std::sync::{Arc, Mutex, PoisonError};

use strum::Display;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dirperm_core::{ScanError, ScanOptions, ScanResult};
use dirperm_report::{FormatConfig, ReportFormatter};
use dirperm_scan::{AclReader, EntryCollector, PosixAclReader, ScanProgress};

/// Lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ScanState {
    /// Constructed and validated, not started.
    Idle,
    /// Collector or formatter is running.
    Running,
    /// Report and log are available.
    Completed,
    /// Cancellation was observed; nothing was produced.
    Cancelled,
    /// A fatal error ended the scan.
    Failed,
}

impl ScanState {
    /// Whether the scan has reached a final state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Result of a scan that did not fail.
#[derive(Debug)]
pub enum ScanOutcome {
    Completed(ScanResult),
    Cancelled,
}

impl ScanOutcome {
    /// The scan result, if the scan completed.
    pub fn into_result(self) -> Option<ScanResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Runs one permission scan on a background worker.
pub struct ScanCoordinator<R = PosixAclReader> {
    collector: Arc<EntryCollector<R>>,
    formatter: ReportFormatter,
    cancel: CancellationToken,
    state: Mutex<ScanState>,
}

impl ScanCoordinator {
    /// Create a coordinator that reads POSIX permissions.
    ///
    /// Roots and the depth policy are validated here, before any work starts.
    pub fn new(options: &ScanOptions) -> Result<Self, ScanError> {
        Self::with_reader(options, PosixAclReader::new())
    }
}

impl<R: AclReader + 'static> ScanCoordinator<R> {
    /// Create a coordinator with a custom permission source.
    pub fn with_reader(options: &ScanOptions, reader: R) -> Result<Self, ScanError> {
        let options = options.clone().sanitized();
        let collector = EntryCollector::with_reader(&options, reader)?;
        let formatter = ReportFormatter::with_config(FormatConfig::from(&options));

        Ok(Self {
            collector: Arc::new(collector),
            formatter,
            cancel: CancellationToken::new(),
            state: Mutex::new(ScanState::Idle),
        })
    }

    /// Token that cancels this scan when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScanState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to collection progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.collector.subscribe()
    }

    /// Run the scan to completion or cancellation.
    ///
    /// A coordinator runs once; calling `run` again fails with
    /// [`ScanError::InvalidConfiguration`].
    ///
    /// Dropping the returned future before it resolves cancels the worker and
    /// leaves the coordinator in [`ScanState::Cancelled`].
    pub async fn run(&self) -> Result<ScanOutcome, ScanError> {
        self.start()?;
        let _guard = RunningGuard {
            state: &self.state,
            cancel: &self.cancel,
        };
        info!(
            roots = self.collector.roots().len(),
            path_mode = %self.formatter.config().path_mode,
            "scan started"
        );

        let collector = Arc::clone(&self.collector);
        let formatter = self.formatter.clone();
        let cancel = self.cancel.clone();

        let result = tokio::task::spawn_blocking(move || scan(&collector, &formatter, &cancel))
            .await
            .unwrap_or_else(|e| {
                Err(ScanError::Other {
                    message: e.to_string(),
                })
            });

        match result {
            Ok(result) => {
                self.set_state(ScanState::Completed);
                info!(
                    bytes = result.report.len(),
                    failures = result.log.len(),
                    "scan completed"
                );
                Ok(ScanOutcome::Completed(result))
            }
            Err(ScanError::Cancelled) => {
                self.set_state(ScanState::Cancelled);
                info!("scan cancelled");
                Ok(ScanOutcome::Cancelled)
            }
            Err(error) => {
                self.set_state(ScanState::Failed);
                warn!(%error, "scan failed");
                Err(error)
            }
        }
    }

    fn start(&self) -> Result<(), ScanError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != ScanState::Idle {
            return Err(ScanError::invalid_configuration(format!(
                "A scan cannot be started from the {} state.",
                *state
            )));
        }
        *state = ScanState::Running;
        Ok(())
    }

    fn set_state(&self, next: ScanState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Settles a run that is abandoned while still running.
struct RunningGuard<'a> {
    state: &'a Mutex<ScanState>,
    cancel: &'a CancellationToken,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == ScanState::Running {
            self.cancel.cancel();
            *state = ScanState::Cancelled;
            info!("scan abandoned");
        }
    }
}

fn scan<R: AclReader>(
    collector: &EntryCollector<R>,
    formatter: &ReportFormatter,
    cancel: &CancellationToken,
) -> Result<ScanResult, ScanError> {
    let collection = collector.collect(cancel)?;
    let report = formatter.format(&collection.records, collection.max_depth(), cancel)?;
    Ok(ScanResult::new(report, collection.warnings))
}
