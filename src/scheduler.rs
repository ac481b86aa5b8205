//! Loop mode for spaceship-ddns
//!
//! Repeats reconciliation passes with a fixed delay until a stop is
//! requested. Sleeping goes through [`Sleeper`] so tests can run many
//! iterations without waiting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

use crate::error::{DdnsError, Result};
use crate::metrics;
use crate::reconciler::{PassReport, Reconciler};
use crate::spaceship::is_auth_failure;

//==============================================================================
// Sleeping and Stopping
//==============================================================================

/// Waits between passes
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Requests the loop to stop; clones share the same signal
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Creates a handle and the receiver the scheduler listens on
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn stop(&self) {
        // Err only when every receiver is gone, nothing left to stop
        let _ = self.tx.send(true);
    }

    /// True once [`StopHandle::stop`] was called on any clone
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

//==============================================================================
// Pass State
//==============================================================================

/// What to do when a pass fails in loop mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// End the loop with the pass error
    Abort,
    /// Log the error and try again after the usual delay. Rejected
    /// credentials still end the loop.
    Continue,
}

/// Outcome of the most recent pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// No pass has finished yet
    Pending,
    /// Every target name was reconciled
    Succeeded,
    /// Pass failed; holds the error kind
    Failed(&'static str),
}

/// Loop progress, shared with the health endpoint
#[derive(Debug)]
pub struct PassState {
    pub outcome: PassOutcome,
    pub passes: u64,
    pub consecutive_failures: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_address: Option<String>,
}

impl Default for PassState {
    fn default() -> Self {
        Self {
            outcome: PassOutcome::Pending,
            passes: 0,
            consecutive_failures: 0,
            last_success: None,
            last_address: None,
        }
    }
}

impl PassState {
    pub fn mark_success(&mut self, report: &PassReport) {
        self.outcome = PassOutcome::Succeeded;
        self.passes = self.passes.saturating_add(1);
        self.consecutive_failures = 0;
        self.last_success = Some(Utc::now());
        self.last_address = report.address.map(|ip| ip.to_string());
    }

    pub fn mark_failure(&mut self, err: &DdnsError) {
        self.outcome = PassOutcome::Failed(err.kind());
        self.passes = self.passes.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

//==============================================================================
// Scheduler
//==============================================================================

pub struct Scheduler<S: Sleeper> {
    delay: Duration,
    policy: FailurePolicy,
    sleeper: S,
    stop: watch::Receiver<bool>,
    state: Arc<Mutex<PassState>>,
}

impl<S: Sleeper> Scheduler<S> {
    pub fn new(
        delay: Duration,
        policy: FailurePolicy,
        sleeper: S,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            delay,
            policy,
            sleeper,
            stop,
            state: Arc::new(Mutex::new(PassState::default())),
        }
    }

    /// Shared pass state, for the health endpoint
    pub fn state(&self) -> Arc<Mutex<PassState>> {
        Arc::clone(&self.state)
    }

    fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    /// Runs passes until stopped, returning the number of passes run
    ///
    /// With [`FailurePolicy::Abort`] the first failed pass ends the loop
    /// with its error.
    pub async fn run(&mut self, reconciler: &Reconciler) -> Result<u64> {
        info!(
            domain = reconciler.domain(),
            names = ?reconciler.names(),
            delay_secs = self.delay.as_secs(),
            policy = ?self.policy,
            "Starting loop mode"
        );

        let mut passes = 0u64;
        while !self.stop_requested() {
            let result = run_once(reconciler).await;
            passes += 1;

            match result {
                Ok(report) => self.state.lock().await.mark_success(&report),
                Err(e) => {
                    self.state.lock().await.mark_failure(&e);
                    if self.policy == FailurePolicy::Abort || is_auth_failure(&e) {
                        return Err(e);
                    }
                    error!(error = %e, kind = e.kind(), "Pass failed, retrying after delay");
                }
            }

            debug!(delay_secs = self.delay.as_secs(), "Sleeping");
            let mut stop = self.stop.clone();
            tokio::select! {
                _ = self.sleeper.sleep(self.delay) => {}
                stopped = stop.wait_for(|stopped| *stopped) => {
                    // Sender gone: nobody can request a stop any more
                    if stopped.is_err() {
                        self.sleeper.sleep(self.delay).await;
                    }
                }
            }
        }

        info!(passes, "Loop stopped");
        Ok(passes)
    }
}

/// Runs a single pass and records its outcome in the metrics
pub async fn run_once(reconciler: &Reconciler) -> Result<PassReport> {
    let result = match reconciler.run_pass().await {
        Ok(report) => report.into_result(),
        Err(e) => Err(e),
    };
    match &result {
        Ok(_) => metrics::record_pass("success"),
        Err(e) => metrics::record_pass(e.kind()),
    }
    result
}

//==============================================================================
// Tests
//==============================================================================
