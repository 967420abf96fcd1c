//! Background maintenance: expired sessions and abandoned carts.
//!
//! ```text
//! every purge_interval:
//!   purge_expired()                      sessions idle past the TTL
//!   if abandoned_retention is set:
//!     purge_abandoned(is_live_in, now - retention)
//! ```
//!
//! Liveness is judged inside the purge transaction, so a session rotated
//! while the pass runs keeps its cart. Without a retention period cart rows
//! are kept.

use crate::error::RuntimeResult;
use sf_01_session_identity::SessionApi;
use sf_03_cart_store::CartStore;
use shared_types::{KeyValueRead, SessionId, TimeSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Outcome of one maintenance pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub expired_sessions: usize,
    pub purged_lines: usize,
}

pub struct Maintenance {
    sessions: Arc<dyn SessionApi>,
    carts: Arc<dyn CartStore>,
    clock: Arc<dyn TimeSource>,
    retention: Option<Duration>,
}

impl Maintenance {
    pub fn new(
        sessions: Arc<dyn SessionApi>,
        carts: Arc<dyn CartStore>,
        clock: Arc<dyn TimeSource>,
        retention: Option<Duration>,
    ) -> Self {
        Self {
            sessions,
            carts,
            clock,
            retention,
        }
    }

    /// One synchronous pass.
    pub fn run_once(&self) -> RuntimeResult<MaintenanceReport> {
        let expired_sessions = self.sessions.purge_expired()?;

        let purged_lines = match self.retention {
            Some(retention) => {
                let retention_ms = u64::try_from(retention.as_millis()).unwrap_or(u64::MAX);
                let cutoff = self.clock.now().saturating_sub(retention_ms);
                let sessions = &self.sessions;
                self.carts.purge_abandoned(
                    &|view: &dyn KeyValueRead, session: &SessionId| {
                        sessions.is_live_in(view, session)
                    },
                    cutoff,
                )?
            }
            None => 0,
        };

        Ok(MaintenanceReport {
            expired_sessions,
            purged_lines,
        })
    }

    /// Run a pass every `interval` until `shutdown` flips to `true`.
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    tracing::info!("[maintenance] Shutdown signal received");
                    return;
                }
            }

            let this = Arc::clone(&self);
            match tokio::task::spawn_blocking(move || this.run_once()).await {
                Ok(Ok(report)) if report != MaintenanceReport::default() => {
                    tracing::info!(
                        expired_sessions = report.expired_sessions,
                        purged_lines = report.purged_lines,
                        "[maintenance] pass complete"
                    );
                }
                Ok(Ok(_)) => tracing::debug!("[maintenance] nothing to purge"),
                Ok(Err(e)) => tracing::warn!(error = %e, "[maintenance] pass failed"),
                Err(e) => tracing::error!(error = %e, "[maintenance] pass panicked"),
            }
        }
    }
}
