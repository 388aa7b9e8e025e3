//! Backend health and divergence tracking.
//!
//! # Example
//!
//! ```
//! use plates_persistence::composite::{DivergenceRecord, SyncMonitor, SyncOperation};
//!
//! let monitor = SyncMonitor::default();
//! monitor.record_failure("elasticsearch", "connection refused");
//! assert!(monitor.is_healthy("elasticsearch"));
//!
//! monitor.record_divergence(DivergenceRecord::new(
//!     "plate",
//!     7,
//!     SyncOperation::Index,
//!     "connection refused",
//! ));
//! assert_eq!(monitor.divergence_count(), 1);
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{PrimaryStore, SearchIndex};

use super::sync::{DivergenceLog, DivergenceRecord};

/// Monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Consecutive failures before a backend is marked unhealthy.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Maximum number of divergence records kept.
    #[serde(default = "default_max_divergence")]
    pub max_divergence: usize,
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_max_divergence() -> usize {
    1000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            max_divergence: default_max_divergence(),
        }
    }
}

/// Health of a single backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendHealth {
    /// Backend name.
    pub backend: String,
    /// Whether the backend is considered usable.
    pub healthy: bool,
    /// Last successful operation.
    pub last_success: Option<DateTime<Utc>>,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Last error message.
    pub last_error: Option<String>,
}

impl BackendHealth {
    fn new(backend: &str) -> Self {
        Self {
            backend: backend.to_string(),
            healthy: true,
            last_success: None,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    fn record_success(&mut self) {
        if !self.healthy {
            info!(backend = %self.backend, "Backend recovered");
        }
        self.healthy = true;
        self.last_success = Some(Utc::now());
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    fn record_failure(&mut self, error: String, threshold: u32) {
        self.consecutive_failures += 1;
        self.last_error = Some(error);
        if self.consecutive_failures >= threshold {
            if self.healthy {
                warn!(
                    backend = %self.backend,
                    failures = self.consecutive_failures,
                    "Backend marked unhealthy"
                );
            }
            self.healthy = false;
        }
    }
}

/// Overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// Every backend is healthy and nothing is diverged.
    Up,
    /// The primary store works but the index is unhealthy or diverged.
    Degraded,
    /// The primary store is unavailable.
    Down,
}

/// Snapshot returned by [`SyncMonitor::check`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Primary store health.
    pub primary: BackendHealth,
    /// Search index health.
    pub index: BackendHealth,
    /// Number of documents known to differ between the stores.
    pub divergence_count: usize,
    /// Divergence records evicted from the bounded log.
    pub divergence_dropped: u64,
    /// Snapshot time.
    pub checked_at: DateTime<Utc>,
}

/// Tracks backend health and dual-write divergence.
///
/// Shared by every entity service and the management endpoints.
#[derive(Debug)]
pub struct SyncMonitor {
    config: MonitorConfig,
    health: RwLock<HashMap<String, BackendHealth>>,
    divergence: Mutex<DivergenceLog>,
}

impl Default for SyncMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl SyncMonitor {
    /// Creates a monitor.
    pub fn new(config: MonitorConfig) -> Self {
        let divergence = Mutex::new(DivergenceLog::new(config.max_divergence));
        Self {
            config,
            health: RwLock::new(HashMap::new()),
            divergence,
        }
    }

    /// Records a successful operation against a backend.
    pub fn record_success(&self, backend: &str) {
        self.health
            .write()
            .entry(backend.to_string())
            .or_insert_with(|| BackendHealth::new(backend))
            .record_success();
    }

    /// Records a failed operation against a backend.
    pub fn record_failure(&self, backend: &str, error: impl Into<String>) {
        self.health
            .write()
            .entry(backend.to_string())
            .or_insert_with(|| BackendHealth::new(backend))
            .record_failure(error.into(), self.config.failure_threshold);
    }

    /// Returns the health of a backend. Unknown backends are healthy.
    pub fn backend_health(&self, backend: &str) -> BackendHealth {
        self.health
            .read()
            .get(backend)
            .cloned()
            .unwrap_or_else(|| BackendHealth::new(backend))
    }

    /// Returns true unless the backend has failed too many times in a row.
    pub fn is_healthy(&self, backend: &str) -> bool {
        self.backend_health(backend).healthy
    }

    /// Records a failed index write.
    pub fn record_divergence(&self, record: DivergenceRecord) {
        self.divergence.lock().push(record);
    }

    /// Drops the record for a document that has since been written
    /// successfully.
    pub fn resolve_divergence(&self, entity: &str, id: i64) {
        self.divergence.lock().resolve(entity, id);
    }

    /// Drops every record of an entity type. Returns how many were removed.
    pub fn clear_divergence(&self, entity: &str) -> usize {
        self.divergence.lock().clear_entity(entity)
    }

    /// Returns the recorded divergence, oldest first.
    pub fn divergence(&self) -> Vec<DivergenceRecord> {
        self.divergence.lock().records()
    }

    /// Returns the number of recorded divergences.
    pub fn divergence_count(&self) -> usize {
        self.divergence.lock().len()
    }

    /// Probes both backends and returns a report.
    pub async fn check(&self, primary: &dyn PrimaryStore, index: &dyn SearchIndex) -> HealthReport {
        let primary_name = primary.backend_name();
        let index_name = index.backend_name();

        // A failed probe takes the backend down at once, independent of the
        // failure threshold used for regular traffic.
        let primary_health = match primary.health_check().await {
            Ok(()) => {
                self.record_success(primary_name);
                self.backend_health(primary_name)
            }
            Err(e) => {
                self.record_failure(primary_name, e.to_string());
                BackendHealth {
                    healthy: false,
                    ..self.backend_health(primary_name)
                }
            }
        };
        let index_health = match index.health_check().await {
            Ok(()) => {
                self.record_success(index_name);
                self.backend_health(index_name)
            }
            Err(e) => {
                self.record_failure(index_name, e.to_string());
                BackendHealth {
                    healthy: false,
                    ..self.backend_health(index_name)
                }
            }
        };

        let (divergence_count, divergence_dropped) = {
            let log = self.divergence.lock();
            (log.len(), log.dropped())
        };
        let status = if !primary_health.healthy {
            HealthStatus::Down
        } else if !index_health.healthy || divergence_count > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Up
        };

        HealthReport {
            status,
            primary: primary_health,
            index: index_health,
            divergence_count,
            divergence_dropped,
            checked_at: Utc::now(),
        }
    }
}
