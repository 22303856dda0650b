use crate::model::Reading;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::watch;

/// Message shown while the most recent fetch attempt has failed.
pub const LOAD_ERROR_MESSAGE: &str = "Falha ao carregar dados";

/// Everything the dashboard displays, replaced as a whole on every poll.
///
/// Derived values (latest, average, chart, history) are never stored here;
/// they are projected from the snapshot each time it is rendered.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub readings: Arc<[Reading]>,
    pub loading: bool,
    pub error: Option<&'static str>,
    pub updated_at: Option<DateTime<Local>>,
}

impl Snapshot {
    /// State before the first fetch completes.
    pub fn initial() -> Self {
        Self {
            readings: Arc::from(Vec::new()),
            loading: true,
            error: None,
            updated_at: None,
        }
    }

    /// Readings replace the previous set wholesale and the error is cleared.
    pub fn succeeded(readings: Vec<Reading>, at: DateTime<Local>) -> Self {
        Self {
            readings: Arc::from(readings),
            loading: false,
            error: None,
            updated_at: Some(at),
        }
    }

    /// Keeps the last good readings on screen and raises the error flag.
    pub fn failed(&self) -> Self {
        Self {
            readings: Arc::clone(&self.readings),
            loading: false,
            error: Some(LOAD_ERROR_MESSAGE),
            updated_at: self.updated_at,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// Creates the channel the poller publishes snapshots on.
pub fn channel() -> (watch::Sender<Snapshot>, watch::Receiver<Snapshot>) {
    watch::channel(Snapshot::initial())
}
