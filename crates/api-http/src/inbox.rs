// Latest snippet pushed by the generator agent

use std::sync::{Arc, Mutex, PoisonError};
use tfdeploy_core::error::{AppError, Result};
use tfdeploy_core::port::TimeProvider;

struct Snippet {
    code: String,
    ts: i64,
}

/// Holds the most recent snippet. Timestamps are epoch millis and strictly increase
/// across pushes, so pollers can use `ts` as a change marker.
pub struct AgentInbox {
    latest: Mutex<Option<Snippet>>,
    time_provider: Arc<dyn TimeProvider>,
}

fn poisoned<T>(_: PoisonError<T>) -> AppError {
    AppError::Internal("agent inbox lock poisoned".to_string())
}

impl AgentInbox {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            latest: Mutex::new(None),
            time_provider,
        }
    }

    /// Replace the latest snippet, returning its timestamp
    pub fn store(&self, code: String) -> Result<i64> {
        let mut latest = self.latest.lock().map_err(poisoned)?;
        let now = self.time_provider.now_millis();
        let ts = match latest.as_ref() {
            Some(prev) if prev.ts >= now => prev.ts + 1,
            _ => now,
        };
        *latest = Some(Snippet { code, ts });
        Ok(ts)
    }

    /// `(code, ts)` of the latest snippet, if any
    pub fn latest(&self) -> Result<Option<(String, i64)>> {
        let latest = self.latest.lock().map_err(poisoned)?;
        Ok(latest.as_ref().map(|s| (s.code.clone(), s.ts)))
    }
}
