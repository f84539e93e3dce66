use crate::constants::MAX_APP_LOG_ENTRIES;
use crate::core::errors::LedgerError;
use crate::core::models::AppLog;
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Process-local action log holding the most recent entries. Once full, the
/// oldest entry is evicted for each new one.
#[derive(Clone)]
pub struct InMemoryLogging {
    entries: Arc<RwLock<VecDeque<AppLog>>>,
    capacity: usize,
}

impl Default for InMemoryLogging {
    fn default() -> Self {
        Self::with_capacity(MAX_APP_LOG_ENTRIES)
    }
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        InMemoryLogging {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
        }
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(&self, action: &str, details: Value, user_id: Option<&str>) -> Result<(), LedgerError> {
        let Some(fields) = details.as_object() else {
            return Err(LedgerError::LoggingError(format!(
                "{} carries non-object details: {}",
                action, details
            )));
        };
        let trip_id = fields.get("trip_id").and_then(Value::as_str).unwrap_or("-");
        info!(action, trip_id, user_id = user_id.unwrap_or("system"), "recorded action");

        let entry = AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id: user_id.map(String::from),
            details,
            timestamp: chrono::Utc::now(),
        };
        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        Ok(self.entries.read().await.iter().cloned().collect())
    }
}
