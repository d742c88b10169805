use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::info;
use tokio_util::sync::CancellationToken;

pub type StreamId = String;

#[derive(Debug, Clone)]
struct StreamInfo {
    interval_secs: u64,
    started_at: DateTime<Utc>,
}

/// Live streams currently running in this process.
///
/// Every stream's token is a child of the registry's shutdown token, so
/// `cancel_all` also stops streams registered after it was called.
#[derive(Clone, Default)]
pub struct StreamRegistry {
    inner: Arc<DashMap<StreamId, StreamInfo>>,
    shutdown: CancellationToken,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, interval_secs: u64) -> (StreamId, CancellationToken) {
        let id = uuid::Uuid::new_v4().to_string();
        let info = StreamInfo {
            interval_secs,
            started_at: Utc::now(),
        };
        self.inner.insert(id.clone(), info);
        (id, self.shutdown.child_token())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn cancel_all(&self) {
        self.shutdown.cancel();
    }

    /// Drops a stream's entry once its task has ended.
    pub fn finish(&self, id: &str, delivered: u64) {
        if let Some((_, info)) = self.inner.remove(id) {
            let lived = Utc::now() - info.started_at;
            info!(
                "metrics stream {} ({}s interval) closed after {}s, {} events",
                id,
                info.interval_secs,
                lived.num_seconds(),
                delivered
            );
        }
    }
}
