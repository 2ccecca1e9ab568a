//! Best-effort activity logging into the activity index.
//!
//! Records are fire-and-forget: writes happen on a spawned task and a
//! failed or absent sink never affects the pipeline outcome.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::search::ElasticClient;

pub struct ActivityLogger {
    source: String,
    sink: Option<(Arc<ElasticClient>, String)>,
}

impl ActivityLogger {
    /// Logger writing to the given activity index
    pub fn new(source: impl Into<String>, client: Arc<ElasticClient>, index: String) -> Self {
        Self {
            source: source.into(),
            sink: Some((client, index)),
        }
    }

    /// Logger with no sink, for tests and tools running without the index
    pub fn disabled(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sink: None,
        }
    }

    /// Record an event. Must be called from within a tokio runtime when a
    /// sink is configured.
    pub fn record(&self, level: &str, message: &str) {
        tracing::debug!(source = %self.source, level, "{message}");

        let Some((client, index)) = &self.sink else {
            return;
        };

        let document = json!({
            "interaction": message,
            "level": level,
            "source": self.source,
            "timestamp": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });

        let client = Arc::clone(client);
        let index = index.clone();
        tokio::spawn(async move {
            if let Err(e) = client.index_document(&index, &document).await {
                warn!("Activity log write failed: {e}");
            }
        });
    }
}
