use async_trait::async_trait;
use redis::AsyncCommands;

use crate::models::orchestration::RunSummary;
use crate::services::orchestrator::{AlertSink, SinkError};

/// Publishes critical pollution alerts on a Redis pub/sub channel.
pub struct RedisAlertPublisher {
    client: redis::Client,
    channel: String,
}

impl RedisAlertPublisher {
    pub fn new(redis_url: &str, channel: impl Into<String>) -> Result<Self, SinkError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            channel: channel.into(),
        })
    }
}

#[async_trait]
impl AlertSink for RedisAlertPublisher {
    async fn notify(&self, summary: &RunSummary) -> Result<(), SinkError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(summary)?;
        let receivers: i64 = conn.publish(&self.channel, payload).await?;
        tracing::debug!(
            report_id = %summary.report_id,
            channel = %self.channel,
            receivers,
            "Published critical alert"
        );
        Ok(())
    }
}
