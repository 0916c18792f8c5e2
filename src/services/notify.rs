use anyhow::bail;
use async_trait::async_trait;

use crate::state::AppState;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        payload: &serde_json::Value,
    ) -> anyhow::Result<()>;
}

/// Posts event envelopes to every configured webhook endpoint.
pub struct WebhookNotifier {
    endpoints: Vec<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        payload: &serde_json::Value,
    ) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "event": event_type,
            "entity_type": entity_type,
            "entity_id": entity_id,
            "payload": payload,
        });

        let mut failed = 0;
        for endpoint in &self.endpoints {
            let delivery = self
                .client
                .post(endpoint)
                .json(&body)
                .send()
                .await
                .and_then(|response| response.error_for_status());
            if let Err(e) = delivery {
                tracing::warn!(error = %e, endpoint = %endpoint, "webhook delivery failed");
                failed += 1;
            }
        }

        if failed > 0 {
            bail!("{failed} of {} webhook deliveries failed", self.endpoints.len());
        }
        Ok(())
    }
}

/// Fire-and-forget delivery. Failures are logged and never surfaced;
/// callers invoke this only after their database work has committed.
pub async fn emit(
    state: &AppState,
    event_type: &str,
    entity_type: &str,
    entity_id: &str,
    payload: serde_json::Value,
) {
    if let Err(e) = state
        .notifier
        .notify(event_type, entity_type, entity_id, &payload)
        .await
    {
        tracing::error!(error = %e, event = event_type, "failed to deliver notification");
    }
}
