use crate::agent::ConciergeAgent;
use crate::models::event::{
    AdvancedMessageReceivedEventData,
    EventGridEvent,
    SubscriptionValidationEventData,
    NOTIFICATION,
    SUBSCRIPTION_VALIDATION,
};

use futures::FutureExt;
use log::{ info, warn, error, debug };
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResponse {
    /// Echo of the subscription validation code.
    Validation(String),
    /// Notification batch handled.
    Accepted {
        processed: usize,
    },
    /// No recognized `aeg-event-type` header.
    Rejected,
}

/// Classifies Event Grid deliveries and drives the reply pipeline for each inbound message.
#[derive(Clone)]
pub struct WebhookDispatcher {
    agent: Arc<ConciergeAgent>,
}

fn parse_events(body: &[u8]) -> Result<Vec<EventGridEvent>, WebhookError> {
    serde_json::from_slice(body).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl WebhookDispatcher {
    pub fn new(agent: Arc<ConciergeAgent>) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &Arc<ConciergeAgent> {
        &self.agent
    }

    pub async fn dispatch(
        &self,
        body: &[u8],
        event_type: Option<&str>
    ) -> Result<WebhookResponse, WebhookError> {
        match event_type {
            Some(SUBSCRIPTION_VALIDATION) => self.handle_validation(body),
            Some(NOTIFICATION) => self.handle_notifications(body).await,
            other => {
                warn!("Rejecting webhook call with event type header {:?}", other);
                Ok(WebhookResponse::Rejected)
            }
        }
    }

    fn handle_validation(&self, body: &[u8]) -> Result<WebhookResponse, WebhookError> {
        let events = parse_events(body)?;
        let first = events
            .into_iter()
            .next()
            .ok_or_else(|| WebhookError::MalformedPayload("empty event array".into()))?;
        let data: SubscriptionValidationEventData = serde_json
            ::from_value(first.data)
            .map_err(|e| WebhookError::MalformedPayload(format!("validation data: {}", e)))?;

        info!("Answering subscription validation handshake");
        Ok(WebhookResponse::Validation(data.validation_code))
    }

    async fn handle_notifications(&self, body: &[u8]) -> Result<WebhookResponse, WebhookError> {
        let events = parse_events(body)?;
        info!("Received {} event(s)", events.len());

        let mut processed = 0;
        for event in events {
            if !event.is_message_received() {
                debug!("Ignoring event of type {}", event.event_type);
                continue;
            }

            let data: AdvancedMessageReceivedEventData = match serde_json::from_value(event.data) {
                Ok(d) => d,
                Err(e) => {
                    warn!("Skipping undecodable message event {:?}: {}", event.id, e);
                    self.agent.store().log(format!("Error: Could not read inbound message: {}", e)).await;
                    continue;
                }
            };

            let content = data.content.unwrap_or_default();
            let run = AssertUnwindSafe(self.agent.handle_inbound(&data.from, &content)).catch_unwind();
            if let Err(panic) = run.await {
                let message = panic_message(panic.as_ref());
                error!("Reply pipeline for {} panicked: {}", data.from, message);
                self.agent
                    .store()
                    .log(format!("Error: Failed to respond to \"{}\". Exception: {}", data.from, message))
                    .await;
            }
            processed += 1;
        }

        Ok(WebhookResponse::Accepted { processed })
    }
}
