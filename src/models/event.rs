use serde::{ Serialize, Deserialize };
use serde_json::Value;

pub const SUBSCRIPTION_VALIDATION: &str = "SubscriptionValidation";
pub const NOTIFICATION: &str = "Notification";
pub const ADVANCED_MESSAGE_RECEIVED: &str = "Microsoft.Communication.AdvancedMessageReceived";

/// One record of an Event Grid delivery batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventGridEvent {
    #[serde(default, alias = "Id")]
    pub id: Option<String>,
    #[serde(default, alias = "Topic")]
    pub topic: Option<String>,
    #[serde(default, alias = "Subject")]
    pub subject: Option<String>,
    #[serde(alias = "EventType")]
    pub event_type: String,
    #[serde(default, alias = "EventTime")]
    pub event_time: Option<String>,
    #[serde(default, alias = "Data")]
    pub data: Value,
    #[serde(default, alias = "DataVersion")]
    pub data_version: Option<String>,
}

impl EventGridEvent {
    pub fn is_message_received(&self) -> bool {
        self.event_type.eq_ignore_ascii_case(ADVANCED_MESSAGE_RECEIVED)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionValidationEventData {
    #[serde(alias = "ValidationCode")]
    pub validation_code: String,
    #[serde(default, alias = "ValidationUrl")]
    pub validation_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionValidationResponse {
    pub validation_response: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedMessageReceivedEventData {
    #[serde(alias = "From")]
    pub from: String,
    #[serde(default, alias = "Content")]
    pub content: Option<String>,
    #[serde(default, alias = "To")]
    pub to: Option<String>,
    #[serde(default, alias = "ChannelType")]
    pub channel_type: Option<String>,
    #[serde(default, alias = "ReceivedTimestamp")]
    pub received_timestamp: Option<String>,
}
