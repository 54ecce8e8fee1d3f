use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ProviderConfig;

pub const DEFAULT_FOLLOWIZ_API_URL: &str = "https://followiz.com/api/v2";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("FOLLOWIZ_API_KEY not set")]
    MissingApiKey,

    #[error("failed to contact Followiz: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("Followiz returned an unreadable reply: {0}")]
    BadResponse(String),

    #[error("Followiz rejected the request: {0}")]
    Rejected(String),
}

/// Delivery progress as reported by Followiz. Values are relayed as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderOrderStatus {
    pub status: Value,
    pub start_count: Value,
    pub remains: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusLookup {
    Found(ProviderOrderStatus),
    /// Followiz accepted the request but has no record of the order.
    Unknown,
}

/// Form-encoded client for the Followiz v2 API. Each call is a single attempt bounded
/// by the configured timeout.
#[derive(Clone, Debug)]
pub struct FollowizClient {
    http: Client,
    api_url: String,
    api_key: Option<String>,
}

impl FollowizClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Unreachable)?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Places a Followiz order and returns its id.
    pub async fn create_order(
        &self,
        service_id: &str,
        target_link: &str,
        quantity: u32,
    ) -> Result<String, ProviderError> {
        let key = self.api_key()?;
        let quantity = quantity.to_string();

        let reply = self
            .post(&[
                ("key", key),
                ("action", "add"),
                ("service", service_id),
                ("link", target_link),
                ("quantity", quantity.as_str()),
            ])
            .await?;

        let order_id = parse_created_order(reply)?;
        info!("Followiz order #{} created for {}", order_id, target_link);
        Ok(order_id)
    }

    /// Fetches delivery progress for one Followiz order.
    pub async fn get_status(&self, followiz_order_id: &str) -> Result<StatusLookup, ProviderError> {
        let key = self.api_key()?;

        let reply = self
            .post(&[("key", key), ("action", "status"), ("orders", followiz_order_id)])
            .await?;

        parse_status(reply, followiz_order_id)
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)
    }

    async fn post(&self, form: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let action = form
            .iter()
            .find(|(name, _)| *name == "action")
            .map(|(_, value)| *value)
            .unwrap_or_default();
        debug!("POST {} action={}", self.api_url, action);

        let body = self
            .http
            .post(&self.api_url)
            .form(form)
            .send()
            .await
            .map_err(ProviderError::Unreachable)?
            .text()
            .await
            .map_err(ProviderError::Unreachable)?;

        serde_json::from_str(&body).map_err(|e| ProviderError::BadResponse(e.to_string()))
    }
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads the order id out of an `action=add` reply.
fn parse_created_order(reply: Value) -> Result<String, ProviderError> {
    if let Some(order_id) = reply.get("order").and_then(id_to_string) {
        return Ok(order_id);
    }

    let reason = reply
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("reply has no order id");
    Err(ProviderError::Rejected(reason.to_string()))
}

/// Picks the entry for `followiz_order_id` out of an `action=status` reply, which is
/// keyed by order id.
fn parse_status(reply: Value, followiz_order_id: &str) -> Result<StatusLookup, ProviderError> {
    let Value::Object(mut entries) = reply else {
        return Err(ProviderError::BadResponse(
            "status reply is not an object".to_string(),
        ));
    };

    let mut entry = match entries.remove(followiz_order_id) {
        Some(Value::Object(entry)) => entry,
        _ => return Ok(StatusLookup::Unknown),
    };

    if is_error_entry(&entry) {
        debug!("Followiz has no record of order #{}", followiz_order_id);
        return Ok(StatusLookup::Unknown);
    }

    let mut take = |field: &str| entry.remove(field).unwrap_or(Value::Null);
    Ok(StatusLookup::Found(ProviderOrderStatus {
        status: take("status"),
        start_count: take("start_count"),
        remains: take("remains"),
    }))
}

fn is_error_entry(entry: &Map<String, Value>) -> bool {
    entry.contains_key("error") && !entry.contains_key("status")
}
