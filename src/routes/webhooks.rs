use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, ErrorBody},
    app_state::AppState,
    routes::id_string,
};

pub const ORDER_PAID_EVENT: &str = "order.paid";

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(sellapp_webhook))
}

/// Envelope SellApp posts. Only `event` is required to decide what to do; the rest is
/// read field by field so an odd shape elsewhere never blocks the acknowledgement.
#[derive(Debug, ToSchema)]
pub struct SellappEvent {
    pub event: String,
    /// `{id, followiz_order_id?, product_variants: [{quantity, additional_information: [{label, value}]}]}`
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct WebhookRes {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sellapp_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followiz_order_id: Option<String>,
}

/// Read-only view over the `data` object of a paid-order event.
#[derive(Debug, Clone, Copy)]
pub struct PaidOrder<'a>(&'a Value);

impl<'a> PaidOrder<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self(data)
    }

    pub fn id(&self) -> Option<String> {
        self.0.get("id").and_then(id_string)
    }

    /// Followiz order placed by hand; skips automatic creation when present.
    pub fn followiz_order_id(&self) -> Option<String> {
        self.0.get("followiz_order_id").and_then(id_string)
    }

    fn first_variant(&self) -> Option<&'a Value> {
        self.0.get("product_variants")?.as_array()?.first()
    }

    /// The link Followiz should deliver to: the first non-empty custom field of the
    /// first variant.
    pub fn target_link(&self) -> Option<String> {
        self.first_variant()?
            .get("additional_information")?
            .as_array()?
            .iter()
            .find_map(|info| info.get("value").and_then(id_string))
    }

    /// Quantity of the first variant, defaulting to one. Numeric strings are accepted.
    pub fn quantity(&self) -> u32 {
        let quantity = self.first_variant().and_then(|variant| variant.get("quantity"));
        let parsed = match quantity {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed
            .and_then(|quantity| u32::try_from(quantity).ok())
            .filter(|quantity| *quantity > 0)
            .unwrap_or(1)
    }
}

/// Receives SellApp order events and links paid orders to Followiz orders.
///
/// Events other than `order.paid` are acknowledged with 200 so SellApp does not
/// redeliver them. Failures use the same status codes as the rest of the API, so a
/// failed Followiz call leaves nothing stored and SellApp may retry.
#[utoipa::path(
    post,
    path = "/sellapp-webhook",
    tags = ["Webhooks"],
    request_body = SellappEvent,
    responses(
        (status = 200, description = "Event handled or ignored", body = WebhookRes),
        (status = 400, description = "Malformed payload", body = ErrorBody),
        (status = 502, description = "Followiz order could not be created", body = ErrorBody)
    )
)]
pub async fn sellapp_webhook(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<WebhookRes>, AppError> {
    let Json(envelope) = payload?;

    let event = envelope.get("event").and_then(Value::as_str).unwrap_or_default();
    if event != ORDER_PAID_EVENT {
        info!("Ignoring SellApp event {:?}", event);
        return Ok(Json(WebhookRes {
            ok: true,
            ignored: Some(true),
            sellapp_order_id: None,
            followiz_order_id: None,
        }));
    }

    let order = PaidOrder::new(envelope.get("data").unwrap_or(&Value::Null));
    let sellapp_id = order
        .id()
        .ok_or_else(|| AppError::Validation("data.id required".into()))?;

    let followiz_id = match order.followiz_order_id() {
        Some(followiz_id) => followiz_id,
        None => {
            let provider = &state.config.provider;
            let service_id = provider
                .service_id
                .as_deref()
                .filter(|_| provider.auto_create_enabled());
            let Some(service_id) = service_id else {
                warn!(
                    "SellApp order #{} paid but FOLLOWIZ_API_KEY/FOLLOWIZ_SERVICE_ID are not set; nothing created",
                    sellapp_id
                );
                return Ok(Json(WebhookRes {
                    ok: true,
                    ignored: None,
                    sellapp_order_id: Some(sellapp_id),
                    followiz_order_id: None,
                }));
            };

            let link = order
                .target_link()
                .unwrap_or_else(|| provider.fallback_link.clone());
            state
                .followiz
                .create_order(service_id, &link, order.quantity())
                .await?
        }
    };

    // The Followiz order may already exist here; a redelivery would place another one.
    state
        .store
        .insert(&sellapp_id, &followiz_id)
        .await
        .inspect_err(|err| {
            error!(
                "Failed to store mapping SellApp #{} -> Followiz #{}: {}",
                sellapp_id, followiz_id, err
            )
        })?;
    info!(
        "Stored mapping SellApp #{} -> Followiz #{}",
        sellapp_id, followiz_id
    );

    Ok(Json(WebhookRes {
        ok: true,
        ignored: None,
        sellapp_order_id: Some(sellapp_id),
        followiz_order_id: Some(followiz_id),
    }))
}
