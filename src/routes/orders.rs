use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    api::followiz::StatusLookup,
    app_error::{AppError, ErrorBody},
    app_state::AppState,
    routes::id_string,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(add_order))
        .routes(utoipa_axum::routes!(order_status))
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AddOrderReq {
    #[schema(value_type = Option<String>)]
    pub sellapp_order_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub followiz_order_id: Option<Value>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct AckRes {
    pub ok: bool,
}

/// Manually records which Followiz order fulfils a SellApp order.
#[utoipa::path(
    post,
    path = "/add-order",
    tags = ["Orders"],
    request_body = AddOrderReq,
    responses(
        (status = 200, description = "Mapping stored", body = AckRes),
        (status = 400, description = "Either id is missing", body = ErrorBody)
    )
)]
pub async fn add_order(
    State(state): State<AppState>,
    payload: Result<Json<AddOrderReq>, JsonRejection>,
) -> Result<Json<AckRes>, AppError> {
    let ids = payload.ok().and_then(|Json(req)| {
        let sellapp_id = req.sellapp_order_id.as_ref().and_then(id_string)?;
        let followiz_id = req.followiz_order_id.as_ref().and_then(id_string)?;
        Some((sellapp_id, followiz_id))
    });
    let Some((sellapp_id, followiz_id)) = ids else {
        return Err(AppError::Validation(
            "sellapp_order_id and followiz_order_id required".into(),
        ));
    };

    state.store.insert(&sellapp_id, &followiz_id).await?;
    info!(
        "Stored mapping SellApp #{} -> Followiz #{}",
        sellapp_id, followiz_id
    );

    Ok(Json(AckRes { ok: true }))
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderStatusQuery {
    /// SellApp order id, or a Followiz order id as a fallback.
    pub order: Option<String>,
}

#[derive(Serialize, Debug, PartialEq, ToSchema)]
pub struct OrderStatusRes {
    #[schema(value_type = Option<String>)]
    pub status: Value,
    #[schema(value_type = Option<String>)]
    pub start_count: Value,
    #[schema(value_type = Option<String>)]
    pub remains: Value,
}

impl From<StatusLookup> for OrderStatusRes {
    fn from(lookup: StatusLookup) -> Self {
        match lookup {
            StatusLookup::Found(status) => Self {
                status: status.status,
                start_count: status.start_count,
                remains: status.remains,
            },
            StatusLookup::Unknown => Self {
                status: Value::Null,
                start_count: Value::Null,
                remains: Value::Null,
            },
        }
    }
}

/// Reports delivery progress for a SellApp order without exposing the Followiz key.
#[utoipa::path(
    get,
    path = "/order-status",
    tags = ["Orders"],
    params(OrderStatusQuery),
    responses(
        (status = 200, description = "Current delivery progress; fields are null when Followiz has no record", body = OrderStatusRes),
        (status = 400, description = "Missing order parameter", body = ErrorBody),
        (status = 404, description = "No stored mapping", body = ErrorBody),
        (status = 500, description = "Followiz key not configured", body = ErrorBody),
        (status = 502, description = "Followiz unreachable or replied with garbage", body = ErrorBody)
    )
)]
pub async fn order_status(
    State(state): State<AppState>,
    query: Result<Query<OrderStatusQuery>, QueryRejection>,
) -> Result<Json<OrderStatusRes>, AppError> {
    let Query(query) = query?;
    let order_id = query
        .order
        .map(|order| order.trim().to_string())
        .filter(|order| !order.is_empty())
        .ok_or_else(|| AppError::Validation("order query param required".into()))?;

    let mapping = state
        .store
        .find_by_either_id(&order_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let lookup = state.followiz.get_status(&mapping.followiz_order_id).await?;

    Ok(Json(lookup.into()))
}
