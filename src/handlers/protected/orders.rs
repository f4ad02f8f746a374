use axum::extract::{Json, State};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::services::{OrderItem, Receipt};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderItem>,
}

/// POST /api/orders - Ring up an order for the logged-in user
///
/// Expected Input:
/// ```json
/// { "items": [{ "product_id": 1, "quantity": 2 }] }
/// ```
///
/// Answers 201 with the receipt. Unknown products are 404, inactive products
/// and empty orders 400, short stock 409.
pub async fn place(
    State(state): State<AppState>,
    session: SessionUser,
    WithRejection(Json(body), _): WithRejection<Json<OrderRequest>, ApiError>,
) -> ApiResult<Receipt> {
    let receipt = state.sales.place_order(&session.username, &body.items).await?;
    Ok(ApiResponse::created(receipt))
}
