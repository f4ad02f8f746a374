use axum::extract::{Json, Path, State};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiResponse, ApiResult};
use crate::services::{NewProduct, ProductUpdate};
use crate::sheets::Product;
use crate::state::AppState;

/// POST /api/products - Add a product; ids are assigned by the service
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Json(body), _): WithRejection<Json<NewProduct>, ApiError>,
) -> ApiResult<Product> {
    Ok(ApiResponse::created(state.products.create(body).await?))
}

/// PUT /api/products/:id - Partial update; absent fields are left alone
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Path(id), _): WithRejection<Path<u32>, ApiError>,
    WithRejection(Json(body), _): WithRejection<Json<ProductUpdate>, ApiError>,
) -> ApiResult<Product> {
    Ok(ApiResponse::success(state.products.update(id, body).await?))
}

/// DELETE /api/products/:id
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Path(id), _): WithRejection<Path<u32>, ApiError>,
) -> ApiResult<Value> {
    state.products.delete(id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i64,
}

/// POST /api/products/:id/stock - Restock (`delta` > 0) or correct (`delta` < 0)
pub async fn adjust_stock(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): WithRejection<Path<u32>, ApiError>,
    WithRejection(Json(body), _): WithRejection<Json<StockAdjustment>, ApiError>,
) -> ApiResult<Product> {
    tracing::info!("'{}' adjusting stock of product {} by {}", admin.username, id, body.delta);
    Ok(ApiResponse::success(state.products.adjust_stock(id, body.delta).await?))
}
