use axum::extract::{Path, Query, State};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::sheets::Product;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Include inactive products. Honoured for admins only.
    #[serde(default)]
    pub all: bool,
}

/// GET /api/products - Products on the menu
pub async fn list(
    State(state): State<AppState>,
    session: SessionUser,
    WithRejection(Query(params), _): WithRejection<Query<ListParams>, ApiError>,
) -> ApiResult<Vec<Product>> {
    let include_inactive = params.all && session.is_admin();
    Ok(ApiResponse::success(state.products.list(include_inactive).await?))
}

/// GET /api/products/:id
pub async fn get(
    State(state): State<AppState>,
    _session: SessionUser,
    WithRejection(Path(id), _): WithRejection<Path<u32>, ApiError>,
) -> ApiResult<Product> {
    Ok(ApiResponse::success(state.products.get(id).await?))
}
