use axum::extract::{Query, State};
use axum_extra::extract::WithRejection;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::services::{SalesQuery, SalesSummary};
use crate::sheets::SaleLine;
use crate::state::AppState;

/// Staff only ever see their own sales
fn scoped(session: &SessionUser, mut query: SalesQuery) -> SalesQuery {
    if !session.is_admin() {
        query.username = Some(session.username.clone());
    }
    query
}

/// GET /api/sales?from&to&username&order_id&limit - Sale lines, newest first
pub async fn history(
    State(state): State<AppState>,
    session: SessionUser,
    WithRejection(Query(query), _): WithRejection<Query<SalesQuery>, ApiError>,
) -> ApiResult<Vec<SaleLine>> {
    let query = scoped(&session, query);
    Ok(ApiResponse::success(state.sales.history(&query).await?))
}

/// GET /api/sales/summary?from&to&username
pub async fn summary(
    State(state): State<AppState>,
    session: SessionUser,
    WithRejection(Query(query), _): WithRejection<Query<SalesQuery>, ApiError>,
) -> ApiResult<SalesSummary> {
    let query = scoped(&session, query);
    Ok(ApiResponse::success(state.sales.summary(&query).await?))
}
