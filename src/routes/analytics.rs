use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};

use crate::{
    dto::analytics::{TrackVisitRequest, TrackedVisit},
    error::AppResult,
    response::ApiResponse,
    services::analytics_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/track", post(track_visit))
}

#[utoipa::path(
    post,
    path = "/api/analytics/track",
    request_body = TrackVisitRequest,
    responses(
        (status = 200, description = "Visit recorded", body = ApiResponse<TrackedVisit>),
        (status = 400, description = "Invalid visitor key or path")
    ),
    tag = "Analytics"
)]
pub async fn track_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TrackVisitRequest>,
) -> AppResult<Json<ApiResponse<TrackedVisit>>> {
    let resp = analytics_service::track_visit(&state, &headers, payload).await?;
    Ok(Json(resp))
}
