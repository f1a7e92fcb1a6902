use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::content::{BankAccountList, CreateContactRequest, HeroSlideList, SettingsMap},
    error::AppResult,
    models::Contact,
    response::ApiResponse,
    services::{bank_account_service, contact_service, hero_slide_service, setting_service},
    state::AppState,
};

/// Public storefront content: settings, bank accounts, hero slides and the
/// contact form.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/bank-accounts", get(list_bank_accounts))
        .route("/hero-slides", get(list_hero_slides))
        .route("/contact", post(submit_contact))
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "All store settings", body = ApiResponse<SettingsMap>)
    ),
    tag = "Content"
)]
pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<ApiResponse<SettingsMap>>> {
    let resp = setting_service::get_settings(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bank-accounts",
    responses(
        (status = 200, description = "Active bank accounts for transfers", body = ApiResponse<BankAccountList>)
    ),
    tag = "Content"
)]
pub async fn list_bank_accounts(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<BankAccountList>>> {
    let resp = bank_account_service::list_active(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/hero-slides",
    responses(
        (status = 200, description = "Active hero slides in display order", body = ApiResponse<HeroSlideList>)
    ),
    tag = "Content"
)]
pub async fn list_hero_slides(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<HeroSlideList>>> {
    let resp = hero_slide_service::list_active(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Message received", body = ApiResponse<Contact>),
        (status = 400, description = "Missing name, email or message")
    ),
    tag = "Content"
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<CreateContactRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Contact>>)> {
    let resp = contact_service::submit_contact(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
