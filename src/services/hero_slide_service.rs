use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::content::{CreateHeroSlideRequest, HeroSlideList, UpdateHeroSlideRequest},
    entity::hero_slides::{ActiveModel as SlideActive, Column as SlideCol, Entity as HeroSlides},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::HeroSlide,
    response::{ApiResponse, Meta},
    state::AppState,
    storage::normalize_image_url,
};

async fn list(state: &AppState, active_only: bool) -> AppResult<Vec<HeroSlide>> {
    let mut finder = HeroSlides::find();
    if active_only {
        finder = finder.filter(SlideCol::IsActive.eq(true));
    }
    Ok(finder
        .order_by_asc(SlideCol::SortOrder)
        .order_by_asc(SlideCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(HeroSlide::from)
        .collect())
}

pub async fn list_active(state: &AppState) -> AppResult<ApiResponse<HeroSlideList>> {
    let items = list(state, true).await?;
    Ok(ApiResponse::success("Hero slides", HeroSlideList { items }, None))
}

pub async fn list_all(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<HeroSlideList>> {
    ensure_admin(user)?;
    let items = list(state, false).await?;
    Ok(ApiResponse::success("Hero slides", HeroSlideList { items }, None))
}

pub async fn create_hero_slide(
    state: &AppState,
    user: &AuthUser,
    payload: CreateHeroSlideRequest,
) -> AppResult<ApiResponse<HeroSlide>> {
    ensure_admin(user)?;
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    let image_url = normalize_image_url(&payload.image_url)?;

    let slide = SlideActive {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        subtitle: Set(payload.subtitle),
        image_url: Set(image_url),
        link_url: Set(payload.link_url),
        sort_order: Set(payload.sort_order.unwrap_or(0)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(slide_id = %slide.id, "hero slide created");
    Ok(ApiResponse::success(
        "Hero slide created",
        HeroSlide::from(slide),
        Some(Meta::empty()),
    ))
}

pub async fn update_hero_slide(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateHeroSlideRequest,
) -> AppResult<ApiResponse<HeroSlide>> {
    ensure_admin(user)?;
    let existing = HeroSlides::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: SlideActive = existing.into();
    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required".into()));
        }
        active.title = Set(title);
    }
    if let Some(subtitle) = payload.subtitle {
        active.subtitle = Set(Some(subtitle));
    }
    if let Some(url) = payload.image_url {
        active.image_url = Set(normalize_image_url(&url)?);
    }
    if let Some(link) = payload.link_url {
        active.link_url = Set(Some(link));
    }
    if let Some(sort_order) = payload.sort_order {
        active.sort_order = Set(sort_order);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let slide = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Hero slide updated",
        HeroSlide::from(slide),
        Some(Meta::empty()),
    ))
}

pub async fn delete_hero_slide(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = HeroSlides::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Deleted", serde_json::json!({}), Some(Meta::empty())))
}
