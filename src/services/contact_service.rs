use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::content::{ContactList, CreateContactRequest},
    entity::contacts::{ActiveModel as ContactActive, Column as ContactCol, Entity as Contacts},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Contact,
    response::{ApiResponse, Meta},
    routes::params::UnreadFilter,
    services::auth_service::normalize_email,
    state::AppState,
};

pub const MAX_MESSAGE_LEN: usize = 5000;

pub async fn submit_contact(
    state: &AppState,
    payload: CreateContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let name = payload.name.trim().to_string();
    let message = payload.message.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if message.is_empty() {
        return Err(AppError::BadRequest("Message is required".into()));
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::BadRequest(format!(
            "Message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }
    let email = normalize_email(&payload.email)?;

    let contact = ContactActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        phone: Set(payload.phone.filter(|p| !p.trim().is_empty())),
        subject: Set(payload.subject.filter(|s| !s.trim().is_empty())),
        message: Set(message),
        is_read: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(contact_id = %contact.id, "contact message received");
    Ok(ApiResponse::success(
        "Message sent",
        Contact::from(contact),
        Some(Meta::empty()),
    ))
}

pub async fn list_contacts(
    state: &AppState,
    user: &AuthUser,
    query: UnreadFilter,
) -> AppResult<ApiResponse<ContactList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let mut finder = Contacts::find();
    if query.unread_only {
        finder = finder.filter(ContactCol::IsRead.eq(false));
    }
    let finder = finder.order_by_desc(ContactCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Contact::from)
        .collect();

    Ok(ApiResponse::paginated("Contacts", ContactList { items }, page, limit, total))
}

pub async fn mark_contact_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Contact>> {
    ensure_admin(user)?;
    let existing = Contacts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let contact = if existing.is_read {
        existing
    } else {
        let mut active: ContactActive = existing.into();
        active.is_read = Set(true);
        active.update(&state.orm).await?
    };

    Ok(ApiResponse::success("Marked as read", Contact::from(contact), None))
}

pub async fn delete_contact(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Contacts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Deleted", serde_json::json!({}), Some(Meta::empty())))
}
