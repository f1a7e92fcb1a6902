use std::str::FromStr;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    db::contains_pattern,
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{User, UserRole},
    response::{ApiResponse, Meta},
    routes::params::UserListQuery,
    services::auth_service::{hash_password, normalize_email, validate_password},
    state::AppState,
};

fn parse_role(role: &str) -> AppResult<UserRole> {
    UserRole::from_str(role.trim().to_uppercase().as_str())
        .map_err(|_| AppError::BadRequest(format!("Invalid role {role}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(role) = query.role.as_deref().filter(|r| !r.trim().is_empty()) {
        condition = condition.add(UserCol::Role.eq(parse_role(role)?.as_ref()));
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = contains_pattern(q);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(UserCol::Name).ilike(pattern.clone()))
                .add(Expr::col(UserCol::Email).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::paginated("Users", UserList { items }, page, limit, total))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let found = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("User found", User::from(found), Some(Meta::empty())))
}

pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    let email = normalize_email(&payload.email)?;
    validate_password(&payload.password)?;
    let role = match payload.role.as_deref() {
        Some(role) => parse_role(role)?,
        None => UserRole::Customer,
    };

    let created = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(role.to_string()),
        phone: Set(non_blank(payload.phone)),
        address: Set(non_blank(payload.address)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %created.id, role = %role, admin_id = %user.user_id, "user created");
    Ok(ApiResponse::success("User created", User::from(created), Some(Meta::empty())))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name is required".into()));
        }
        active.name = Set(name);
    }
    if payload.phone.is_some() {
        active.phone = Set(non_blank(payload.phone));
    }
    if payload.address.is_some() {
        active.address = Set(non_blank(payload.address));
    }
    if let Some(role) = payload.role.as_deref() {
        let role = parse_role(role)?;
        if id == user.user_id && role != UserRole::Admin {
            return Err(AppError::BadRequest("You cannot demote yourself".into()));
        }
        active.role = Set(role.to_string());
    }
    if let Some(password) = payload.password.as_deref() {
        validate_password(password)?;
        active.password_hash = Set(hash_password(password)?);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success("User updated", User::from(updated), Some(Meta::empty())))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::BadRequest("You cannot delete yourself".into()));
    }
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(id))
        .count(&state.orm)
        .await?;
    if orders > 0 {
        return Err(AppError::BadRequest(format!(
            "User has {orders} order(s) and cannot be deleted"
        )));
    }

    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(user_id = %id, admin_id = %user.user_id, "user deleted");
    Ok(ApiResponse::success("Deleted", serde_json::json!({}), Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(parse_role("admin").ok(), Some(UserRole::Admin));
        assert_eq!(parse_role(" Customer ").ok(), Some(UserRole::Customer));
        assert!(parse_role("owner").is_err());
    }

    #[test]
    fn blank_optional_fields_become_none() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" 0812 ".into())), Some("0812".into()));
        assert_eq!(non_blank(None), None);
    }
}
