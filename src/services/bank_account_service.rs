use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::content::{BankAccountList, CreateBankAccountRequest, UpdateBankAccountRequest},
    entity::bank_accounts::{
        ActiveModel as BankAccountActive, Column as BankAccountCol, Entity as BankAccounts,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::BankAccount,
    response::{ApiResponse, Meta},
    state::AppState,
};

fn required(value: String, field: &str) -> AppResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value)
}

/// Account numbers are stored digits-only so customers can copy them.
pub fn normalize_account_number(raw: &str) -> AppResult<String> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest("Invalid account number".into()));
    }
    Ok(digits)
}

async fn list(state: &AppState, active_only: bool) -> AppResult<Vec<BankAccount>> {
    let mut finder = BankAccounts::find();
    if active_only {
        finder = finder.filter(BankAccountCol::IsActive.eq(true));
    }
    Ok(finder
        .order_by_asc(BankAccountCol::BankName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(BankAccount::from)
        .collect())
}

pub async fn list_active(state: &AppState) -> AppResult<ApiResponse<BankAccountList>> {
    let items = list(state, true).await?;
    Ok(ApiResponse::success("Bank accounts", BankAccountList { items }, None))
}

pub async fn list_all(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<BankAccountList>> {
    ensure_admin(user)?;
    let items = list(state, false).await?;
    Ok(ApiResponse::success("Bank accounts", BankAccountList { items }, None))
}

pub async fn create_bank_account(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBankAccountRequest,
) -> AppResult<ApiResponse<BankAccount>> {
    ensure_admin(user)?;
    let account = BankAccountActive {
        id: Set(Uuid::new_v4()),
        bank_name: Set(required(payload.bank_name, "bank_name")?),
        account_number: Set(normalize_account_number(&payload.account_number)?),
        account_name: Set(required(payload.account_name, "account_name")?),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(bank_account_id = %account.id, "bank account created");
    Ok(ApiResponse::success(
        "Bank account created",
        BankAccount::from(account),
        Some(Meta::empty()),
    ))
}

pub async fn update_bank_account(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBankAccountRequest,
) -> AppResult<ApiResponse<BankAccount>> {
    ensure_admin(user)?;
    let existing = BankAccounts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: BankAccountActive = existing.into();
    if let Some(bank_name) = payload.bank_name {
        active.bank_name = Set(required(bank_name, "bank_name")?);
    }
    if let Some(number) = payload.account_number {
        active.account_number = Set(normalize_account_number(&number)?);
    }
    if let Some(account_name) = payload.account_name {
        active.account_name = Set(required(account_name, "account_name")?);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let account = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Bank account updated",
        BankAccount::from(account),
        Some(Meta::empty()),
    ))
}

pub async fn delete_bank_account(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = BankAccounts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Deleted", serde_json::json!({}), Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_numbers_keep_only_digits() {
        assert_eq!(normalize_account_number("123-456 7890").ok(), Some("1234567890".into()));
        assert!(normalize_account_number("12a4").is_err());
        assert!(normalize_account_number(" - ").is_err());
    }
}
