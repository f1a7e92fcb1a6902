use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{EntityTrait, QueryOrder, Set};

use crate::{
    dto::content::SettingsMap,
    entity::settings::{ActiveModel as SettingActive, Column as SettingCol, Entity as Settings},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MAX_KEY_LEN: usize = 100;

/// Keys are lowercase identifiers such as `store_name` or `whatsapp_number`.
pub fn normalize_key(raw: &str) -> AppResult<String> {
    let key = raw.trim().to_lowercase();
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-');
    if !valid {
        return Err(AppError::BadRequest(format!("Invalid setting key {raw:?}")));
    }
    Ok(key)
}

pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<SettingsMap>> {
    let settings: BTreeMap<String, String> = Settings::find()
        .order_by_asc(SettingCol::Key)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| (row.key, row.value))
        .collect();
    Ok(ApiResponse::success("Settings", SettingsMap { settings }, None))
}

/// Each key is upserted on its own; an error part-way leaves the earlier
/// keys written.
pub async fn upsert_settings(
    state: &AppState,
    user: &AuthUser,
    payload: SettingsMap,
) -> AppResult<ApiResponse<SettingsMap>> {
    ensure_admin(user)?;
    if payload.settings.is_empty() {
        return Err(AppError::BadRequest("No settings given".into()));
    }
    let entries = payload
        .settings
        .into_iter()
        .map(|(key, value)| Ok((normalize_key(&key)?, value)))
        .collect::<AppResult<Vec<_>>>()?;

    for (key, value) in entries {
        let row = SettingActive {
            key: Set(key),
            value: Set(value),
            updated_at: Set(Utc::now().into()),
        };
        Settings::insert(row)
            .on_conflict(
                OnConflict::column(SettingCol::Key)
                    .update_columns([SettingCol::Value, SettingCol::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&state.orm)
            .await?;
    }
    tracing::info!(admin_id = %user.user_id, "settings updated");

    let current = get_settings(state).await?;
    Ok(ApiResponse::success(
        "Settings updated",
        current.data.unwrap_or(SettingsMap {
            settings: BTreeMap::new(),
        }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_lowercased_and_checked() {
        assert_eq!(normalize_key(" Store_Name ").ok(), Some("store_name".into()));
        assert_eq!(normalize_key("social.instagram").ok(), Some("social.instagram".into()));
        assert!(normalize_key("").is_err());
        assert!(normalize_key("has space").is_err());
        assert!(normalize_key(&"k".repeat(MAX_KEY_LEN + 1)).is_err());
    }
}
