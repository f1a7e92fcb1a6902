use axum::extract::Multipart;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
    storage::StoredImage,
};

const FILE_FIELD: &str = "file";

pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<StoredImage>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_default();
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;

        let stored = state
            .storage
            .store(bytes.to_vec(), &file_name, &content_type)
            .await?;
        tracing::info!(
            user_id = %user.user_id,
            url = %stored.url,
            location = ?stored.location,
            "image uploaded"
        );
        return Ok(ApiResponse::success("Uploaded", stored, Some(Meta::empty())));
    }

    Err(AppError::BadRequest(format!(
        "Multipart field `{FILE_FIELD}` is required"
    )))
}
