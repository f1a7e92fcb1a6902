use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::notifications::{MarkedRead, NotificationList, UnreadCount},
    entity::{
        notifications::{
            ActiveModel as NotificationActive, Column as NotificationCol, Entity as Notifications,
            Model as NotificationModel,
        },
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Notification, NotificationKind, NotificationStatus, UserRole},
    response::{ApiResponse, Meta},
    routes::params::UnreadFilter,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub order_id: Option<Uuid>,
    pub data: Option<Value>,
}

impl NewNotification {
    fn into_active(self, user_id: Uuid) -> NotificationActive {
        NotificationActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            order_id: Set(self.order_id),
            title: Set(self.title),
            message: Set(self.message),
            kind: Set(self.kind.to_string()),
            status: Set(NotificationStatus::Unread.to_string()),
            data: Set(self.data),
            created_at: NotSet,
        }
    }
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    notification: NewNotification,
) -> AppResult<NotificationModel> {
    Ok(notification.into_active(user_id).insert(db).await?)
}

/// Inserts one copy of `notification` for every admin user; returns how many
/// were written.
pub async fn create_for_admins<C: ConnectionTrait>(
    db: &C,
    notification: NewNotification,
) -> AppResult<u64> {
    let admin_ids: Vec<Uuid> = Users::find()
        .select_only()
        .column(UserCol::Id)
        .filter(UserCol::Role.eq(UserRole::Admin.as_ref()))
        .into_tuple()
        .all(db)
        .await?;

    if admin_ids.is_empty() {
        tracing::warn!("no admin users to notify");
        return Ok(0);
    }

    let rows: Vec<NotificationActive> = admin_ids
        .into_iter()
        .map(|id| notification.clone().into_active(id))
        .collect();
    let written = rows.len() as u64;
    Notifications::insert_many(rows).exec_without_returning(db).await?;
    Ok(written)
}

async fn count_unread(state: &AppState, user_id: Uuid) -> AppResult<i64> {
    Ok(Notifications::find()
        .filter(NotificationCol::UserId.eq(user_id))
        .filter(NotificationCol::Status.eq(NotificationStatus::Unread.as_ref()))
        .count(&state.orm)
        .await? as i64)
}

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    query: UnreadFilter,
) -> AppResult<ApiResponse<NotificationList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut finder = Notifications::find().filter(NotificationCol::UserId.eq(user.user_id));
    if query.unread_only {
        finder = finder.filter(NotificationCol::Status.eq(NotificationStatus::Unread.as_ref()));
    }
    let finder = finder.order_by_desc(NotificationCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Notification::from)
        .collect();
    let unread = count_unread(state, user.user_id).await?;

    Ok(ApiResponse::paginated(
        "Notifications",
        NotificationList { items, unread },
        page,
        limit,
        total,
    ))
}

pub async fn unread_count(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UnreadCount>> {
    let unread = count_unread(state, user.user_id).await?;
    Ok(ApiResponse::success("Unread", UnreadCount { unread }, None))
}

pub async fn mark_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Notification>> {
    let existing = Notifications::find()
        .filter(NotificationCol::Id.eq(id))
        .filter(NotificationCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let notification = if existing.status == NotificationStatus::Read.as_ref() {
        existing
    } else {
        let mut active: NotificationActive = existing.into();
        active.status = Set(NotificationStatus::Read.to_string());
        active.update(&state.orm).await?
    };

    Ok(ApiResponse::success("Marked as read", Notification::from(notification), None))
}

pub async fn mark_all_read(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MarkedRead>> {
    let result = Notifications::update_many()
        .col_expr(
            NotificationCol::Status,
            Expr::value(NotificationStatus::Read.to_string()),
        )
        .filter(NotificationCol::UserId.eq(user.user_id))
        .filter(NotificationCol::Status.eq(NotificationStatus::Unread.as_ref()))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "All notifications marked as read",
        MarkedRead {
            updated: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

pub async fn delete_notification(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Notifications::delete_many()
        .filter(NotificationCol::Id.eq(id))
        .filter(NotificationCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
