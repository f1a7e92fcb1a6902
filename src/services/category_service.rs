use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CategoryWithCount, CreateCategoryRequest, UpdateCategoryRequest},
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    response::{ApiResponse, Meta},
    slug::{slugify, unique_slug},
    state::AppState,
    storage::normalize_image_url,
};

/// Generates a slug from `name` that no row in `categories` uses yet.
/// `exclude` skips the row being renamed.
async fn free_category_slug<C: ConnectionTrait>(
    db: &C,
    name: &str,
    exclude: Option<Uuid>,
) -> AppResult<String> {
    let base = slugify(name);
    let mut finder = Categories::find().filter(CategoryCol::Slug.starts_with(&base));
    if let Some(id) = exclude {
        finder = finder.filter(CategoryCol::Id.ne(id));
    }
    let taken: Vec<String> = finder
        .select_only()
        .column(CategoryCol::Slug)
        .into_tuple()
        .all(db)
        .await?;
    Ok(unique_slug(&base, |candidate| taken.iter().any(|s| s == candidate)))
}

#[derive(FromQueryResult)]
struct ProductCount {
    category_id: Uuid,
    count: i64,
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let categories = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?;

    let counts: HashMap<Uuid, i64> = Products::find()
        .select_only()
        .column(ProdCol::CategoryId)
        .column_as(Expr::col(ProdCol::Id).count(), "count")
        .filter(ProdCol::IsActive.eq(true))
        .group_by(ProdCol::CategoryId)
        .into_model::<ProductCount>()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| (row.category_id, row.count))
        .collect();

    let items = categories
        .into_iter()
        .map(|model| CategoryWithCount {
            product_count: counts.get(&model.id).copied().unwrap_or(0),
            category: Category::from(model),
        })
        .collect();

    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn get_category(state: &AppState, slug: &str) -> AppResult<ApiResponse<CategoryWithCount>> {
    let category = Categories::find()
        .filter(CategoryCol::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let product_count = Products::find()
        .filter(ProdCol::CategoryId.eq(category.id))
        .filter(ProdCol::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;

    Ok(ApiResponse::success(
        "Category",
        CategoryWithCount {
            category: Category::from(category),
            product_count,
        },
        None,
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name is required".into()));
    }
    let image_url = payload
        .image_url
        .as_deref()
        .map(normalize_image_url)
        .transpose()?;

    let slug = free_category_slug(&state.orm, &name, None).await?;
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        description: Set(payload.description),
        image_url: Set(image_url),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(category_id = %category.id, slug = %category.slug, "category created");
    Ok(ApiResponse::success(
        "Category created",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CategoryActive = existing.clone().into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Category name is required".into()));
        }
        if name != existing.name {
            active.slug = Set(free_category_slug(&state.orm, &name, Some(id)).await?);
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(url) = payload.image_url {
        active.image_url = Set(Some(normalize_image_url(&url)?));
    }
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Category updated",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let products = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if products > 0 {
        return Err(AppError::BadRequest(format!(
            "Category still has {products} product(s)"
        )));
    }

    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(category_id = %id, "category deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
