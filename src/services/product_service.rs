use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::products::{
        AddProductImageRequest, CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest,
    },
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        product_images::{
            ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages,
        },
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    db::contains_pattern,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Product, ProductImage},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, ProductQuery, ProductSortBy, SortOrder},
    slug::{slugify, unique_slug},
    state::AppState,
    storage::normalize_image_url,
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

async fn free_product_slug<C: ConnectionTrait>(
    db: &C,
    name: &str,
    exclude: Option<Uuid>,
) -> AppResult<String> {
    let base = slugify(name);
    let mut finder = Products::find().filter(Column::Slug.starts_with(&base));
    if let Some(id) = exclude {
        finder = finder.filter(Column::Id.ne(id));
    }
    let taken: Vec<String> = finder
        .select_only()
        .column(Column::Slug)
        .into_tuple()
        .all(db)
        .await?;
    Ok(unique_slug(&base, |candidate| taken.iter().any(|s| s == candidate)))
}

/// Images for each product, ordered by `sort_order`.
pub async fn images_for<C: ConnectionTrait>(
    db: &C,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<ProductImage>>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut grouped: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
    let images = ProductImages::find()
        .filter(ImageCol::ProductId.is_in(product_ids.to_vec()))
        .order_by_asc(ImageCol::SortOrder)
        .order_by_asc(ImageCol::CreatedAt)
        .all(db)
        .await?;
    for image in images {
        grouped
            .entry(image.product_id)
            .or_default()
            .push(ProductImage::from(image));
    }
    Ok(grouped)
}

async fn with_images<C: ConnectionTrait>(db: &C, models: Vec<ProductModel>) -> AppResult<Vec<Product>> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut images = images_for(db, &ids).await?;
    Ok(models
        .into_iter()
        .map(|model| {
            let imgs = images.remove(&model.id).unwrap_or_default();
            Product::with_images(model, imgs)
        })
        .collect())
}

fn validate_product_numbers(price: i64, stock: i32, weight: i32) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    if weight < 0 {
        return Err(AppError::BadRequest("weight must not be negative".into()));
    }
    Ok(())
}

async fn list(
    state: &AppState,
    query: ProductQuery,
    active_only: bool,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if active_only {
        condition = condition.add(Column::IsActive.eq(true));
    }

    if let Some(slug) = query.category.as_ref().filter(|s| !s.is_empty()) {
        let category = Categories::find()
            .filter(CategoryCol::Slug.eq(slug.as_str()))
            .one(&state.orm)
            .await?;
        match category {
            Some(c) => condition = condition.add(Column::CategoryId.eq(c.id)),
            None => {
                return Ok(ApiResponse::paginated(
                    "Products",
                    ProductList { items: Vec::new() },
                    page,
                    limit,
                    0,
                ));
            }
        }
    }

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_images(&state.orm, models).await?;

    Ok(ApiResponse::paginated("Products", ProductList { items }, page, limit, total))
}

pub async fn list_products(state: &AppState, query: ProductQuery) -> AppResult<ApiResponse<ProductList>> {
    list(state, query, true).await
}

pub async fn list_products_admin(
    state: &AppState,
    user: &AuthUser,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    list(state, query, false).await
}

async fn detail(state: &AppState, model: ProductModel) -> AppResult<ProductDetail> {
    let category = Categories::find_by_id(model.category_id)
        .one(&state.orm)
        .await?
        .map(Category::from);
    let images = images_for(&state.orm, &[model.id])
        .await?
        .remove(&model.id)
        .unwrap_or_default();
    Ok(ProductDetail {
        product: Product::with_images(model, images),
        category,
    })
}

pub async fn get_product(state: &AppState, slug: &str) -> AppResult<ApiResponse<ProductDetail>> {
    let model = Products::find()
        .filter(Column::Slug.eq(slug))
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", detail(state, model).await?, None))
}

pub async fn get_product_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(user)?;
    let model = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", detail(state, model).await?, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Product name is required".into()));
    }
    validate_product_numbers(payload.price, payload.stock, payload.weight)?;
    let image_urls = payload
        .images
        .iter()
        .map(|url| normalize_image_url(url))
        .collect::<AppResult<Vec<_>>>()?;
    if Categories::find_by_id(payload.category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("category not found".into()));
    }

    let txn = state.orm.begin().await?;
    let slug = free_product_slug(&txn, &name, None).await?;
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category_id),
        name: Set(name),
        slug: Set(slug),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        weight: Set(payload.weight),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut images = Vec::with_capacity(image_urls.len());
    for (position, url) in image_urls.into_iter().enumerate() {
        let image = ImageActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            url: Set(url),
            sort_order: Set(position as i32),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        images.push(ProductImage::from(image));
    }
    txn.commit().await?;

    tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
    Ok(ApiResponse::success(
        "Product created",
        Product::with_images(product, images),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    validate_product_numbers(
        payload.price.unwrap_or(existing.price),
        payload.stock.unwrap_or(existing.stock),
        payload.weight.unwrap_or(existing.weight),
    )?;

    let mut active: ActiveModel = existing.clone().into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Product name is required".into()));
        }
        if name != existing.name {
            active.slug = Set(free_product_slug(&state.orm, &name, Some(id)).await?);
        }
        active.name = Set(name);
    }
    if let Some(category_id) = payload.category_id {
        if Categories::find_by_id(category_id).one(&state.orm).await?.is_none() {
            return Err(AppError::BadRequest("category not found".into()));
        }
        active.category_id = Set(category_id);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(weight) = payload.weight {
        active.weight = Set(weight);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;
    let mut products = with_images(&state.orm, vec![product]).await?;
    let product = products.pop().ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let ordered = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if ordered > 0 {
        return Err(AppError::BadRequest(
            "Product has been ordered; deactivate it instead".into(),
        ));
    }

    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(product_id = %id, "product deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn add_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AddProductImageRequest,
) -> AppResult<ApiResponse<ProductImage>> {
    ensure_admin(user)?;
    let url = normalize_image_url(&payload.url)?;
    if Products::find_by_id(product_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let sort_order = match payload.sort_order {
        Some(order) => order,
        None => ProductImages::find()
            .filter(ImageCol::ProductId.eq(product_id))
            .count(&state.orm)
            .await? as i32,
    };

    let image = ImageActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        url: Set(url),
        sort_order: Set(sort_order),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Image added",
        ProductImage::from(image),
        Some(Meta::empty()),
    ))
}

pub async fn remove_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    image_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = ProductImages::delete_many()
        .filter(ImageCol::Id.eq(image_id))
        .filter(ImageCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success(
        "Image removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(Column::Stock.lte(threshold))
        .order_by_asc(Column::Stock)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_images(&state.orm, models).await?;

    Ok(ApiResponse::paginated("Low stock", ProductList { items }, page, limit, total))
}

#[cfg(test)]
mod tests {
    use super::validate_product_numbers;

    #[test]
    fn negative_numbers_are_rejected() {
        assert!(validate_product_numbers(10_000, 5, 250).is_ok());
        assert!(validate_product_numbers(0, 0, 0).is_ok());
        assert!(validate_product_numbers(-1, 5, 250).is_err());
        assert!(validate_product_numbers(10_000, -5, 250).is_err());
        assert!(validate_product_numbers(10_000, 5, -1).is_err());
    }
}
