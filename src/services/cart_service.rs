use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    services::product_service::images_for,
    state::AppState,
};

pub fn line_total(price: i64, quantity: i32) -> i64 {
    price * i64::from(quantity)
}

/// Quantity the cart line ends up with after adding `requested` on top of
/// `already_in_cart`, provided the product has that much stock.
pub fn merged_quantity(stock: i32, already_in_cart: i32, requested: i32) -> AppResult<i32> {
    if requested < 1 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    let total = already_in_cart.saturating_add(requested);
    if total > stock {
        return Err(AppError::BadRequest(format!(
            "Insufficient stock, only {} available",
            (stock - already_in_cart).max(0)
        )));
    }
    Ok(total)
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .find_also_related(Products)
        .order_by_desc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let product_ids: Vec<Uuid> = rows.iter().map(|(item, _)| item.product_id).collect();
    let mut images = images_for(&state.orm, &product_ids).await?;

    let mut total_quantity: i64 = 0;
    let mut total_amount: i64 = 0;
    let mut items = Vec::with_capacity(rows.len());
    for (item, product) in rows {
        let Some(product) = product else { continue };
        let subtotal = line_total(product.price, item.quantity);
        total_quantity += i64::from(item.quantity);
        total_amount += subtotal;
        let product_images = images.remove(&product.id).unwrap_or_default();
        items.push(CartItemDto {
            id: item.id,
            product: Product::with_images(product, product_images),
            quantity: item.quantity,
            subtotal,
        });
    }

    Ok(ApiResponse::success(
        "OK",
        CartList {
            items,
            total_quantity,
            total_amount,
        },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if !product.is_active {
        return Err(AppError::BadRequest(format!(
            "{} is not available",
            product.name
        )));
    }

    let existing = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?;

    let already = existing.as_ref().map(|item| item.quantity).unwrap_or(0);
    let quantity = merged_quantity(product.stock, already, payload.quantity)?;

    let cart_item = match existing {
        Some(item) => {
            let mut active: CartActive = item.into();
            active.quantity = Set(quantity);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(payload.product_id),
                quantity: Set(quantity),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    tracing::debug!(
        user_id = %user.user_id,
        product_id = %payload.product_id,
        quantity,
        "cart item saved"
    );
    Ok(ApiResponse::success("Added to cart", CartItem::from(cart_item), None))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let (item, product) = CartItems::find()
        .filter(CartCol::Id.eq(item_id))
        .filter(CartCol::UserId.eq(user.user_id))
        .find_also_related(Products)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let product = product.ok_or(AppError::NotFound)?;

    if payload.quantity > product.stock {
        return Err(AppError::BadRequest(format!(
            "Insufficient stock, only {} available",
            product.stock
        )));
    }

    let mut active: CartActive = item.into();
    active.quantity = Set(payload.quantity);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Cart updated", CartItem::from(updated), None))
}

/// Deleting an item that is already gone is not an error.
pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(item_id))
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({ "removed": result.rows_affected }),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_sums_with_existing_quantity() {
        assert_eq!(merged_quantity(10, 3, 4).ok(), Some(7));
        assert_eq!(merged_quantity(10, 0, 10).ok(), Some(10));
    }

    #[test]
    fn adding_past_stock_fails() {
        let err = merged_quantity(10, 8, 3).expect_err("over stock");
        assert_eq!(err.to_string(), "Insufficient stock, only 2 available");
        assert!(merged_quantity(0, 0, 1).is_err());
    }

    #[test]
    fn non_positive_quantities_fail() {
        assert!(merged_quantity(10, 0, 0).is_err());
        assert!(merged_quantity(10, 0, -2).is_err());
    }

    #[test]
    fn line_totals_multiply() {
        assert_eq!(line_total(10_000, 2), 20_000);
        assert_eq!(line_total(5_000, 0), 0);
    }
}
