use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    db::contains_pattern,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{NotificationKind, Order, OrderItem, OrderStatus, PaymentStatus, User},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::notification_service::{self, NewNotification},
    state::AppState,
};

/// One cart line joined with the product it points at.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub stock: i32,
    pub is_active: bool,
    pub quantity: i32,
}

/// Validates every line in cart order and returns the order total.
/// The first unavailable or under-stocked product aborts the checkout.
pub fn order_total(lines: &[CartLine]) -> AppResult<i64> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    let mut total: i64 = 0;
    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        if !line.is_active {
            return Err(AppError::BadRequest(format!(
                "{} is no longer available",
                line.name
            )));
        }
        if line.stock < line.quantity {
            return Err(insufficient_stock(&line.name, line.stock));
        }
        total += line.price * i64::from(line.quantity);
    }
    Ok(total)
}

fn insufficient_stock(name: &str, stock: i32) -> AppError {
    AppError::BadRequest(format!(
        "Insufficient stock for {name} (available: {stock})"
    ))
}

const ORDER_NUMBER_ATTEMPTS: u32 = 5;

/// `ORD-YYYYMMDD-XXXXXXXX`, the suffix taken from the order's UUID. The
/// column is UNIQUE; `insert_order` retries with a new UUID on a clash.
pub fn build_order_number(order_id: Uuid, at: DateTime<Utc>) -> String {
    let simple = order_id.simple().to_string().to_uppercase();
    format!("ORD-{}-{}", at.format("%Y%m%d"), &simple[..8])
}

/// Customer and shipping fields of an order about to be placed.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: Uuid,
    pub total_amount: i64,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub notes: Option<String>,
}

/// Inserts a `PENDING`/`PENDING` order. Each attempt runs in a savepoint so a
/// taken order number only rolls back that attempt; `next_id` supplies the
/// UUID for the next try.
pub async fn insert_order(
    txn: &DatabaseTransaction,
    draft: &OrderDraft,
    at: DateTime<Utc>,
    mut next_id: impl FnMut() -> Uuid,
) -> AppResult<OrderModel> {
    let mut attempt = 1;
    loop {
        let id = next_id();
        let order_number = build_order_number(id, at);
        let savepoint = txn.begin().await?;
        let inserted = OrderActive {
            id: Set(id),
            order_number: Set(order_number.clone()),
            user_id: Set(draft.user_id),
            total_amount: Set(draft.total_amount),
            status: Set(OrderStatus::Pending.to_string()),
            payment_status: Set(PaymentStatus::Pending.to_string()),
            shipping_name: Set(draft.shipping_name.clone()),
            shipping_phone: Set(draft.shipping_phone.clone()),
            shipping_address: Set(draft.shipping_address.clone()),
            notes: Set(draft.notes.clone()),
            payment_proof_url: Set(None),
            payment_rejection_reason: Set(None),
            paid_at: Set(None),
            verified_at: Set(None),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&savepoint)
        .await;

        match inserted {
            Ok(order) => {
                savepoint.commit().await?;
                return Ok(order);
            }
            Err(err)
                if attempt < ORDER_NUMBER_ATTEMPTS
                    && matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                savepoint.rollback().await?;
                tracing::warn!(%order_number, attempt, "order number taken, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Customers may only back out before any payment proof is on file.
pub fn customer_can_cancel(status: OrderStatus, payment: PaymentStatus) -> bool {
    status == OrderStatus::Pending && payment == PaymentStatus::Pending
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub async fn load_items<C: ConnectionTrait>(db: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect())
}

async fn restore_stock(txn: &DatabaseTransaction, order_id: Uuid) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(txn)
        .await?;
    for item in items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(txn)
            .await?;
    }
    Ok(())
}

pub async fn lock_order(
    txn: &DatabaseTransaction,
    id: Uuid,
    owner: Option<Uuid>,
) -> AppResult<OrderModel> {
    let mut condition = Condition::all().add(OrderCol::Id.eq(id));
    if let Some(user_id) = owner {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    Orders::find()
        .filter(condition)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let shipping_name = required(&payload.shipping_name, "shipping_name")?;
    let shipping_phone = required(&payload.shipping_phone, "shipping_phone")?;
    let shipping_address = required(&payload.shipping_address, "shipping_address")?;
    let notes = payload.notes.filter(|n| !n.trim().is_empty());

    let txn = state.orm.begin().await?;

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    // Lock products in id order so concurrent checkouts queue up instead of
    // deadlocking.
    let product_ids: Vec<Uuid> = cart.iter().map(|item| item.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let lines: Vec<CartLine> = cart
        .iter()
        .filter_map(|item| {
            products.get(&item.product_id).map(|p| CartLine {
                product_id: p.id,
                name: p.name.clone(),
                price: p.price,
                stock: p.stock,
                is_active: p.is_active,
                quantity: item.quantity,
            })
        })
        .collect();
    let total_amount = order_total(&lines)?;

    let draft = OrderDraft {
        user_id: user.user_id,
        total_amount,
        shipping_name,
        shipping_phone,
        shipping_address,
        notes,
    };
    let order = insert_order(&txn, &draft, Utc::now(), Uuid::new_v4).await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            product_name: Set(line.name.clone()),
            quantity: Set(line.quantity),
            price: Set(line.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(item));

        let decremented = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(ProdCol::Id.eq(line.product_id))
            .filter(ProdCol::Stock.gte(line.quantity))
            .exec(&txn)
            .await?;
        if decremented.rows_affected != 1 {
            return Err(insufficient_stock(&line.name, line.stock));
        }
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    notification_service::create_for_admins(
        &txn,
        NewNotification {
            title: "Pesanan baru".into(),
            message: format!(
                "Pesanan {} senilai Rp{} menunggu pembayaran",
                order.order_number, order.total_amount
            ),
            kind: NotificationKind::NewOrder,
            order_id: Some(order.id),
            data: Some(serde_json::json!({
                "order_number": order.order_number,
                "total_amount": order.total_amount,
                "items": order_items.len(),
            })),
        },
    )
    .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total_amount = order.total_amount,
        "order placed"
    );

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
            customer: None,
        },
        Some(Meta::empty()),
    ))
}

async fn list(
    state: &AppState,
    query: OrderListQuery,
    owner: Option<Uuid>,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(user_id) = owner {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.to_uppercase()));
    }
    if let Some(status) = query.payment_status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::PaymentStatus.eq(status.to_uppercase()));
    }
    if let Some(q) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition =
            condition.add(OrderCol::OrderNumber.like(contains_pattern(&q.to_uppercase())));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::paginated("Orders", OrderList { items: orders }, page, limit, total))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    list(state, query, Some(user.user_id)).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    list(state, query, None).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
            customer: None,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let (order, customer) = Orders::find_by_id(id)
        .find_also_related(Users)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "Order found",
        OrderWithItems {
            order: Order::from(order),
            items,
            customer: customer.map(User::from),
        },
        Some(Meta::empty()),
    ))
}

/// Cancels a customer's own order while it and its payment are both
/// pending; the reserved stock goes back on the shelf.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id, Some(user.user_id)).await?;

    let status = OrderStatus::from_str(&order.status)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("unknown order status")))?;
    let payment = PaymentStatus::from_str(&order.payment_status)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("unknown payment status")))?;
    if !customer_can_cancel(status, payment) {
        return Err(AppError::BadRequest(
            "Only pending orders without a payment proof can be cancelled".into(),
        ));
    }

    restore_stock(&txn, order.id).await?;

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled.to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    notification_service::create_for_admins(
        &txn,
        NewNotification {
            title: "Pesanan dibatalkan".into(),
            message: format!("Pesanan {} dibatalkan oleh pelanggan", order.order_number),
            kind: NotificationKind::OrderStatus,
            order_id: Some(order.id),
            data: None,
        },
    )
    .await?;

    txn.commit().await?;
    tracing::info!(order_id = %order.id, "order cancelled by customer");

    Ok(ApiResponse::success("Order cancelled", Order::from(order), Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next = OrderStatus::from_str(payload.status.trim())
        .map_err(|_| AppError::BadRequest("Invalid order status".into()))?;

    let txn = state.orm.begin().await?;
    let existing = lock_order(&txn, id, None).await?;
    let current = OrderStatus::from_str(&existing.status)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("unknown order status")))?;

    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {current} to {next}"
        )));
    }

    if next == OrderStatus::Cancelled {
        restore_stock(&txn, existing.id).await?;
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(next.to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    notification_service::create(
        &txn,
        order.user_id,
        NewNotification {
            title: "Status pesanan diperbarui".into(),
            message: format!("Pesanan {} sekarang berstatus {}", order.order_number, next),
            kind: NotificationKind::OrderStatus,
            order_id: Some(order.id),
            data: Some(serde_json::json!({ "from": current, "to": next })),
        },
    )
    .await?;

    txn.commit().await?;
    tracing::info!(order_id = %order.id, from = %current, to = %next, "order status updated");

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(name: &str, price: i64, stock: i32, quantity: i32) -> CartLine {
        CartLine {
            product_id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            stock,
            is_active: true,
            quantity,
        }
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let lines = vec![line("Bakpia", 10_000, 5, 2), line("Dodol", 5_000, 3, 1)];
        assert_eq!(order_total(&lines).ok(), Some(25_000));
    }

    #[test]
    fn empty_cart_cannot_be_checked_out() {
        let err = order_total(&[]).expect_err("empty");
        assert_eq!(err.to_string(), "Cart is empty");
    }

    #[test]
    fn first_short_product_is_named() {
        let lines = vec![
            line("Bakpia", 10_000, 5, 2),
            line("Dodol", 5_000, 1, 3),
            line("Pempek", 20_000, 0, 1),
        ];
        let err = order_total(&lines).expect_err("short");
        assert_eq!(err.to_string(), "Insufficient stock for Dodol (available: 1)");
    }

    #[test]
    fn inactive_products_block_checkout() {
        let mut gone = line("Keripik", 8_000, 10, 1);
        gone.is_active = false;
        assert!(order_total(&[gone]).is_err());
    }

    #[test]
    fn customers_cancel_only_untouched_orders() {
        assert!(customer_can_cancel(OrderStatus::Pending, PaymentStatus::Pending));
        for payment in [
            PaymentStatus::Paid,
            PaymentStatus::Verified,
            PaymentStatus::Rejected,
        ] {
            assert!(!customer_can_cancel(OrderStatus::Pending, payment));
        }
        assert!(!customer_can_cancel(OrderStatus::Confirmed, PaymentStatus::Pending));
        assert!(!customer_can_cancel(OrderStatus::Cancelled, PaymentStatus::Pending));
    }

    #[test]
    fn order_number_has_date_and_uuid_prefix() {
        let id = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").expect("uuid");
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).single().expect("date");
        assert_eq!(build_order_number(id, at), "ORD-20261017-1A2B3C4D");
    }
}
