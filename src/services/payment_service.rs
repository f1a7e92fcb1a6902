use std::str::FromStr;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::OrderList,
        payments::{PaymentProofRequest, RejectPaymentRequest},
    },
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{NotificationKind, Order, OrderStatus, PaymentStatus},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::{
        notification_service::{self, NewNotification},
        order_service::lock_order,
    },
    state::AppState,
    storage::normalize_image_url,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Review {
    Verify,
    Reject,
}

/// Outcome of an admin review: the new payment status and, on verify of a
/// pending order, the order status it advances to. Cancelled orders are
/// never reviewed.
pub fn review_payment(
    payment: PaymentStatus,
    status: OrderStatus,
    review: Review,
) -> AppResult<(PaymentStatus, Option<OrderStatus>)> {
    if status == OrderStatus::Cancelled {
        return Err(AppError::BadRequest(
            "Order is cancelled, its payment can no longer be reviewed".into(),
        ));
    }
    if payment != PaymentStatus::Paid {
        return Err(AppError::BadRequest(format!(
            "Payment is {payment}, only PAID payments can be reviewed"
        )));
    }
    Ok(match review {
        Review::Verify => (
            PaymentStatus::Verified,
            (status == OrderStatus::Pending).then_some(OrderStatus::Confirmed),
        ),
        Review::Reject => (PaymentStatus::Rejected, None),
    })
}

/// Whether a customer may (re)submit a proof for an order in this state.
pub fn accepts_proof(payment: PaymentStatus, status: OrderStatus) -> bool {
    status != OrderStatus::Cancelled
        && matches!(payment, PaymentStatus::Pending | PaymentStatus::Rejected)
}

fn parse_statuses(payment: &str, status: &str) -> AppResult<(PaymentStatus, OrderStatus)> {
    let payment = PaymentStatus::from_str(payment)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("unknown payment status {payment}")))?;
    let status = OrderStatus::from_str(status)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("unknown order status {status}")))?;
    Ok((payment, status))
}

pub async fn upload_payment_proof(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: PaymentProofRequest,
) -> AppResult<ApiResponse<Order>> {
    let url = normalize_image_url(&payload.payment_proof_url)?;

    let txn = state.orm.begin().await?;
    let existing = lock_order(&txn, order_id, Some(user.user_id)).await?;
    let (payment, status) = parse_statuses(&existing.payment_status, &existing.status)?;
    if !accepts_proof(payment, status) {
        return Err(AppError::BadRequest(format!(
            "Payment proof cannot be uploaded while payment is {payment} and order is {status}"
        )));
    }

    let now = Utc::now();
    let mut active: OrderActive = existing.into();
    active.payment_status = Set(PaymentStatus::Paid.to_string());
    active.payment_proof_url = Set(Some(url));
    active.payment_rejection_reason = Set(None);
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    notification_service::create_for_admins(
        &txn,
        NewNotification {
            title: "Bukti pembayaran diterima".into(),
            message: format!("Pesanan {} menunggu verifikasi pembayaran", order.order_number),
            kind: NotificationKind::Payment,
            order_id: Some(order.id),
            data: None,
        },
    )
    .await?;

    txn.commit().await?;
    tracing::info!(order_id = %order.id, "payment proof uploaded");

    Ok(ApiResponse::success(
        "Payment proof uploaded",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// Orders awaiting review by default; `payment_status` in the query widens
/// it to any payment state. Cancelled orders never wait for review.
pub async fn list_payments(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let payment_status = query
        .payment_status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| PaymentStatus::Paid.to_string());

    let mut finder = Orders::find();
    if payment_status == PaymentStatus::Paid.as_ref() {
        finder = finder.filter(OrderCol::Status.ne(OrderStatus::Cancelled.as_ref()));
    }
    let finder = finder
        .filter(OrderCol::PaymentStatus.eq(payment_status))
        .order_by_asc(OrderCol::PaidAt)
        .order_by_asc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::paginated("Payments", OrderList { items }, page, limit, total))
}

async fn review(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    review: Review,
    reason: Option<String>,
) -> AppResult<Order> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let existing = lock_order(&txn, order_id, None).await?;
    let (payment, status) = parse_statuses(&existing.payment_status, &existing.status)?;
    let (next_payment, next_status) = review_payment(payment, status, review)?;

    let now = Utc::now();
    let mut active: OrderActive = existing.into();
    active.payment_status = Set(next_payment.to_string());
    if let Some(next) = next_status {
        active.status = Set(next.to_string());
    }
    match review {
        Review::Verify => active.verified_at = Set(Some(now.into())),
        Review::Reject => active.payment_rejection_reason = Set(reason),
    }
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        admin_id = %user.user_id,
        payment_status = %next_payment,
        "payment reviewed"
    );
    Ok(Order::from(order))
}

pub async fn verify_payment(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = review(state, user, order_id, Review::Verify, None).await?;
    Ok(ApiResponse::success("Payment verified", order, Some(Meta::empty())))
}

pub async fn reject_payment(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: RejectPaymentRequest,
) -> AppResult<ApiResponse<Order>> {
    let reason = payload.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::BadRequest("Rejection reason is required".into()));
    }
    let order = review(state, user, order_id, Review::Reject, Some(reason)).await?;
    Ok(ApiResponse::success("Payment rejected", order, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_confirms_pending_orders() {
        let out = review_payment(PaymentStatus::Paid, OrderStatus::Pending, Review::Verify).ok();
        assert_eq!(out, Some((PaymentStatus::Verified, Some(OrderStatus::Confirmed))));
    }

    #[test]
    fn verify_leaves_advanced_orders_alone() {
        let out = review_payment(PaymentStatus::Paid, OrderStatus::Processing, Review::Verify).ok();
        assert_eq!(out, Some((PaymentStatus::Verified, None)));
    }

    #[test]
    fn reject_only_touches_payment() {
        let out = review_payment(PaymentStatus::Paid, OrderStatus::Pending, Review::Reject).ok();
        assert_eq!(out, Some((PaymentStatus::Rejected, None)));
    }

    #[test]
    fn only_paid_payments_are_reviewable() {
        for payment in [
            PaymentStatus::Pending,
            PaymentStatus::Verified,
            PaymentStatus::Rejected,
        ] {
            assert!(review_payment(payment, OrderStatus::Pending, Review::Verify).is_err());
            assert!(review_payment(payment, OrderStatus::Pending, Review::Reject).is_err());
        }
    }

    #[test]
    fn cancelled_orders_cannot_be_reviewed() {
        for review in [Review::Verify, Review::Reject] {
            let err = review_payment(PaymentStatus::Paid, OrderStatus::Cancelled, review)
                .expect_err("cancelled");
            assert!(matches!(err, AppError::BadRequest(_)));
        }
    }

    #[test]
    fn proofs_are_accepted_until_paid() {
        assert!(accepts_proof(PaymentStatus::Pending, OrderStatus::Pending));
        assert!(accepts_proof(PaymentStatus::Rejected, OrderStatus::Pending));
        assert!(!accepts_proof(PaymentStatus::Paid, OrderStatus::Pending));
        assert!(!accepts_proof(PaymentStatus::Verified, OrderStatus::Confirmed));
        assert!(!accepts_proof(PaymentStatus::Pending, OrderStatus::Cancelled));
    }
}
