use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{EntityTrait, QueryOrder, QuerySelect};
use sqlx::FromRow;

use crate::{
    dto::reports::{DailySales, DashboardSummary, ReportQuery, SalesReport, StatusCount, TopProduct},
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus, PaymentStatus, UserRole},
    response::{ApiResponse, Meta},
    services::product_service::DEFAULT_LOW_STOCK_THRESHOLD,
    state::AppState,
};

pub const DEFAULT_REPORT_DAYS: i64 = 30;
pub const MAX_REPORT_DAYS: i64 = 366;
const RECENT_ORDERS: u64 = 5;
const TOP_PRODUCTS: i64 = 10;

/// Inclusive date range of a report. Defaults to the last 30 days ending
/// `today`; a missing start is counted back from the end.
pub fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<(NaiveDate, NaiveDate)> {
    let to = to.unwrap_or(today);
    let from = from.unwrap_or(to - Duration::days(DEFAULT_REPORT_DAYS - 1));
    if from > to {
        return Err(AppError::BadRequest("`from` must not be after `to`".into()));
    }
    if (to - from).num_days() >= MAX_REPORT_DAYS {
        return Err(AppError::BadRequest(format!(
            "Report range is limited to {MAX_REPORT_DAYS} days"
        )));
    }
    Ok((from, to))
}

pub fn average(total: i64, count: i64) -> i64 {
    if count > 0 { total / count } else { 0 }
}

#[derive(FromRow)]
struct DashboardCounts {
    total_products: i64,
    total_categories: i64,
    total_customers: i64,
    total_orders: i64,
    total_revenue: i64,
    pending_payments: i64,
    low_stock_products: i64,
}

pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DashboardSummary>> {
    ensure_admin(user)?;
    let counts = sqlx::query_as::<_, DashboardCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM products) AS total_products,
            (SELECT COUNT(*) FROM categories) AS total_categories,
            (SELECT COUNT(*) FROM users WHERE role = $1) AS total_customers,
            (SELECT COUNT(*) FROM orders) AS total_orders,
            (SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders
                WHERE payment_status = $2 AND status <> $5) AS total_revenue,
            (SELECT COUNT(*) FROM orders
                WHERE payment_status = $3 AND status <> $5) AS pending_payments,
            (SELECT COUNT(*) FROM products WHERE stock <= $4) AS low_stock_products
        "#,
    )
    .bind(UserRole::Customer.as_ref())
    .bind(PaymentStatus::Verified.as_ref())
    .bind(PaymentStatus::Paid.as_ref())
    .bind(DEFAULT_LOW_STOCK_THRESHOLD)
    .bind(OrderStatus::Cancelled.as_ref())
    .fetch_one(&state.pool)
    .await?;

    let recent_orders = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_ORDERS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Dashboard",
        DashboardSummary {
            total_products: counts.total_products,
            total_categories: counts.total_categories,
            total_customers: counts.total_customers,
            total_orders: counts.total_orders,
            total_revenue: counts.total_revenue,
            pending_payments: counts.pending_payments,
            low_stock_products: counts.low_stock_products,
            recent_orders,
        },
        Some(Meta::empty()),
    ))
}

/// Orders count unless cancelled; revenue counts verified payments of
/// orders that were not cancelled afterwards.
pub async fn sales_report(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<SalesReport>> {
    ensure_admin(user)?;
    let (from, to) = resolve_range(query.from, query.to, Utc::now().date_naive())?;
    let cancelled = OrderStatus::Cancelled.as_ref();
    let verified = PaymentStatus::Verified.as_ref();

    let (total_orders, total_revenue): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE status <> $3),
            COALESCE(SUM(total_amount) FILTER (WHERE payment_status = $4 AND status <> $3), 0)::BIGINT
        FROM orders
        WHERE created_at >= $1::date AND created_at < $2::date + 1
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(cancelled)
    .bind(verified)
    .fetch_one(&state.pool)
    .await?;

    let sales_by_day = sqlx::query_as::<_, DailySales>(
        r#"
        SELECT
            created_at::date AS day,
            COUNT(*) FILTER (WHERE status <> $3) AS orders,
            COALESCE(SUM(total_amount) FILTER (WHERE payment_status = $4 AND status <> $3), 0)::BIGINT AS revenue
        FROM orders
        WHERE created_at >= $1::date AND created_at < $2::date + 1
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(cancelled)
    .bind(verified)
    .fetch_all(&state.pool)
    .await?;

    let orders_by_status = sqlx::query_as::<_, StatusCount>(
        r#"
        SELECT status, COUNT(*) AS count
        FROM orders
        WHERE created_at >= $1::date AND created_at < $2::date + 1
        GROUP BY status
        ORDER BY status
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(&state.pool)
    .await?;

    let payments_by_status = sqlx::query_as::<_, StatusCount>(
        r#"
        SELECT payment_status AS status, COUNT(*) AS count
        FROM orders
        WHERE created_at >= $1::date AND created_at < $2::date + 1
        GROUP BY payment_status
        ORDER BY payment_status
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(&state.pool)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT
            oi.product_id,
            MAX(oi.product_name) AS name,
            SUM(oi.quantity)::BIGINT AS quantity_sold,
            SUM(oi.quantity::BIGINT * oi.price)::BIGINT AS revenue
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.created_at >= $1::date AND o.created_at < $2::date + 1
          AND o.status <> $3
        GROUP BY oi.product_id
        ORDER BY quantity_sold DESC, name
        LIMIT $4
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(cancelled)
    .bind(TOP_PRODUCTS)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Sales report",
        SalesReport {
            from,
            to,
            total_orders,
            total_revenue,
            average_order_value: average(total_revenue, total_orders),
            sales_by_day,
            orders_by_status,
            payments_by_status,
            top_products,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn default_range_is_last_thirty_days() {
        let today = day(2026, 10, 17);
        assert_eq!(resolve_range(None, None, today).ok(), Some((day(2026, 9, 18), today)));
    }

    #[test]
    fn start_is_counted_back_from_explicit_end() {
        let to = day(2026, 3, 31);
        assert_eq!(
            resolve_range(None, Some(to), day(2026, 10, 17)).ok(),
            Some((day(2026, 3, 2), to))
        );
    }

    #[test]
    fn inverted_and_oversized_ranges_fail() {
        let today = day(2026, 10, 17);
        assert!(resolve_range(Some(day(2026, 10, 18)), Some(today), today).is_err());
        assert!(resolve_range(Some(day(2024, 1, 1)), Some(today), today).is_err());
        assert!(resolve_range(Some(today), Some(today), today).is_ok());
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(0, 0), 0);
        assert_eq!(average(25_000, 2), 12_500);
    }
}
