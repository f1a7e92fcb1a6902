use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Order;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_products: i64,
    pub total_categories: i64,
    pub total_customers: i64,
    pub total_orders: i64,
    pub total_revenue: i64,
    pub pending_payments: i64,
    pub low_stock_products: i64,
    pub recent_orders: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct DailySales {
    pub day: NaiveDate,
    pub orders: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_orders: i64,
    pub total_revenue: i64,
    pub average_order_value: i64,
    pub sales_by_day: Vec<DailySales>,
    pub orders_by_status: Vec<StatusCount>,
    pub payments_by_status: Vec<StatusCount>,
    pub top_products: Vec<TopProduct>,
}
