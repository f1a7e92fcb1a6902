use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackVisitRequest {
    pub visitor_key: String,
    pub path: String,
    pub referrer: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyticsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackedVisit {
    pub visitor_id: uuid::Uuid,
    pub visit_count: i32,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct DailyViews {
    pub day: NaiveDate,
    pub views: i64,
    pub visitors: i64,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct PageCount {
    pub path: String,
    pub views: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsSummary {
    pub days: i64,
    pub total_visitors: i64,
    pub total_page_views: i64,
    pub visitors_in_range: i64,
    pub page_views_in_range: i64,
    pub views_by_day: Vec<DailyViews>,
    pub top_pages: Vec<PageCount>,
}
