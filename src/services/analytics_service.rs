use axum::http::HeaderMap;
use uuid::Uuid;

use crate::{
    dto::analytics::{AnalyticsQuery, AnalyticsSummary, DailyViews, PageCount, TrackVisitRequest, TrackedVisit},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const DEFAULT_DAYS: i64 = 30;
pub const MAX_DAYS: i64 = 365;
const MAX_KEY_LEN: usize = 128;
const MAX_PATH_LEN: usize = 512;
const MAX_USER_AGENT_LEN: usize = 512;
const TOP_PAGES: i64 = 10;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// First `x-forwarded-for` hop, then `x-real-ip`, else `"unknown"`.
pub fn client_ip(headers: &HeaderMap) -> String {
    header(headers, "x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header(headers, "x-real-ip"))
        .unwrap_or("unknown")
        .to_string()
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    header(headers, "user-agent").map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect())
}

pub fn clamp_days(days: Option<i64>) -> i64 {
    days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS)
}

fn validate_visit(payload: &TrackVisitRequest) -> AppResult<(String, String)> {
    let key = payload.visitor_key.trim();
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(AppError::BadRequest("Invalid visitor key".into()));
    }
    let path = payload.path.trim();
    if !path.starts_with('/') || path.len() > MAX_PATH_LEN {
        return Err(AppError::BadRequest("Path must start with '/'".into()));
    }
    Ok((key.to_string(), path.to_string()))
}

pub async fn track_visit(
    state: &AppState,
    headers: &HeaderMap,
    payload: TrackVisitRequest,
) -> AppResult<ApiResponse<TrackedVisit>> {
    let (visitor_key, path) = validate_visit(&payload)?;
    let referrer = payload
        .referrer
        .map(|r| r.trim().chars().take(MAX_PATH_LEN).collect::<String>())
        .filter(|r| !r.is_empty());
    let ip = client_ip(headers);
    let agent = user_agent(headers);

    let mut tx = state.pool.begin().await?;

    let (visitor_id, visit_count): (Uuid, i32) = sqlx::query_as(
        r#"
        INSERT INTO visitors (id, visitor_key, ip_address, user_agent, first_seen, last_seen, visit_count)
        VALUES ($1, $2, $3, $4, NOW(), NOW(), 1)
        ON CONFLICT (visitor_key) DO UPDATE SET
            last_seen = NOW(),
            visit_count = visitors.visit_count + 1,
            ip_address = EXCLUDED.ip_address,
            user_agent = COALESCE(EXCLUDED.user_agent, visitors.user_agent)
        RETURNING id, visit_count
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&visitor_key)
    .bind(&ip)
    .bind(agent)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO page_visits (id, visitor_id, path, referrer) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(visitor_id)
    .bind(&path)
    .bind(referrer)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::debug!(%visitor_id, %path, %ip, "page visit tracked");

    Ok(ApiResponse::success(
        "Tracked",
        TrackedVisit {
            visitor_id,
            visit_count,
        },
        None,
    ))
}

pub async fn summary(
    state: &AppState,
    user: &AuthUser,
    query: AnalyticsQuery,
) -> AppResult<ApiResponse<AnalyticsSummary>> {
    ensure_admin(user)?;
    let days = clamp_days(query.days);
    let interval_days = days as i32;

    let (total_visitors, total_page_views): (i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM visitors), (SELECT COUNT(*) FROM page_visits)",
    )
    .fetch_one(&state.pool)
    .await?;

    let (visitors_in_range, page_views_in_range): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT visitor_id), COUNT(*)
        FROM page_visits
        WHERE created_at >= NOW() - make_interval(days => $1)
        "#,
    )
    .bind(interval_days)
    .fetch_one(&state.pool)
    .await?;

    let views_by_day = sqlx::query_as::<_, DailyViews>(
        r#"
        SELECT created_at::date AS day, COUNT(*) AS views, COUNT(DISTINCT visitor_id) AS visitors
        FROM page_visits
        WHERE created_at >= NOW() - make_interval(days => $1)
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(interval_days)
    .fetch_all(&state.pool)
    .await?;

    let top_pages = sqlx::query_as::<_, PageCount>(
        r#"
        SELECT path, COUNT(*) AS views
        FROM page_visits
        WHERE created_at >= NOW() - make_interval(days => $1)
        GROUP BY path
        ORDER BY views DESC, path
        LIMIT $2
        "#,
    )
    .bind(interval_days)
    .bind(TOP_PAGES)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Analytics",
        AnalyticsSummary {
            days,
            total_visitors,
            total_page_views,
            visitors_in_range,
            page_views_in_range,
            views_by_day,
            top_pages,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn forwarded_for_wins_and_takes_first_hop() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(client_ip(&h), "203.0.113.7");
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let h = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_ip(&h), "198.51.100.4");
        let h = headers(&[("x-forwarded-for", " , "), ("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_ip(&h), "198.51.100.4");
    }

    #[test]
    fn missing_headers_mean_unknown() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn days_are_clamped() {
        assert_eq!(clamp_days(None), 30);
        assert_eq!(clamp_days(Some(0)), 1);
        assert_eq!(clamp_days(Some(7)), 7);
        assert_eq!(clamp_days(Some(10_000)), 365);
    }

    #[test]
    fn visits_need_a_key_and_rooted_path() {
        let ok = TrackVisitRequest {
            visitor_key: "abc".into(),
            path: "/produk/bakpia".into(),
            referrer: None,
        };
        assert!(validate_visit(&ok).is_ok());
        let bad_path = TrackVisitRequest {
            path: "produk".into(),
            ..ok
        };
        assert!(validate_visit(&bad_path).is_err());
    }
}
