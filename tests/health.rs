mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use toko_oleh_oleh::app::build_app;

async fn body_json(response: axum::response::Response) -> anyhow::Result<serde_json::Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn health_reports_database_up() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let app = build_app(db.state.clone())?;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "up");
    Ok(())
}

#[tokio::test]
async fn unknown_paths_fall_through_to_404() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let app = build_app(db.state.clone())?;

    let response = app
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await?;
    assert_eq!(body["data"]["path"], "/api/nope");
    Ok(())
}

#[tokio::test]
async fn cart_requires_a_bearer_token() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let app = build_app(db.state.clone())?;

    let response = app
        .oneshot(Request::builder().uri("/api/cart").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn public_catalog_is_open() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let category = common::create_category(&db.state, "Oleh-oleh Jogja").await?;
    common::create_product(&db.state, &category, "Geplak", 15_000, 12).await?;
    let app = build_app(db.state.clone())?;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/products?q=gep")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["data"]["items"][0]["name"], "Geplak");
    Ok(())
}
