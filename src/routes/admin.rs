use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        analytics::{AnalyticsQuery, AnalyticsSummary},
        content::{
            BankAccountList, ContactList, CreateBankAccountRequest, CreateHeroSlideRequest,
            HeroSlideList, SettingsMap, UpdateBankAccountRequest, UpdateHeroSlideRequest,
        },
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        payments::RejectPaymentRequest,
        products::{ProductDetail, ProductList},
        reports::{DashboardSummary, ReportQuery, SalesReport},
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{BankAccount, Contact, HeroSlide, Order, User},
    response::ApiResponse,
    routes::params::{LowStockQuery, OrderListQuery, ProductQuery, UnreadFilter, UserListQuery},
    services::{
        analytics_service, bank_account_service, contact_service, hero_slide_service,
        order_service, payment_service, product_service, report_service, setting_service,
        user_service,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/payments", get(list_payments))
        .route("/payments/{id}/verify", post(verify_payment))
        .route("/payments/{id}/reject", post(reject_payment))
        .route("/products", get(list_products_admin))
        .route("/products/low-stock", get(list_low_stock))
        .route("/products/{id}", get(get_product_admin))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/bank-accounts", get(list_bank_accounts).post(create_bank_account))
        .route(
            "/bank-accounts/{id}",
            put(update_bank_account).delete(delete_bank_account),
        )
        .route("/hero-slides", get(list_hero_slides).post(create_hero_slide))
        .route(
            "/hero-slides/{id}",
            put(update_hero_slide).delete(delete_hero_slide),
        )
        .route("/settings", put(upsert_settings))
        .route("/contacts", get(list_contacts))
        .route("/contacts/{id}/read", patch(mark_contact_read))
        .route("/contacts/{id}", delete(delete_contact))
        .route("/reports/dashboard", get(dashboard))
        .route("/reports/sales", get(sales_report))
        .route("/analytics", get(analytics_summary))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("payment_status" = Option<String>, Query, description = "Filter by payment status"),
        ("q" = Option<String>, Query, description = "Order number contains"),
        ("sort_order" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "All orders", body = ApiResponse<OrderList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items and customer", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed, customer notified", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status or transition"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/payments",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("payment_status" = Option<String>, Query, description = "Payment status, default PAID")
    ),
    responses(
        (status = 200, description = "Orders by payment state", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = payment_service::list_payments(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/payments/{id}/verify",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Payment verified", body = ApiResponse<Order>),
        (status = 400, description = "Payment is not PAID"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = payment_service::verify_payment(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/payments/{id}/reject",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = RejectPaymentRequest,
    responses(
        (status = 200, description = "Payment rejected", body = ApiResponse<Order>),
        (status = 400, description = "Payment is not PAID or reason missing"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPaymentRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = payment_service::reject_payment(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category" = Option<String>, Query, description = "Category slug"),
        ("q" = Option<String>, Query, description = "Search in name and description")
    ),
    responses(
        (status = 200, description = "Products including inactive ones", body = ApiResponse<ProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_products_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products_admin(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/products/low-stock",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("threshold" = Option<i32>, Query, description = "Stock at or below, default 5")
    ),
    responses(
        (status = 200, description = "Low stock products", body = ApiResponse<ProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product by id", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_product_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Name or email contains"),
        ("role" = Option<String>, Query, description = "ADMIN or CUSTOMER")
    ),
    responses(
        (status = 200, description = "Users", body = ApiResponse<UserList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<User>),
        (status = 400, description = "Invalid input or email taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = user_service::create_user(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<User>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_user(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<User>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_user(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "User has orders or is the caller"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::delete_user(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/bank-accounts",
    responses(
        (status = 200, description = "All bank accounts", body = ApiResponse<BankAccountList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_bank_accounts(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BankAccountList>>> {
    let resp = bank_account_service::list_all(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/bank-accounts",
    request_body = CreateBankAccountRequest,
    responses(
        (status = 201, description = "Bank account created", body = ApiResponse<BankAccount>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_bank_account(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBankAccountRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BankAccount>>)> {
    let resp = bank_account_service::create_bank_account(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/admin/bank-accounts/{id}",
    params(("id" = Uuid, Path, description = "Bank account ID")),
    request_body = UpdateBankAccountRequest,
    responses(
        (status = 200, description = "Bank account updated", body = ApiResponse<BankAccount>),
        (status = 404, description = "Bank account not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_bank_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBankAccountRequest>,
) -> AppResult<Json<ApiResponse<BankAccount>>> {
    let resp = bank_account_service::update_bank_account(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/bank-accounts/{id}",
    params(("id" = Uuid, Path, description = "Bank account ID")),
    responses(
        (status = 200, description = "Bank account deleted"),
        (status = 404, description = "Bank account not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_bank_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = bank_account_service::delete_bank_account(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/hero-slides",
    responses(
        (status = 200, description = "All hero slides", body = ApiResponse<HeroSlideList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_hero_slides(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<HeroSlideList>>> {
    let resp = hero_slide_service::list_all(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/hero-slides",
    request_body = CreateHeroSlideRequest,
    responses(
        (status = 201, description = "Hero slide created", body = ApiResponse<HeroSlide>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_hero_slide(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateHeroSlideRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<HeroSlide>>)> {
    let resp = hero_slide_service::create_hero_slide(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/admin/hero-slides/{id}",
    params(("id" = Uuid, Path, description = "Hero slide ID")),
    request_body = UpdateHeroSlideRequest,
    responses(
        (status = 200, description = "Hero slide updated", body = ApiResponse<HeroSlide>),
        (status = 404, description = "Hero slide not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_hero_slide(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateHeroSlideRequest>,
) -> AppResult<Json<ApiResponse<HeroSlide>>> {
    let resp = hero_slide_service::update_hero_slide(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/hero-slides/{id}",
    params(("id" = Uuid, Path, description = "Hero slide ID")),
    responses(
        (status = 200, description = "Hero slide deleted"),
        (status = 404, description = "Hero slide not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_hero_slide(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = hero_slide_service::delete_hero_slide(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = SettingsMap,
    responses(
        (status = 200, description = "Settings upserted", body = ApiResponse<SettingsMap>),
        (status = 400, description = "Invalid key")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn upsert_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SettingsMap>,
) -> AppResult<Json<ApiResponse<SettingsMap>>> {
    let resp = setting_service::upsert_settings(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/contacts",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("unread_only" = Option<bool>, Query, description = "Only unread messages")
    ),
    responses(
        (status = 200, description = "Contact messages", body = ApiResponse<ContactList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UnreadFilter>,
) -> AppResult<Json<ApiResponse<ContactList>>> {
    let resp = contact_service::list_contacts(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/contacts/{id}/read",
    params(("id" = Uuid, Path, description = "Contact message ID")),
    responses(
        (status = 200, description = "Marked read", body = ApiResponse<Contact>),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn mark_contact_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::mark_contact_read(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/contacts/{id}",
    params(("id" = Uuid, Path, description = "Contact message ID")),
    responses(
        (status = 200, description = "Message deleted"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = contact_service::delete_contact(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/dashboard",
    responses(
        (status = 200, description = "Store dashboard", body = ApiResponse<DashboardSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardSummary>>> {
    let resp = report_service::dashboard(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/sales",
    params(
        ("from" = Option<String>, Query, description = "Start date YYYY-MM-DD, default 30 days before `to`"),
        ("to" = Option<String>, Query, description = "End date YYYY-MM-DD, default today")
    ),
    responses(
        (status = 200, description = "Sales over the date range", body = ApiResponse<SalesReport>),
        (status = 400, description = "Invalid range")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<SalesReport>>> {
    let resp = report_service::sales_report(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/analytics",
    params(("days" = Option<i64>, Query, description = "Look-back window in days, default 30")),
    responses(
        (status = 200, description = "Visitor analytics", body = ApiResponse<AnalyticsSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn analytics_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<ApiResponse<AnalyticsSummary>>> {
    let resp = analytics_service::summary(&state, &user, query).await?;
    Ok(Json(resp))
}
