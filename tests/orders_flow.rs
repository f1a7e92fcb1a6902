mod common;

use chrono::{TimeZone, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait};
use uuid::Uuid;

use toko_oleh_oleh::{
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
        payments::{PaymentProofRequest, RejectPaymentRequest},
        products::CreateProductRequest,
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        notifications::{Column as NotificationCol, Entity as Notifications},
        orders::Entity as Orders,
        product_images::{Column as ImageCol, Entity as ProductImages},
        products::{Column as ProdCol, Entity as Products},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{NotificationKind, UserRole},
    routes::params::{OrderListQuery, ProductQuery, UnreadFilter, UserListQuery},
    services::{
        cart_service,
        notification_service::{self, NewNotification},
        order_service::{self, OrderDraft},
        payment_service, product_service, report_service, user_service,
    },
    state::AppState,
};

fn shipping() -> CheckoutRequest {
    CheckoutRequest {
        shipping_name: "Budi Santoso".into(),
        shipping_phone: "081234567890".into(),
        shipping_address: "Jl. Kaliurang Km 5, Sleman".into(),
        notes: None,
    }
}

async fn add(state: &AppState, user: &AuthUser, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    cart_service::add_to_cart(state, user, AddToCartRequest { product_id, quantity }).await?;
    Ok(())
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    Ok(Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|p| p.stock)
        .unwrap_or(-1))
}

#[tokio::test]
async fn checkout_snapshots_prices_moves_stock_and_notifies_each_admin() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;

    common::create_user(state, UserRole::Admin, "admin1@example.com").await?;
    common::create_user(state, UserRole::Admin, "admin2@example.com").await?;
    let customer = common::create_user(state, UserRole::Customer, "budi@example.com").await?;
    let category = common::create_category(state, "Makanan Khas").await?;
    let bakpia = common::create_product(state, &category, "Bakpia", 10_000, 5).await?;
    let dodol = common::create_product(state, &category, "Dodol", 5_000, 3).await?;

    add(state, &customer, bakpia.id, 2).await?;
    add(state, &customer, dodol.id, 1).await?;

    let placed = order_service::checkout(state, &customer, shipping())
        .await?
        .data
        .expect("order");
    assert_eq!(placed.order.total_amount, 25_000);
    assert_eq!(placed.order.status, "PENDING");
    assert_eq!(placed.order.payment_status, "PENDING");
    assert!(placed.order.order_number.starts_with("ORD-"));
    assert_eq!(placed.items.len(), 2);

    assert_eq!(stock_of(state, bakpia.id).await?, 3);
    assert_eq!(stock_of(state, dodol.id).await?, 2);

    let cart_left = CartItems::find()
        .filter(CartCol::UserId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(cart_left, 0);

    let admin_notes = Notifications::find()
        .filter(NotificationCol::OrderId.eq(placed.order.id))
        .filter(NotificationCol::Kind.eq(NotificationKind::NewOrder.as_ref()))
        .count(&state.orm)
        .await?;
    assert_eq!(admin_notes, 2);

    // Later price changes do not touch the placed order.
    Products::update_many()
        .col_expr(ProdCol::Price, Expr::value(99_000_i64))
        .filter(ProdCol::Id.eq(bakpia.id))
        .exec(&state.orm)
        .await?;
    let reloaded = order_service::get_order(state, &customer, placed.order.id)
        .await?
        .data
        .expect("order");
    let line = reloaded
        .items
        .iter()
        .find(|item| item.product_id == bakpia.id)
        .expect("bakpia line");
    assert_eq!(line.price, 10_000);
    assert_eq!(line.subtotal, 20_000);
    assert_eq!(line.product_name, "Bakpia");
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_be_checked_out() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let customer = common::create_user(state, UserRole::Customer, "sari@example.com").await?;

    let err = order_service::checkout(state, &customer, shipping())
        .await
        .expect_err("empty cart");
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Cart is empty"));
    assert_eq!(Orders::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn short_stock_rolls_back_the_whole_checkout() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    common::create_user(state, UserRole::Admin, "admin@example.com").await?;
    let customer = common::create_user(state, UserRole::Customer, "ayu@example.com").await?;
    let category = common::create_category(state, "Camilan").await?;
    let keripik = common::create_product(state, &category, "Keripik Balado", 30_000, 10).await?;
    let pempek = common::create_product(state, &category, "Pempek", 20_000, 2).await?;

    add(state, &customer, keripik.id, 3).await?;
    add(state, &customer, pempek.id, 2).await?;

    // Someone else buys the pempek in the meantime.
    Products::update_many()
        .col_expr(ProdCol::Stock, Expr::value(1))
        .filter(ProdCol::Id.eq(pempek.id))
        .exec(&state.orm)
        .await?;

    let err = order_service::checkout(state, &customer, shipping())
        .await
        .expect_err("insufficient stock");
    match err {
        AppError::BadRequest(msg) => assert!(msg.contains("Pempek"), "{msg}"),
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(Orders::find().count(&state.orm).await?, 0);
    assert_eq!(stock_of(state, keripik.id).await?, 10);
    assert_eq!(stock_of(state, pempek.id).await?, 1);
    assert_eq!(Notifications::find().count(&state.orm).await?, 0);
    let cart_left = CartItems::find()
        .filter(CartCol::UserId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(cart_left, 2);
    Ok(())
}

#[tokio::test]
async fn payments_are_reviewed_only_once_paid() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let admin = common::create_user(state, UserRole::Admin, "admin@example.com").await?;
    let customer = common::create_user(state, UserRole::Customer, "dewi@example.com").await?;
    let category = common::create_category(state, "Minuman").await?;
    let kopi = common::create_product(state, &category, "Kopi Gayo", 75_000, 5).await?;

    add(state, &customer, kopi.id, 1).await?;
    let order = order_service::checkout(state, &customer, shipping())
        .await?
        .data
        .expect("order")
        .order;

    let err = payment_service::verify_payment(state, &admin, order.id)
        .await
        .expect_err("pending payment");
    assert!(matches!(err, AppError::BadRequest(_)));

    let customer_role_err = payment_service::verify_payment(state, &customer, order.id)
        .await
        .expect_err("customers cannot verify");
    assert!(matches!(customer_role_err, AppError::Unauthorized));

    let paid = payment_service::upload_payment_proof(
        state,
        &customer,
        order.id,
        PaymentProofRequest {
            payment_proof_url: "/uploads/bukti-transfer.png".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(paid.payment_status, "PAID");
    assert!(paid.paid_at.is_some());

    let blank = payment_service::reject_payment(
        state,
        &admin,
        order.id,
        RejectPaymentRequest { reason: "  ".into() },
    )
    .await
    .expect_err("blank reason");
    assert!(matches!(blank, AppError::BadRequest(_)));

    let verified = payment_service::verify_payment(state, &admin, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(verified.payment_status, "VERIFIED");
    assert_eq!(verified.status, "CONFIRMED");
    assert!(verified.verified_at.is_some());

    let again = payment_service::verify_payment(state, &admin, order.id)
        .await
        .expect_err("already verified");
    assert!(matches!(again, AppError::BadRequest(_)));

    let customer_notes = Notifications::find()
        .filter(NotificationCol::UserId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(customer_notes, 0);
    Ok(())
}

#[tokio::test]
async fn rejected_proof_can_be_uploaded_again() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let admin = common::create_user(state, UserRole::Admin, "admin@example.com").await?;
    let customer = common::create_user(state, UserRole::Customer, "eko@example.com").await?;
    let category = common::create_category(state, "Kerajinan").await?;
    let batik = common::create_product(state, &category, "Batik Tulis", 350_000, 2).await?;

    add(state, &customer, batik.id, 1).await?;
    let order = order_service::checkout(state, &customer, shipping())
        .await?
        .data
        .expect("order")
        .order;
    let proof = || PaymentProofRequest {
        payment_proof_url: "/uploads/bukti.jpg".into(),
    };

    payment_service::upload_payment_proof(state, &customer, order.id, proof()).await?;
    let rejected = payment_service::reject_payment(
        state,
        &admin,
        order.id,
        RejectPaymentRequest {
            reason: "Nominal tidak sesuai".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(rejected.payment_status, "REJECTED");
    assert_eq!(rejected.status, "PENDING");
    assert_eq!(rejected.payment_rejection_reason.as_deref(), Some("Nominal tidak sesuai"));

    let resubmitted = payment_service::upload_payment_proof(state, &customer, order.id, proof())
        .await?
        .data
        .expect("order");
    assert_eq!(resubmitted.payment_status, "PAID");
    assert_eq!(resubmitted.payment_rejection_reason, None);
    Ok(())
}

#[tokio::test]
async fn cancelling_returns_stock_and_status_moves_forward_only() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let admin = common::create_user(state, UserRole::Admin, "admin@example.com").await?;
    let customer = common::create_user(state, UserRole::Customer, "rina@example.com").await?;
    let category = common::create_category(state, "Makanan Khas").await?;
    let bakpia = common::create_product(state, &category, "Bakpia Keju", 40_000, 4).await?;

    add(state, &customer, bakpia.id, 3).await?;
    let first = order_service::checkout(state, &customer, shipping())
        .await?
        .data
        .expect("order")
        .order;
    assert_eq!(stock_of(state, bakpia.id).await?, 1);

    let cancelled = order_service::cancel_order(state, &customer, first.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, "CANCELLED");
    assert_eq!(stock_of(state, bakpia.id).await?, 4);

    add(state, &customer, bakpia.id, 1).await?;
    let second = order_service::checkout(state, &customer, shipping())
        .await?
        .data
        .expect("order")
        .order;

    let shipped = order_service::update_order_status(
        state,
        &admin,
        second.id,
        UpdateOrderStatusRequest {
            status: "SHIPPED".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.status, "SHIPPED");

    let backwards = order_service::update_order_status(
        state,
        &admin,
        second.id,
        UpdateOrderStatusRequest {
            status: "PROCESSING".into(),
        },
    )
    .await
    .expect_err("backwards transition");
    assert!(matches!(backwards, AppError::BadRequest(_)));

    let status_notes = Notifications::find()
        .filter(NotificationCol::UserId.eq(customer.user_id))
        .filter(NotificationCol::Kind.eq(NotificationKind::OrderStatus.as_ref()))
        .count(&state.orm)
        .await?;
    assert_eq!(status_notes, 1);
    Ok(())
}

#[tokio::test]
async fn mark_all_read_only_touches_the_callers_notifications() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let ani = common::create_user(state, UserRole::Customer, "ani@example.com").await?;
    let joko = common::create_user(state, UserRole::Customer, "joko@example.com").await?;

    for (user, count) in [(&ani, 3), (&joko, 2)] {
        for n in 0..count {
            notification_service::create(
                &state.orm,
                user.user_id,
                NewNotification {
                    title: format!("Info {n}"),
                    message: "Promo akhir pekan".into(),
                    kind: NotificationKind::System,
                    order_id: None,
                    data: None,
                },
            )
            .await?;
        }
    }

    let marked = notification_service::mark_all_read(state, &ani)
        .await?
        .data
        .expect("marked");
    assert_eq!(marked.updated, 3);

    let ani_unread = notification_service::unread_count(state, &ani).await?.data.expect("count");
    let joko_unread = notification_service::unread_count(state, &joko).await?.data.expect("count");
    assert_eq!(ani_unread.unread, 0);
    assert_eq!(joko_unread.unread, 2);

    let listed = notification_service::list_notifications(
        state,
        &joko,
        UnreadFilter {
            unread_only: true,
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list");
    assert_eq!(listed.items.len(), 2);
    Ok(())
}

async fn pay(state: &AppState, customer: &AuthUser, order_id: Uuid) -> anyhow::Result<()> {
    payment_service::upload_payment_proof(
        state,
        customer,
        order_id,
        PaymentProofRequest {
            payment_proof_url: "/uploads/bukti.png".into(),
        },
    )
    .await?;
    Ok(())
}

async fn place_order(
    state: &AppState,
    customer: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<Uuid> {
    add(state, customer, product_id, quantity).await?;
    Ok(order_service::checkout(state, customer, shipping())
        .await?
        .data
        .expect("order")
        .order
        .id)
}

#[tokio::test]
async fn cancelled_orders_leave_the_payment_queue_and_revenue() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let admin = common::create_user(state, UserRole::Admin, "admin@example.com").await?;
    let customer = common::create_user(state, UserRole::Customer, "wati@example.com").await?;
    let category = common::create_category(state, "Makanan Khas").await?;
    let gudeg = common::create_product(state, &category, "Gudeg Kaleng", 45_000, 5).await?;

    // Paid, then cancelled by the shop before anyone looked at the proof.
    let unreviewed = place_order(state, &customer, gudeg.id, 1).await?;
    pay(state, &customer, unreviewed).await?;
    order_service::update_order_status(
        state,
        &admin,
        unreviewed,
        UpdateOrderStatusRequest {
            status: "CANCELLED".into(),
        },
    )
    .await?;

    let queue = payment_service::list_payments(state, &admin, OrderListQuery::default())
        .await?
        .data
        .expect("queue");
    assert!(queue.items.iter().all(|order| order.id != unreviewed));

    for attempt in [
        payment_service::verify_payment(state, &admin, unreviewed).await,
        payment_service::reject_payment(
            state,
            &admin,
            unreviewed,
            RejectPaymentRequest {
                reason: "Dibatalkan".into(),
            },
        )
        .await,
    ] {
        let err = attempt.expect_err("cancelled order");
        assert!(matches!(err, AppError::BadRequest(_)));
    }
    let stored = Orders::find_by_id(unreviewed)
        .one(&state.orm)
        .await?
        .expect("order");
    assert_eq!(stored.payment_status, "PAID");
    assert_eq!(stored.status, "CANCELLED");

    // Verified, then cancelled: no longer revenue.
    let verified = place_order(state, &customer, gudeg.id, 2).await?;
    pay(state, &customer, verified).await?;
    payment_service::verify_payment(state, &admin, verified).await?;
    let before = report_service::dashboard(state, &admin)
        .await?
        .data
        .expect("dashboard");
    assert_eq!(before.total_revenue, 90_000);

    order_service::update_order_status(
        state,
        &admin,
        verified,
        UpdateOrderStatusRequest {
            status: "CANCELLED".into(),
        },
    )
    .await?;
    let after = report_service::dashboard(state, &admin)
        .await?
        .data
        .expect("dashboard");
    assert_eq!(after.total_revenue, 0);
    assert_eq!(after.pending_payments, 0);
    Ok(())
}

#[tokio::test]
async fn customers_cannot_cancel_after_a_proof_was_rejected() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let admin = common::create_user(state, UserRole::Admin, "admin@example.com").await?;
    let customer = common::create_user(state, UserRole::Customer, "tono@example.com").await?;
    let category = common::create_category(state, "Camilan").await?;
    let emping = common::create_product(state, &category, "Emping Melinjo", 25_000, 4).await?;

    let order_id = place_order(state, &customer, emping.id, 1).await?;
    pay(state, &customer, order_id).await?;
    payment_service::reject_payment(
        state,
        &admin,
        order_id,
        RejectPaymentRequest {
            reason: "Bukti buram".into(),
        },
    )
    .await?;

    let err = order_service::cancel_order(state, &customer, order_id)
        .await
        .expect_err("rejected payment");
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(stock_of(state, emping.id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn last_unit_goes_to_exactly_one_of_two_concurrent_checkouts() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    common::create_user(state, UserRole::Admin, "admin@example.com").await?;
    let first = common::create_user(state, UserRole::Customer, "first@example.com").await?;
    let second = common::create_user(state, UserRole::Customer, "second@example.com").await?;
    let category = common::create_category(state, "Kerajinan").await?;
    let wayang = common::create_product(state, &category, "Wayang Kulit", 500_000, 1).await?;

    add(state, &first, wayang.id, 1).await?;
    add(state, &second, wayang.id, 1).await?;

    let (a, b) = tokio::join!(
        order_service::checkout(state, &first, shipping()),
        order_service::checkout(state, &second, shipping()),
    );
    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1, "{outcomes:?}");
    let err = a.err().or(b.err()).expect("one checkout fails");
    match err {
        AppError::BadRequest(msg) => assert!(msg.contains("Wayang Kulit"), "{msg}"),
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(stock_of(state, wayang.id).await?, 0);
    assert_eq!(Orders::find().count(&state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn taken_order_numbers_are_retried_with_a_new_id() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let customer = common::create_user(state, UserRole::Customer, "lina@example.com").await?;
    let at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).single().expect("date");
    let draft = OrderDraft {
        user_id: customer.user_id,
        total_amount: 10_000,
        shipping_name: "Lina".into(),
        shipping_phone: "0812".into(),
        shipping_address: "Jl. Malioboro 1".into(),
        notes: None,
    };
    let taken = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000001")?;
    let clash = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000002")?;
    let fresh = Uuid::parse_str("5e6f7a8b-0000-4000-8000-000000000003")?;

    let txn = state.orm.begin().await?;
    let existing = order_service::insert_order(&txn, &draft, at, || taken).await?;
    assert_eq!(existing.order_number, "ORD-20261017-1A2B3C4D");

    let mut ids = [clash, fresh].into_iter();
    let placed = order_service::insert_order(&txn, &draft, at, || {
        ids.next().unwrap_or_else(Uuid::new_v4)
    })
    .await?;
    assert_eq!(placed.id, fresh);
    assert_eq!(placed.order_number, "ORD-20261017-5E6F7A8B");
    txn.commit().await?;

    assert_eq!(Orders::find().count(&state.orm).await?, 2);
    Ok(())
}

#[tokio::test]
async fn cart_rules_hold_against_the_database() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let owner = common::create_user(state, UserRole::Customer, "owner@example.com").await?;
    let other = common::create_user(state, UserRole::Customer, "other@example.com").await?;
    let category = common::create_category(state, "Minuman").await?;
    let teh = common::create_product(state, &category, "Teh Tubruk", 12_000, 3).await?;
    let sirup = common::create_product(state, &category, "Sirup Kawista", 30_000, 10).await?;

    Products::update_many()
        .col_expr(ProdCol::IsActive, Expr::value(false))
        .filter(ProdCol::Id.eq(sirup.id))
        .exec(&state.orm)
        .await?;
    let inactive = cart_service::add_to_cart(
        state,
        &owner,
        AddToCartRequest {
            product_id: sirup.id,
            quantity: 1,
        },
    )
    .await
    .expect_err("inactive product");
    assert!(matches!(inactive, AppError::BadRequest(_)));

    let item = cart_service::add_to_cart(
        state,
        &owner,
        AddToCartRequest {
            product_id: teh.id,
            quantity: 1,
        },
    )
    .await?
    .data
    .expect("item");

    let over = cart_service::update_cart_item(state, &owner, item.id, UpdateCartItemRequest { quantity: 4 })
        .await
        .expect_err("over stock");
    assert!(matches!(over, AppError::BadRequest(_)));

    let foreign =
        cart_service::update_cart_item(state, &other, item.id, UpdateCartItemRequest { quantity: 2 })
            .await
            .expect_err("not the owner");
    assert!(matches!(foreign, AppError::NotFound));

    let untouched = cart_service::remove_cart_item(state, &other, item.id)
        .await?
        .data
        .expect("removed");
    assert_eq!(untouched["removed"], 0);
    assert!(CartItems::find_by_id(item.id).one(&state.orm).await?.is_some());

    let removed = cart_service::remove_cart_item(state, &owner, item.id)
        .await?
        .data
        .expect("removed");
    assert_eq!(removed["removed"], 1);
    let again = cart_service::remove_cart_item(state, &owner, item.id)
        .await?
        .data
        .expect("removed");
    assert_eq!(again["removed"], 0);
    Ok(())
}

#[tokio::test]
async fn search_matches_wildcard_characters_literally() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let admin = common::create_user(state, UserRole::Admin, "admin@example.com").await?;
    common::create_user(state, UserRole::Customer, "budi_santoso@example.com").await?;
    common::create_user(state, UserRole::Customer, "budiman@example.com").await?;
    let category = common::create_category(state, "Makanan Khas").await?;
    common::create_product(state, &category, "Bakpia", 10_000, 5).await?;
    common::create_product(state, &category, "Dodol", 5_000, 3).await?;
    common::create_product(state, &category, "Kopi 100% Arabika", 80_000, 3).await?;

    let search = |q: &str| ProductQuery {
        q: Some(q.to_string()),
        ..Default::default()
    };
    let underscore = product_service::list_products(state, search("_"))
        .await?
        .data
        .expect("list");
    assert!(underscore.items.is_empty());

    let percent = product_service::list_products(state, search("100%"))
        .await?
        .data
        .expect("list");
    assert_eq!(percent.items.len(), 1);
    assert_eq!(percent.items[0].name, "Kopi 100% Arabika");

    let users = user_service::list_users(
        state,
        &admin,
        UserListQuery {
            q: Some("budi_".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("users");
    assert_eq!(users.items.len(), 1);
    assert_eq!(users.items[0].email, "budi_santoso@example.com");
    Ok(())
}

#[tokio::test]
async fn product_image_urls_are_stored_trimmed() -> anyhow::Result<()> {
    let Some(db) = common::setup().await? else {
        return Ok(());
    };
    let state = &db.state;
    let admin = common::create_user(state, UserRole::Admin, "admin@example.com").await?;
    let category = common::create_category(state, "Kerajinan").await?;

    let product = product_service::create_product(
        state,
        &admin,
        CreateProductRequest {
            category_id: category.id,
            name: "Tas Anyaman".into(),
            description: None,
            price: 150_000,
            stock: 4,
            weight: 400,
            is_active: None,
            images: vec!["  /uploads/tas.png  ".into()],
        },
    )
    .await?
    .data
    .expect("product");

    let stored: Vec<String> = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|image| image.url)
        .collect();
    assert_eq!(stored, vec!["/uploads/tas.png".to_string()]);
    Ok(())
}
