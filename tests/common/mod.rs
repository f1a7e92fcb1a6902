#![allow(dead_code)]

use std::sync::LazyLock;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use toko_oleh_oleh::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{ActiveModel as CategoryActive, Model as CategoryModel},
        products::{ActiveModel as ProductActive, Model as ProductModel},
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    models::UserRole,
    services::auth_service::hash_password,
    state::AppState,
};

// Every test truncates the shared database, so they take turns.
static DB_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub struct TestDb {
    pub state: AppState,
    _guard: MutexGuard<'static, ()>,
}

pub fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

pub fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        upload_dir: std::env::temp_dir()
            .join("toko-oleh-oleh-test-uploads")
            .to_string_lossy()
            .into_owned(),
        cors_origins: Vec::new(),
        cloudinary: None,
    }
}

/// Connects, migrates and empties every table. `None` when no database is
/// configured, in which case the caller should return early.
pub async fn setup() -> anyhow::Result<Option<TestDb>> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
        return Ok(None);
    };
    let guard = DB_LOCK.lock().await;

    let orm = create_orm_conn(&url).await?;
    run_migrations(&orm).await?;
    orm.execute(Statement::from_string(
        orm.get_database_backend(),
        "TRUNCATE page_visits, visitors, notifications, order_items, orders, cart_items, \
         product_images, products, categories, bank_accounts, settings, contacts, hero_slides, \
         users CASCADE",
    ))
    .await?;

    Ok(Some(TestDb {
        state: AppState::new(orm, test_config(url)),
        _guard: guard,
    }))
}

pub async fn create_user(state: &AppState, role: UserRole, email: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password("secret123")?),
        role: Set(role.to_string()),
        phone: Set(None),
        address: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_category(state: &AppState, name: &str) -> anyhow::Result<CategoryModel> {
    Ok(CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(toko_oleh_oleh::slug::slugify(name)),
        description: Set(None),
        image_url: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}

pub async fn create_product(
    state: &AppState,
    category: &CategoryModel,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<ProductModel> {
    Ok(ProductActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(category.id),
        name: Set(name.to_string()),
        slug: Set(toko_oleh_oleh::slug::slugify(name)),
        description: Set(None),
        price: Set(price),
        stock: Set(stock),
        weight: Set(250),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}
