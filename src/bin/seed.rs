use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use toko_oleh_oleh::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        bank_accounts::{ActiveModel as BankAccountActive, Entity as BankAccounts},
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        settings::{ActiveModel as SettingActive, Column as SettingCol, Entity as Settings},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    models::UserRole,
    services::auth_service::hash_password,
    slug::slugify,
};

struct SeedProduct {
    category: &'static str,
    name: &'static str,
    description: &'static str,
    price: i64,
    stock: i32,
    weight: i32,
}

const CATEGORIES: &[(&str, &str)] = &[
    ("Makanan Khas", "Bakpia, dodol, pempek dan makanan khas daerah"),
    ("Keripik & Camilan", "Keripik dan camilan renyah"),
    ("Kerajinan", "Batik, anyaman dan kerajinan tangan"),
    ("Minuman", "Kopi dan minuman tradisional"),
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        category: "Makanan Khas",
        name: "Bakpia Pathok Kacang Hijau",
        description: "Bakpia isi kacang hijau khas Yogyakarta, isi 20",
        price: 35_000,
        stock: 50,
        weight: 500,
    },
    SeedProduct {
        category: "Makanan Khas",
        name: "Dodol Garut",
        description: "Dodol ketan legit dari Garut",
        price: 25_000,
        stock: 40,
        weight: 400,
    },
    SeedProduct {
        category: "Keripik & Camilan",
        name: "Keripik Balado",
        description: "Keripik singkong balado khas Padang",
        price: 30_000,
        stock: 60,
        weight: 250,
    },
    SeedProduct {
        category: "Kerajinan",
        name: "Kain Batik Tulis",
        description: "Kain batik tulis motif parang",
        price: 350_000,
        stock: 8,
        weight: 300,
    },
    SeedProduct {
        category: "Minuman",
        name: "Kopi Gayo Bubuk",
        description: "Kopi arabika Gayo sangrai sedang, 250 gram",
        price: 75_000,
        stock: 3,
        weight: 250,
    },
];

const SETTINGS: &[(&str, &str)] = &[
    ("store_name", "Toko Oleh-Oleh Nusantara"),
    ("store_address", "Jl. Malioboro No. 1, Yogyakarta"),
    ("store_phone", "081234567890"),
    ("whatsapp_number", "6281234567890"),
    ("store_email", "halo@toko-oleh-oleh.test"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,toko_oleh_oleh=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "Admin Toko", "admin@example.com", "admin123", UserRole::Admin).await?;
    let customer_id =
        ensure_user(&orm, "Budi Santoso", "budi@example.com", "budi123", UserRole::Customer).await?;
    seed_catalog(&orm).await?;
    seed_bank_account(&orm).await?;
    seed_settings(&orm).await?;

    tracing::info!(%admin_id, %customer_id, "seed completed");
    Ok(())
}

async fn ensure_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: UserRole,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(db)
        .await?
    {
        tracing::info!(%email, "user already present");
        return Ok(existing.id);
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        role: Set(role.to_string()),
        phone: Set(None),
        address: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(db)
    .await?;
    tracing::info!(%email, %role, "user created");
    Ok(user.id)
}

async fn seed_catalog(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (name, description) in CATEGORIES {
        let slug = slugify(name);
        let exists = Categories::find()
            .filter(CategoryCol::Slug.eq(&slug))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        CategoryActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug),
            description: Set(Some(description.to_string())),
            image_url: Set(None),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(db)
        .await?;
    }

    for product in PRODUCTS {
        let slug = slugify(product.name);
        let exists = Products::find()
            .filter(ProdCol::Slug.eq(&slug))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        let category = Categories::find()
            .filter(CategoryCol::Slug.eq(slugify(product.category)))
            .one(db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("category {} missing", product.category))?;

        ProductActive {
            id: Set(Uuid::new_v4()),
            category_id: Set(category.id),
            name: Set(product.name.to_string()),
            slug: Set(slug),
            description: Set(Some(product.description.to_string())),
            price: Set(product.price),
            stock: Set(product.stock),
            weight: Set(product.weight),
            is_active: Set(true),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(db)
        .await?;
        tracing::info!(name = product.name, "product seeded");
    }
    Ok(())
}

async fn seed_bank_account(db: &DatabaseConnection) -> anyhow::Result<()> {
    if BankAccounts::find().count(db).await? > 0 {
        return Ok(());
    }
    BankAccountActive {
        id: Set(Uuid::new_v4()),
        bank_name: Set("BCA".into()),
        account_number: Set("1234567890".into()),
        account_name: Set("Toko Oleh-Oleh Nusantara".into()),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Existing values are left alone so re-seeding never overwrites admin edits.
async fn seed_settings(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (key, value) in SETTINGS {
        Settings::insert(SettingActive {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: NotSet,
        })
        .on_conflict(OnConflict::column(SettingCol::Key).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    }
    Ok(())
}
