use campus_market_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    models::{Role, VerificationStatus},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "Admin", "admin@example.com", "admin12345", Role::Admin).await?;
    let buyer_id = ensure_user(&pool, "Budi", "buyer@example.com", "buyer12345", Role::Buyer).await?;
    let seller_id =
        ensure_user(&pool, "Sari", "seller@example.com", "seller12345", Role::Seller).await?;
    ensure_toko(&pool, seller_id, "Toko Sari").await?;
    seed_catalog(&pool, seller_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Buyer ID: {buyer_id}, Seller ID: {seller_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, status_verifikasi)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT ((lower(email))) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(VerificationStatus::Verified.as_str())
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE lower(email) = lower($1)")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_toko(pool: &sqlx::PgPool, seller_id: Uuid, name: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tokos (id, seller_id, name, description, address)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (seller_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(seller_id)
    .bind(name)
    .bind("Perlengkapan kuliah dan jajanan kampus")
    .bind("Gedung Student Center, Lt. 1")
    .execute(pool)
    .await?;
    Ok(())
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str, description: &str) -> anyhow::Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO categories (id, name, description)
        VALUES ($1, $2, $3)
        ON CONFLICT ((lower(name))) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .execute(pool)
    .await?;

    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM categories WHERE lower(name) = lower($1)")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn seed_catalog(pool: &sqlx::PgPool, seller_id: Uuid) -> anyhow::Result<()> {
    let books = ensure_category(pool, "Buku", "Buku teks dan modul kuliah").await?;
    let stationery = ensure_category(pool, "Alat Tulis", "Perlengkapan menulis").await?;
    let food = ensure_category(pool, "Makanan", "Jajanan dan makanan ringan").await?;

    let products = vec![
        (books, "Kalkulus Jilid 1", "Buku bekas kondisi baik", 85_000_i64, 5),
        (books, "Modul Basis Data", "Modul praktikum semester 3", 30_000, 20),
        (stationery, "Pulpen Gel Hitam", "Isi 12 pcs", 24_000, 50),
        (stationery, "Kalkulator Scientific", "Cocok untuk ujian", 150_000, 8),
        (food, "Keripik Singkong", "Pedas level 3, 250 gram", 15_000, 40),
    ];

    for (category_id, name, description, price, stock) in products {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE seller_id = $1 AND name = $2")
                .bind(seller_id)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, category_id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(category_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories and products");
    Ok(())
}
