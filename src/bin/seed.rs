use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    services::auth_service::hash_password,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = orm.get_postgres_connection_pool();

    let admin_id = ensure_admin(pool, "admin", "admin123").await?;
    let user_id = ensure_user(pool, "user@example.com", "9876543210", "User@1234").await?;
    seed_catalogue(pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, username: &str, password: &str) -> anyhow::Result<i64> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO admins (username, password_hash)
        VALUES ($1, $2)
        ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured admin {username}");
    Ok(id)
}

/// Seeded shoppers skip otp verification so they can log in straight away.
async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    phone: &str,
    password: &str,
) -> anyhow::Result<i64> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (name, email, phone, password_hash, verified)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (email) DO UPDATE SET verified = TRUE
        RETURNING id
        "#,
    )
    .bind("Demo User")
    .bind(email)
    .bind(phone)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email}");
    Ok(id)
}

async fn seed_catalogue(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let catalogue = [
        (
            "Apparel",
            vec![
                ("Axum Hoodie", "Warm hoodie for Rustaceans", 550_000_i64, 50_i32),
                ("Crab T-Shirt", "Cotton tee with a crab print", 90_000, 120),
            ],
        ),
        (
            "Accessories",
            vec![
                ("Ferris Mug", "Coffee tastes better with Ferris", 120_000, 100),
                ("Rust Sticker Pack", "Decorate your laptop", 50_000, 200),
            ],
        ),
        (
            "Books",
            vec![("E-book: Async Rust", "Learn async Rust patterns", 250_000, 75)],
        ),
    ];

    for (category, products) in catalogue {
        let (category_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(category)
        .fetch_one(pool)
        .await?;

        for (name, desc, price, stock) in products {
            sqlx::query(
                r#"
                INSERT INTO products (category_id, name, description, price, stock)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(category_id)
            .bind(name)
            .bind(desc)
            .bind(price)
            .bind(stock)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded catalogue");
    Ok(())
}
