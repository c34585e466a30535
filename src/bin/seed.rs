use chrono::{Duration, Utc};
use cinema_booking_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    services::auth_service::hash_secret,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let pool = create_pool(&database_url, 2).await?;
    // Ensure migrations are applied.
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let alice = ensure_user(&pool, "alice@example.com", "alice123", "246810", 500).await?;
    let bob = ensure_user(&pool, "bob@example.com", "bob123", "135790", 95).await?;
    seed_screenings(&pool).await?;

    println!("Seed completed. Alice: {alice}, Bob: {bob}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    pay_password: &str,
    money: i64,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_secret(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let pay_password_hash =
        hash_secret(pay_password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    // Re-running the seed tops the balance back up.
    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, pay_password_hash, money)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET money = EXCLUDED.money
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(pay_password_hash)
    .bind(money)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (money={money})");
    Ok(user_id)
}

async fn seed_screenings(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM screenings")
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        println!("Screenings already present, skipping");
        return Ok(());
    }

    let now = Utc::now();
    let screenings = [
        ("Spirited Away", now + Duration::hours(3), 50_i64, 50_i32),
        ("Spirited Away", now + Duration::days(1), 45, 50),
        ("The Third Man", now + Duration::hours(6), 35, 24),
        ("Playtime", now + Duration::days(2), 40, 80),
    ];

    for (title, start_time, unit_price, capacity) in screenings {
        sqlx::query(
            r#"
            INSERT INTO screenings (id, movie_title, start_time, unit_price, seat_capacity)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(start_time)
        .bind(unit_price)
        .bind(capacity)
        .execute(pool)
        .await?;
    }

    println!("Seeded {} screenings", screenings.len());
    Ok(())
}
