#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::Utc;
use cinema_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{CreateOrderRequest, PayOrderRequest},
    entity::{
        coupons::{ActiveModel as CouponActive, CouponStatus, Entity as Coupons, Model as CouponModel},
        screenings::ActiveModel as ScreeningActive,
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult, BookingError},
    middleware::auth::AuthUser,
    random::RandomSource,
    scheduler::ExpiryScheduler,
    services::auth_service::hash_secret,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

pub const PAY_PASSWORD: &str = "pay-123456";

/// Connects to the test database, or returns `None` when none is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 10).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let config = AppConfig {
        database_url,
        jwt_secret: "test-secret".into(),
        host: "127.0.0.1".into(),
        port: 0,
        db_max_connections: 10,
        pending_order_ttl: Duration::from_secs(600),
        expiry_sweep_interval: Duration::from_secs(60),
        tx_retry_limit: 5,
    };

    // Tests never rely on real timers unless they install one themselves.
    let state = AppState::new(pool, orm, config)
        .with_expiry_scheduler(Arc::new(RecordingScheduler::default()))
        .with_random_source(Arc::new(ScriptedRandom::new([])));
    Ok(Some(state))
}

/// Remembers scheduled order ids instead of starting timers.
#[derive(Default)]
pub struct RecordingScheduler {
    pub scheduled: Mutex<Vec<Uuid>>,
}

impl ExpiryScheduler for RecordingScheduler {
    fn schedule(&self, order_id: Uuid) {
        self.scheduled
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(order_id);
    }
}

/// Replays the given draws, then always answers the lowest value, which
/// never earns a coupon.
pub struct ScriptedRandom {
    draws: Mutex<VecDeque<i64>>,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = i64>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&self, low: i64, high: i64) -> i64 {
        let next = self
            .draws
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        next.unwrap_or(low).clamp(low, high)
    }
}

pub fn auth(user_id: Uuid) -> AuthUser {
    AuthUser { user_id }
}

pub async fn create_user(state: &AppState, money: i64) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        email: Set(format!("{id}@example.com")),
        password_hash: Set(hash_secret("login-password")?),
        pay_password_hash: Set(Some(hash_secret(PAY_PASSWORD)?)),
        money: Set(money),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

pub async fn create_screening(
    state: &AppState,
    unit_price: i64,
    seat_capacity: i32,
    starts_in: chrono::Duration,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    ScreeningActive {
        id: Set(id),
        movie_title: Set("Test Screening".into()),
        start_time: Set((now + starts_in).into()),
        unit_price: Set(unit_price),
        seat_capacity: Set(seat_capacity),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

pub async fn create_coupon(
    state: &AppState,
    user_id: Uuid,
    condition_amount: i64,
    discount_amount: i64,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    CouponActive {
        id: Set(id),
        user_id: Set(user_id),
        status: Set(CouponStatus::Unused),
        condition_amount: Set(condition_amount),
        discount_amount: Set(discount_amount),
        expired_at: Set((now + chrono::Duration::days(7)).into()),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

pub async fn money_of(state: &AppState, user_id: Uuid) -> anyhow::Result<i64> {
    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {user_id} missing"))?;
    Ok(user.money)
}

pub async fn coupon(state: &AppState, id: Uuid) -> anyhow::Result<CouponModel> {
    Coupons::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("coupon {id} missing"))
}

pub fn order_request(screening_id: Uuid, seat: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        screening_id,
        seat: seat.into(),
    }
}

pub fn pay_request(coupon_id: Option<Uuid>) -> PayOrderRequest {
    PayOrderRequest {
        coupon_id,
        pay_password: PAY_PASSWORD.into(),
    }
}

/// Unwraps the business error of a failed call.
pub fn booking_error<T: std::fmt::Debug>(result: AppResult<T>) -> BookingError {
    match result {
        Err(AppError::Booking(err)) => err,
        other => panic!("expected a booking error, got {other:?}"),
    }
}
