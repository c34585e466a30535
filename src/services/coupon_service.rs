use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::coupons::CouponList,
    entity::coupons::{
        ActiveModel as CouponActive, Column as CouponCol, CouponStatus, Entity as Coupons,
        Model as CouponModel,
    },
    error::{AppResult, BookingError},
    middleware::auth::AuthUser,
    models::Coupon,
    response::{ApiResponse, Meta},
    routes::params::CouponListQuery,
    state::AppState,
};

/// Draws at or below this value earn nothing (60% of 1..=10).
const REWARD_THRESHOLD: i64 = 6;
const VALIDITY_DAYS: (i64, i64) = (7, 15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponTier {
    pub condition_amount: i64,
    pub discount_amount: i64,
}

pub const STANDARD_TIER: CouponTier = CouponTier {
    condition_amount: 30,
    discount_amount: 5,
};

pub const PREMIUM_TIER: CouponTier = CouponTier {
    condition_amount: 50,
    discount_amount: 12,
};

/// Maps a draw in `1..=10` to the coupon it earns.
pub fn reward_for_draw(draw: i64) -> Option<CouponTier> {
    if draw <= REWARD_THRESHOLD {
        None
    } else if draw % 3 == 0 {
        Some(PREMIUM_TIER)
    } else {
        Some(STANDARD_TIER)
    }
}

/// Expiry is deliberately not checked here; see DESIGN.md.
pub fn check_coupon_applicable(coupon: &CouponModel, price: i64) -> Result<(), BookingError> {
    if coupon.status == CouponStatus::Used {
        return Err(BookingError::CouponAlreadyUsed);
    }
    if price < coupon.condition_amount {
        return Err(BookingError::CouponConditionNotMet {
            condition: coupon.condition_amount,
            price,
        });
    }
    Ok(())
}

/// Ownership-scoped lookup that locks the coupon row until the payment
/// transaction ends, then checks it can discount `price`.
pub async fn validate_coupon_for_payment<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    coupon_id: Uuid,
    price: i64,
) -> AppResult<CouponModel> {
    let coupon = Coupons::find()
        .filter(
            Condition::all()
                .add(CouponCol::Id.eq(coupon_id))
                .add(CouponCol::UserId.eq(user_id)),
        )
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(BookingError::CouponNotFound)?;

    check_coupon_applicable(&coupon, price)?;
    Ok(coupon)
}

/// Marks a coupon locked by [`validate_coupon_for_payment`] as used.
pub async fn consume_coupon<C: ConnectionTrait>(
    conn: &C,
    coupon: CouponModel,
) -> AppResult<CouponModel> {
    let mut active: CouponActive = coupon.into();
    active.status = Set(CouponStatus::Used);
    Ok(active.update(conn).await?)
}

/// Reward step run after a successful payment.
pub async fn maybe_issue_coupon(state: &AppState, user_id: Uuid) -> AppResult<Option<Coupon>> {
    let draw = state.rng.uniform(1, 10);
    let Some(tier) = reward_for_draw(draw) else {
        tracing::debug!(%user_id, draw, "no coupon this time");
        return Ok(None);
    };

    let days = state.rng.uniform(VALIDITY_DAYS.0, VALIDITY_DAYS.1);
    let now = Utc::now();
    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        status: Set(CouponStatus::Unused),
        condition_amount: Set(tier.condition_amount),
        discount_amount: Set(tier.discount_amount),
        expired_at: Set((now + Duration::days(days)).into()),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(%user_id, coupon_id = %coupon.id, draw, "reward coupon issued");
    audit::record(
        &state.pool,
        Some(user_id),
        AuditAction::CouponIssued,
        serde_json::json!({
            "coupon_id": coupon.id,
            "condition": coupon.condition_amount,
            "discount": coupon.discount_amount,
        }),
    )
    .await;

    Ok(Some(coupon.into()))
}

pub async fn list_coupons(
    state: &AppState,
    user: &AuthUser,
    query: CouponListQuery,
) -> AppResult<ApiResponse<CouponList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(CouponCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(CouponCol::Status.eq(status));
    }

    let finder = Coupons::find()
        .filter(condition)
        .order_by_desc(CouponCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items: Vec<Coupon> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Coupon::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        CouponList { items },
        Some(Meta::new(page, limit, total)),
    ))
}
