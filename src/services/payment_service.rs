use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set, TransactionTrait, sea_query::LockType};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    db::retry_on_conflict,
    dto::orders::{PayOrderRequest, PaymentReceipt},
    entity::{
        orders::{ActiveModel as OrderActive, OrderStatus},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult, BookingError},
    middleware::auth::AuthUser,
    models::Order,
    response::{ApiResponse, Meta},
    services::{auth_service, coupon_service, order_service, screening_service},
    state::AppState,
};

/// Amounts settled for one order, in integer currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub base_price: i64,
    pub final_price: i64,
}

/// `seats × unit_price`, minus the coupon discount, never below zero.
/// Amounts that do not fit in an `i64` are an internal fault.
pub fn settle_price(
    seat_count: usize,
    unit_price: i64,
    discount: Option<i64>,
) -> AppResult<Pricing> {
    let base_price = i64::try_from(seat_count)
        .ok()
        .and_then(|count| count.checked_mul(unit_price))
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "price overflow: {seat_count} seats at {unit_price}"
            ))
        })?;
    let final_price = match discount {
        Some(discount) => base_price.saturating_sub(discount).max(0),
        None => base_price,
    };
    Ok(Pricing {
        base_price,
        final_price,
    })
}

pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<PaymentReceipt>> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(BookingError::InvalidCredential)?;
    let credential_ok = match account.pay_password_hash.as_deref() {
        Some(hash) => auth_service::verify_secret(hash, &payload.pay_password),
        None => false,
    };
    if !credential_ok {
        return Err(BookingError::InvalidCredential.into());
    }

    let coupon_id = payload.coupon_id;
    let order = retry_on_conflict(state.config.tx_retry_limit, || {
        settle(state, user.user_id, id, coupon_id)
    })
    .await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total = ?order.total_price,
        paid = ?order.pay_price,
        coupon_id = ?order.coupon_id,
        "order paid"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::OrderPaid,
        serde_json::json!({
            "order_id": order.id,
            "pay_price": order.pay_price,
            "coupon_id": order.coupon_id,
        }),
    )
    .await;

    // The reward never decides whether the payment went through.
    let coupon = match coupon_service::maybe_issue_coupon(state, user.user_id).await {
        Ok(coupon) => coupon,
        Err(err) => {
            tracing::warn!(user_id = %user.user_id, error = %err, "reward coupon not issued");
            None
        }
    };

    Ok(ApiResponse::success(
        "Payment succeeded",
        PaymentReceipt { order, coupon },
        Some(Meta::empty()),
    ))
}

/// One settlement attempt. Row locks are always taken user, order, coupon.
async fn settle(
    state: &AppState,
    user_id: Uuid,
    order_id: Uuid,
    coupon_id: Option<Uuid>,
) -> AppResult<Order> {
    let txn = state.orm.begin().await?;

    let account = Users::find_by_id(user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(BookingError::InvalidCredential)?;

    let order = order_service::find_owned_order(&txn, user_id, order_id, true).await?;
    if order.status == OrderStatus::Paid {
        return Err(BookingError::OrderAlreadyPaid.into());
    }

    let screening = screening_service::find_screening(&txn, order.screening_id).await?;
    let seats = order_service::seats_of_order(&txn, order.id).await?;
    let base_price = settle_price(seats.len(), screening.unit_price, None)?.base_price;

    let coupon = match coupon_id {
        Some(coupon_id) => Some(
            coupon_service::validate_coupon_for_payment(&txn, user_id, coupon_id, base_price)
                .await?,
        ),
        None => None,
    };
    let pricing = settle_price(
        seats.len(),
        screening.unit_price,
        coupon.as_ref().map(|c| c.discount_amount),
    )?;

    if account.money < pricing.final_price {
        return Err(BookingError::InsufficientBalance.into());
    }

    let applied_coupon = match coupon {
        Some(coupon) => Some(coupon_service::consume_coupon(&txn, coupon).await?.id),
        None => None,
    };

    let balance = account.money - pricing.final_price;
    let mut account: UserActive = account.into();
    account.money = Set(balance);
    account.update(&txn).await?;

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Paid);
    active.total_price = Set(Some(pricing.base_price));
    active.pay_price = Set(Some(pricing.final_price));
    active.coupon_id = Set(applied_coupon);
    active.paid_at = Set(Some(Utc::now().into()));
    let order = active.update(&txn).await?;

    txn.commit().await?;
    Ok(Order::from_entity(order, seats))
}
