use axum::{http::StatusCode, response::IntoResponse};
use chrono::Utc;
use cinema_booking_api::{
    entity::coupons::{CouponStatus, Model as CouponModel},
    error::{AppError, BookingError},
    random::{RandomSource, SeededRandom},
    services::{
        coupon_service::{PREMIUM_TIER, STANDARD_TIER, check_coupon_applicable, reward_for_draw},
        payment_service::settle_price,
    },
};
use uuid::Uuid;

fn coupon(status: CouponStatus, condition_amount: i64, discount_amount: i64) -> CouponModel {
    let now = Utc::now();
    CouponModel {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        status,
        condition_amount,
        discount_amount,
        expired_at: (now + chrono::Duration::days(7)).into(),
        created_at: now.into(),
    }
}

#[test]
fn base_price_is_seats_times_unit_price() -> anyhow::Result<()> {
    let pricing = settle_price(2, 50, None)?;
    assert_eq!(pricing.base_price, 100);
    assert_eq!(pricing.final_price, 100);
    Ok(())
}

#[test]
fn coupon_discount_is_subtracted() -> anyhow::Result<()> {
    let pricing = settle_price(2, 50, Some(5))?;
    assert_eq!(pricing.base_price, 100);
    assert_eq!(pricing.final_price, 95);
    Ok(())
}

#[test]
fn final_price_never_goes_negative() -> anyhow::Result<()> {
    let pricing = settle_price(1, 10, Some(12))?;
    assert_eq!(pricing.base_price, 10);
    assert_eq!(pricing.final_price, 0);

    assert_eq!(settle_price(3, 0, Some(5))?.final_price, 0);
    Ok(())
}

#[test]
fn oversized_prices_are_internal_faults() {
    let err = settle_price(2, i64::MAX, None).unwrap_err();
    assert!(matches!(err, AppError::Internal(_)), "got {err:?}");
    assert_eq!(
        err.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    // Discounts saturate before the zero floor.
    let pricing = settle_price(1, 10, Some(i64::MAX)).expect("fits");
    assert_eq!(pricing.final_price, 0);
}

#[test]
fn low_draws_earn_nothing() {
    for draw in 1..=6 {
        assert_eq!(reward_for_draw(draw), None, "draw {draw}");
    }
}

#[test]
fn high_draws_pick_tier_by_multiple_of_three() {
    assert_eq!(reward_for_draw(7), Some(STANDARD_TIER));
    assert_eq!(reward_for_draw(8), Some(STANDARD_TIER));
    assert_eq!(reward_for_draw(9), Some(PREMIUM_TIER));
    assert_eq!(reward_for_draw(10), Some(STANDARD_TIER));

    assert_eq!(STANDARD_TIER.condition_amount, 30);
    assert_eq!(STANDARD_TIER.discount_amount, 5);
    assert_eq!(PREMIUM_TIER.condition_amount, 50);
    assert_eq!(PREMIUM_TIER.discount_amount, 12);
}

#[test]
fn coupon_must_be_unused_and_reach_its_condition() {
    assert!(check_coupon_applicable(&coupon(CouponStatus::Unused, 30, 5), 30).is_ok());
    assert_eq!(
        check_coupon_applicable(&coupon(CouponStatus::Used, 30, 5), 100),
        Err(BookingError::CouponAlreadyUsed)
    );
    assert_eq!(
        check_coupon_applicable(&coupon(CouponStatus::Unused, 50, 12), 45),
        Err(BookingError::CouponConditionNotMet {
            condition: 50,
            price: 45
        })
    );
}

#[test]
fn expired_coupons_are_still_accepted() {
    let mut expired = coupon(CouponStatus::Unused, 30, 5);
    expired.expired_at = (Utc::now() - chrono::Duration::days(1)).into();
    assert!(check_coupon_applicable(&expired, 100).is_ok());
}

#[test]
fn seeded_random_is_reproducible_and_in_range() {
    let a = SeededRandom::new(42);
    let b = SeededRandom::new(42);
    for _ in 0..200 {
        let x = a.uniform(1, 10);
        assert_eq!(x, b.uniform(1, 10));
        assert!((1..=10).contains(&x));
    }
}

#[test]
fn business_errors_map_to_client_statuses() {
    let cases = [
        (BookingError::OrderNotFound, StatusCode::NOT_FOUND),
        (BookingError::ScreeningNotFound, StatusCode::NOT_FOUND),
        (BookingError::CouponNotFound, StatusCode::NOT_FOUND),
        (BookingError::OrderAlreadyPaid, StatusCode::CONFLICT),
        (BookingError::SeatsAlreadyReserved(vec![3]), StatusCode::CONFLICT),
        (BookingError::UserHasPendingOrder, StatusCode::CONFLICT),
        (BookingError::InsufficientBalance, StatusCode::BAD_REQUEST),
        (BookingError::InvalidCredential, StatusCode::BAD_REQUEST),
        (BookingError::TooManySeats { max: 4 }, StatusCode::BAD_REQUEST),
    ];
    for (err, status) in cases {
        let response = AppError::from(err.clone()).into_response();
        assert_eq!(response.status(), status, "{err:?}");
    }
}

#[test]
fn malformed_input_maps_to_400() {
    let response = AppError::BadRequest("Missing Authorization header".into()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn internal_faults_map_to_500() {
    let response = AppError::Internal(anyhow::anyhow!("connection reset")).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn reserved_seat_message_lists_the_seats() {
    let err = BookingError::SeatsAlreadyReserved(vec![4, 7]);
    assert_eq!(err.to_string(), "Seats 4, 7 are already reserved");
    assert_eq!(err.code(), "seats_already_reserved");
}
