//! Expiry tests live in their own binary: the sweep removes every stale
//! pending order in the database, not just the ones created here.

mod common;

use std::{sync::Arc, time::Duration as StdDuration};

use chrono::{Duration, Utc};
use cinema_booking_api::{
    entity::orders::{ActiveModel as OrderActive, Entity as Orders},
    error::BookingError,
    models::OrderStatus,
    scheduler::{ExpiryScheduler, TokioExpiryScheduler, spawn_expiry_sweeper},
    services::{order_service, payment_service},
};
use common::*;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

#[tokio::test]
async fn scheduled_expiry_deletes_unpaid_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let timer = Arc::new(TokioExpiryScheduler::new(
        state.pool.clone(),
        state.orm.clone(),
        StdDuration::from_millis(300),
    ));
    let state = state.with_expiry_scheduler(timer);
    let user = auth(create_user(&state, 0).await?);
    let screening = create_screening(&state, 50, 20, Duration::hours(2)).await?;

    let order = order_service::create_order(&state, &user, order_request(screening, "1,2"))
        .await?
        .data
        .expect("order");
    assert!(order_service::get_order(&state, &user, order.id).await.is_ok());

    tokio::time::sleep(StdDuration::from_millis(1_500)).await;

    let err = booking_error(order_service::get_order(&state, &user, order.id).await);
    assert_eq!(err, BookingError::OrderNotFound);
    // Seats and the pending slot are both free again.
    order_service::create_order(&state, &user, order_request(screening, "1,2")).await?;
    Ok(())
}

#[tokio::test]
async fn expiry_only_touches_pending_orders() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = auth(create_user(&state, 100).await?);
    let screening = create_screening(&state, 50, 20, Duration::hours(2)).await?;

    let order = order_service::create_order(&state, &user, order_request(screening, "3"))
        .await?
        .data
        .expect("order");
    payment_service::pay_order(&state, &user, order.id, pay_request(None)).await?;
    assert!(!order_service::expire_pending_order(&state.orm, order.id).await?);

    let pending = order_service::create_order(&state, &user, order_request(screening, "4"))
        .await?
        .data
        .expect("order");
    assert!(order_service::expire_pending_order(&state.orm, pending.id).await?);
    assert!(!order_service::expire_pending_order(&state.orm, pending.id).await?);

    let paid = order_service::get_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(paid.seats, vec![3]);
    Ok(())
}

#[tokio::test]
async fn sweep_removes_only_stale_pending_orders() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let stale_user = auth(create_user(&state, 0).await?);
    let fresh_user = auth(create_user(&state, 0).await?);
    let screening = create_screening(&state, 50, 20, Duration::hours(2)).await?;

    let stale = order_service::create_order(&state, &stale_user, order_request(screening, "1"))
        .await?
        .data
        .expect("order");
    let fresh = order_service::create_order(&state, &fresh_user, order_request(screening, "2"))
        .await?
        .data
        .expect("order");

    // Backdate one order past the payment window.
    let model = Orders::find_by_id(stale.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("order missing"))?;
    let mut active: OrderActive = model.into();
    active.created_at = Set((Utc::now() - Duration::minutes(30)).into());
    active.update(&state.orm).await?;

    let removed =
        order_service::sweep_expired_orders(&state.orm, Utc::now() - Duration::minutes(10))
            .await?;
    assert!(removed >= 1);

    let err = booking_error(order_service::get_order(&state, &stale_user, stale.id).await);
    assert_eq!(err, BookingError::OrderNotFound);
    assert!(order_service::get_order(&state, &fresh_user, fresh.id).await.is_ok());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn payment_racing_expiry_has_one_outcome() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    for _ in 0..5 {
        let user_id = create_user(&state, 100).await?;
        let user = auth(user_id);
        let screening = create_screening(&state, 50, 20, Duration::hours(2)).await?;
        let order = order_service::create_order(&state, &user, order_request(screening, "1"))
            .await?
            .data
            .expect("order");

        let expire = {
            let orm = state.orm.clone();
            let order_id = order.id;
            tokio::spawn(async move { order_service::expire_pending_order(&orm, order_id).await })
        };
        let pay = {
            let state = state.clone();
            let order_id = order.id;
            tokio::spawn(async move {
                payment_service::pay_order(&state, &auth(user_id), order_id, pay_request(None))
                    .await
            })
        };

        let expired = expire.await??;
        let paid = pay.await?;
        let balance = money_of(&state, user_id).await?;
        if expired {
            assert_eq!(booking_error(paid), BookingError::OrderNotFound);
            assert_eq!(balance, 100);
        } else {
            paid?;
            assert_eq!(balance, 50);
        }
    }
    Ok(())
}

#[tokio::test]
async fn recording_scheduler_sees_every_new_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let recorder = Arc::new(RecordingScheduler::default());
    let state = state.with_expiry_scheduler(recorder.clone() as Arc<dyn ExpiryScheduler>);
    let user = auth(create_user(&state, 0).await?);
    let screening = create_screening(&state, 50, 20, Duration::hours(2)).await?;

    let order = order_service::create_order(&state, &user, order_request(screening, "9"))
        .await?
        .data
        .expect("order");
    let _ = order_service::create_order(&state, &user, order_request(screening, "10")).await;

    let scheduled = recorder.scheduled.lock().expect("lock").clone();
    assert_eq!(scheduled, vec![order.id]);
    Ok(())
}

#[tokio::test]
async fn sweeper_survives_a_zero_interval() {
    // No database needed: failed sweeps are logged and the loop carries on.
    let sweeper = spawn_expiry_sweeper(
        sea_orm::DatabaseConnection::Disconnected,
        StdDuration::from_secs(600),
        StdDuration::ZERO,
    );
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    assert!(!sweeper.is_finished());
    sweeper.abort();
}
