use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
    sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    db::retry_on_conflict,
    dto::orders::{CreateOrderRequest, OrderList},
    entity::{
        order_seats::{ActiveModel as SeatActive, Column as SeatCol, Entity as OrderSeats},
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
            OrderStatus,
        },
    },
    error::{AppError, AppResult, BookingError},
    middleware::auth::AuthUser,
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        screening_service,
        seat_service::{self, SeatSelection},
    },
    state::AppState,
};

/// Name of the partial unique index allowing one pending order per user.
const PENDING_ORDER_INDEX: &str = "orders_one_pending_per_user";
const ORDER_SEATS_KEY: &str = "order_seats_pkey";

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = models.iter().map(|o| o.id).collect();
    let mut seats_by_order = seats_for_orders(&state.orm, &ids).await?;
    let orders = models
        .into_iter()
        .map(|model| {
            let seats = seats_by_order.remove(&model.id).unwrap_or_default();
            Order::from_entity(model, seats)
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = find_owned_order(&state.orm, user.user_id, id, false).await?;
    let seats = seats_of_order(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        Order::from_entity(order, seats),
        Some(Meta::empty()),
    ))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let screening_id = payload.screening_id;
    let raw_seats = payload.seat.as_str();
    let (order, seats) = retry_on_conflict(state.config.tx_retry_limit, || {
        place_order(state, user.user_id, screening_id, raw_seats)
    })
    .await?;

    state.expiry.schedule(order.id);
    tracing::info!(order_id = %order.id, user_id = %user.user_id, seats = ?seats.to_vec(), "order created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::OrderCreated,
        serde_json::json!({ "order_id": order.id, "screening_id": screening_id, "seats": seats.to_vec() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        Order::from_entity(order, seats.to_vec()),
        Some(Meta::empty()),
    ))
}

async fn place_order(
    state: &AppState,
    user_id: Uuid,
    screening_id: Uuid,
    raw_seats: &str,
) -> AppResult<(OrderModel, SeatSelection)> {
    let now = Utc::now();
    let txn = state.orm.begin().await?;

    let screening = screening_service::lock_screening(&txn, screening_id).await?;
    if now >= screening.start_time.with_timezone(&Utc) {
        return Err(BookingError::ScreeningAlreadyStarted.into());
    }

    let pending = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user_id))
                .add(OrderCol::Status.eq(OrderStatus::Pending)),
        )
        .one(&txn)
        .await?;
    if pending.is_some() {
        return Err(BookingError::UserHasPendingOrder.into());
    }

    let seats = seat_service::validate_seat_request(&screening, raw_seats)?;
    seat_service::check_availability(&txn, screening.id, &seats).await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        screening_id: Set(screening.id),
        user_id: Set(user_id),
        status: Set(OrderStatus::Pending),
        total_price: Set(None),
        pay_price: Set(None),
        coupon_id: Set(None),
        created_at: Set(now.into()),
        paid_at: Set(None),
    }
    .insert(&txn)
    .await
    .map_err(|err| constraint_violation(err, &seats))?;

    let rows = seats.iter().map(|seat| SeatActive {
        screening_id: Set(screening.id),
        seat: Set(seat),
        order_id: Set(order.id),
    });
    OrderSeats::insert_many(rows)
        .exec_without_returning(&txn)
        .await
        .map_err(|err| constraint_violation(err, &seats))?;

    txn.commit().await?;
    Ok((order, seats))
}

/// Unique-index hits that lost a race against a concurrent order are reported
/// as the business error they stand for.
fn constraint_violation(err: DbErr, seats: &SeatSelection) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains(PENDING_ORDER_INDEX) => {
            BookingError::UserHasPendingOrder.into()
        }
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains(ORDER_SEATS_KEY) => {
            BookingError::SeatsAlreadyReserved(seats.to_vec()).into()
        }
        _ => err.into(),
    }
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let order = find_owned_order(&txn, user.user_id, id, true).await?;
    if order.status == OrderStatus::Paid {
        return Err(BookingError::OrderAlreadyPaid.into());
    }

    Orders::delete_by_id(order.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, user_id = %user.user_id, "order cancelled");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::OrderCancelled,
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::message("Order cancelled"))
}

/// Deletes the order only if it is still pending. The status guard sits in
/// the DELETE itself, so a payment committing first always wins.
pub async fn expire_pending_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
    let result = Orders::delete_many()
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Deletes every pending order created before `cutoff`.
pub async fn sweep_expired_orders<C: ConnectionTrait>(
    conn: &C,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbErr> {
    let cutoff: sea_orm::prelude::DateTimeWithTimeZone = cutoff.into();
    let result = Orders::delete_many()
        .filter(OrderCol::Status.eq(OrderStatus::Pending))
        .filter(OrderCol::CreatedAt.lt(cutoff))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Ownership-scoped lookup; other users' orders look exactly like missing ones.
pub async fn find_owned_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
    for_update: bool,
) -> AppResult<OrderModel> {
    let mut finder = Orders::find().filter(
        Condition::all()
            .add(OrderCol::UserId.eq(user_id))
            .add(OrderCol::Id.eq(id)),
    );
    if for_update {
        finder = finder.lock(LockType::Update);
    }
    finder
        .one(conn)
        .await?
        .ok_or_else(|| BookingError::OrderNotFound.into())
}

pub async fn seats_of_order<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> Result<Vec<i32>, DbErr> {
    let rows = OrderSeats::find()
        .filter(SeatCol::OrderId.eq(order_id))
        .order_by_asc(SeatCol::Seat)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|row| row.seat).collect())
}

async fn seats_for_orders<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<i32>>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = OrderSeats::find()
        .filter(SeatCol::OrderId.is_in(ids.iter().copied()))
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<i32>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row.seat);
    }
    Ok(grouped)
}
