use std::collections::BTreeSet;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::screenings::SeatMap,
    entity::{
        order_seats::{Column as SeatCol, Entity as OrderSeats},
        screenings::Model as ScreeningModel,
    },
    error::{AppResult, BookingError},
    response::{ApiResponse, Meta},
    services::screening_service,
    state::AppState,
};

/// Upper bound on seats in a single order.
pub const MAX_SEATS_PER_ORDER: usize = 4;

/// A validated, duplicate-free seat set, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatSelection(BTreeSet<i32>);

impl SeatSelection {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.iter().collect()
    }
}

/// Parses a comma separated seat list against a hall of `capacity` seats.
pub fn parse_seat_selection(raw: &str, capacity: i32) -> Result<SeatSelection, BookingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BookingError::InvalidSeatSelection(
            "no seats selected".into(),
        ));
    }

    let mut seats = BTreeSet::new();
    for token in raw.split(',') {
        let token = token.trim();
        let seat: i32 = token.parse().map_err(|_| {
            BookingError::InvalidSeatSelection(format!("`{token}` is not a seat number"))
        })?;
        if seat < 1 || seat > capacity {
            return Err(BookingError::InvalidSeatSelection(format!(
                "seat {seat} is outside 1..={capacity}"
            )));
        }
        if !seats.insert(seat) {
            return Err(BookingError::InvalidSeatSelection(format!(
                "seat {seat} is selected more than once"
            )));
        }
    }

    if seats.len() > MAX_SEATS_PER_ORDER {
        return Err(BookingError::TooManySeats {
            max: MAX_SEATS_PER_ORDER,
        });
    }
    Ok(SeatSelection(seats))
}

pub fn validate_seat_request(
    screening: &ScreeningModel,
    raw: &str,
) -> Result<SeatSelection, BookingError> {
    parse_seat_selection(raw, screening.seat_capacity)
}

/// Requested seats that are already taken, ascending.
pub fn conflicting_seats(reserved: &BTreeSet<i32>, requested: &SeatSelection) -> Vec<i32> {
    requested.iter().filter(|s| reserved.contains(s)).collect()
}

/// Seats held by every persisted order of the screening. Cancelled and
/// expired orders are deleted, so everything left counts.
pub async fn reserved_seats<C: ConnectionTrait>(
    conn: &C,
    screening_id: Uuid,
) -> Result<BTreeSet<i32>, DbErr> {
    let rows = OrderSeats::find()
        .filter(SeatCol::ScreeningId.eq(screening_id))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|row| row.seat).collect())
}

/// Must run in the same transaction as the insert that claims the seats,
/// after the screening row has been locked.
pub async fn check_availability<C: ConnectionTrait>(
    conn: &C,
    screening_id: Uuid,
    requested: &SeatSelection,
) -> AppResult<()> {
    let reserved = reserved_seats(conn, screening_id).await?;
    let conflicts = conflicting_seats(&reserved, requested);
    if !conflicts.is_empty() {
        return Err(BookingError::SeatsAlreadyReserved(conflicts).into());
    }
    Ok(())
}

pub async fn get_seat_map(state: &AppState, screening_id: Uuid) -> AppResult<ApiResponse<SeatMap>> {
    let screening = screening_service::find_screening(&state.orm, screening_id).await?;
    let reserved: Vec<i32> = reserved_seats(&state.orm, screening.id)
        .await?
        .into_iter()
        .collect();
    let available = screening.seat_capacity - reserved.len() as i32;

    Ok(ApiResponse::success(
        "OK",
        SeatMap {
            screening: screening.into(),
            reserved,
            available,
        },
        Some(Meta::empty()),
    ))
}
