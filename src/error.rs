use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

/// Business-rule failures. Always recoverable, always reported to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Screening not found")]
    ScreeningNotFound,

    #[error("Screening has already started")]
    ScreeningAlreadyStarted,

    #[error("You still have an unpaid order")]
    UserHasPendingOrder,

    #[error("Invalid seat selection: {0}")]
    InvalidSeatSelection(String),

    #[error("At most {max} seats can be bought at once")]
    TooManySeats { max: usize },

    #[error("Seats {} are already reserved", join_seats(.0))]
    SeatsAlreadyReserved(Vec<i32>),

    #[error("Order not found")]
    OrderNotFound,

    #[error("Order has already been paid")]
    OrderAlreadyPaid,

    #[error("Invalid payment password")]
    InvalidCredential,

    #[error("Coupon not found")]
    CouponNotFound,

    #[error("Coupon has already been used")]
    CouponAlreadyUsed,

    #[error("Order total {price} does not reach the coupon minimum of {condition}")]
    CouponConditionNotMet { condition: i64, price: i64 },

    #[error("Insufficient balance")]
    InsufficientBalance,
}

impl BookingError {
    /// Stable identifier exposed to clients next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::ScreeningNotFound => "screening_not_found",
            BookingError::ScreeningAlreadyStarted => "screening_already_started",
            BookingError::UserHasPendingOrder => "user_has_pending_order",
            BookingError::InvalidSeatSelection(_) => "invalid_seat_selection",
            BookingError::TooManySeats { .. } => "too_many_seats",
            BookingError::SeatsAlreadyReserved(_) => "seats_already_reserved",
            BookingError::OrderNotFound => "order_not_found",
            BookingError::OrderAlreadyPaid => "order_already_paid",
            BookingError::InvalidCredential => "invalid_credential",
            BookingError::CouponNotFound => "coupon_not_found",
            BookingError::CouponAlreadyUsed => "coupon_already_used",
            BookingError::CouponConditionNotMet { .. } => "coupon_condition_not_met",
            BookingError::InsufficientBalance => "insufficient_balance",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BookingError::ScreeningNotFound
            | BookingError::OrderNotFound
            | BookingError::CouponNotFound => StatusCode::NOT_FOUND,
            BookingError::UserHasPendingOrder
            | BookingError::SeatsAlreadyReserved(_)
            | BookingError::OrderAlreadyPaid
            | BookingError::CouponAlreadyUsed => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

fn join_seats(seats: &[i32]) -> String {
    seats
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Booking(err) => (err.status(), err.code()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::DbError(err) => {
                tracing::error!(error = %err, "database failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
            AppError::OrmError(err) => {
                tracing::error!(error = %err, "orm failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        let message = self.to_string();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData {
                error: message,
                code,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
