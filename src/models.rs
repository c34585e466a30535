use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::entity::{coupons::CouponStatus, orders::OrderStatus};

use crate::entity::{
    coupons::Model as CouponModel, orders::Model as OrderModel,
    screenings::Model as ScreeningModel, users::Model as UserModel,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub money: i64,
    pub has_pay_password: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            money: model.money,
            has_pay_password: model.pay_password_hash.is_some(),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Screening {
    pub id: Uuid,
    pub movie_title: String,
    pub start_time: DateTime<Utc>,
    pub unit_price: i64,
    pub seat_capacity: i32,
}

impl From<ScreeningModel> for Screening {
    fn from(model: ScreeningModel) -> Self {
        Self {
            id: model.id,
            movie_title: model.movie_title,
            start_time: model.start_time.with_timezone(&Utc),
            unit_price: model.unit_price,
            seat_capacity: model.seat_capacity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub screening_id: Uuid,
    pub user_id: Uuid,
    /// Seat numbers in ascending order.
    pub seats: Vec<i32>,
    pub status: OrderStatus,
    pub total_price: Option<i64>,
    pub pay_price: Option<i64>,
    pub coupon_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn from_entity(model: OrderModel, mut seats: Vec<i32>) -> Self {
        seats.sort_unstable();
        Self {
            id: model.id,
            screening_id: model.screening_id,
            user_id: model.user_id,
            seats,
            status: model.status,
            total_price: model.total_price,
            pay_price: model.pay_price,
            coupon_id: model.coupon_id,
            created_at: model.created_at.with_timezone(&Utc),
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Coupon {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: CouponStatus,
    pub condition_amount: i64,
    pub discount_amount: i64,
    pub expired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<CouponModel> for Coupon {
    fn from(model: CouponModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            condition_amount: model.condition_amount,
            discount_amount: model.discount_amount,
            expired_at: model.expired_at.with_timezone(&Utc),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
