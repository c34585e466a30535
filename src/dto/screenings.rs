use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Screening;

#[derive(Debug, Serialize, ToSchema)]
pub struct SeatMap {
    pub screening: Screening,
    /// Seats held by pending or paid orders, ascending.
    pub reserved: Vec<i32>,
    pub available: i32,
}
