use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Coupon;

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponList {
    pub items: Vec<Coupon>,
}
