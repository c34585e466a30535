use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Coupon, Order};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub screening_id: Uuid,
    /// Comma separated seat numbers, e.g. `"3,4"`.
    pub seat: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayOrderRequest {
    pub coupon_id: Option<Uuid>,
    pub pay_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentReceipt {
    pub order: Order,
    /// Reward coupon drawn for this payment, if any.
    pub coupon: Option<Coupon>,
}
