pub mod auth_service;
pub mod coupon_service;
pub mod order_service;
pub mod payment_service;
pub mod screening_service;
pub mod seat_service;
