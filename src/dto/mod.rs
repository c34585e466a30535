pub mod auth;
pub mod coupons;
pub mod orders;
pub mod screenings;
