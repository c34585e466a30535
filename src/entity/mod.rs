pub mod coupons;
pub mod order_seats;
pub mod orders;
pub mod screenings;
pub mod users;

pub use coupons::Entity as Coupons;
pub use order_seats::Entity as OrderSeats;
pub use orders::Entity as Orders;
pub use screenings::Entity as Screenings;
pub use users::Entity as Users;
