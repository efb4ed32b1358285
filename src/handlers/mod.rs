pub mod auth;
pub mod booking;
pub mod homestay;
pub mod user;

pub use auth::*;
