pub mod auth;
pub mod booking;
pub mod email;
pub mod homestay;
pub mod user;
