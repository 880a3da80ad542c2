pub mod car;
pub mod error;
pub mod health;
pub mod parking;
pub mod payment;
pub mod slot;
pub mod user;
