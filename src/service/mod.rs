pub mod auth;
pub mod car;
pub mod fee;
pub mod parking;
pub mod payment;
pub mod slot;
