pub mod car;
pub mod health;
pub mod parking_record;
pub mod payment;
pub mod slot;
pub mod user;
