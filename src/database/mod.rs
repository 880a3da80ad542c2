pub mod car;
pub mod parking_record;
pub mod payment;
pub mod postgres_repository;
pub mod slot;
pub mod user;
