//! Persistence layer

pub mod postgres;

pub use postgres::Database;
