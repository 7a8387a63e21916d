pub mod connection;
pub mod database;

pub use connection::init;
pub use database::{Database, RegistryStats};
