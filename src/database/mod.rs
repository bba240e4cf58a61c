pub mod manager;
pub mod migrations;
pub mod models;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::profile::Profile;
