//! Data models
//!
//! Read replicas of the entities owned by the backend API.
//! JSON fields are camelCase, enum values snake_case. All IDs are `i64`.

pub mod dining_table;
pub mod order;
pub mod reservation;
pub mod user;

// Re-exports
pub use dining_table::*;
pub use order::*;
pub use reservation::*;
pub use user::*;
