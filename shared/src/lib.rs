//! Shared types for the restaurant floor client
//!
//! Wire models, response-envelope normalization, form validation and the
//! table availability engine. Nothing in here performs I/O.

pub mod availability;
pub mod client;
pub mod envelope;
pub mod models;
pub mod types;
pub mod util;
pub mod validation;

// Re-exports
pub use availability::{FloorSummary, TableStatus, TableView};
pub use types::{OrderId, ReservationId, TableId, UserId};
