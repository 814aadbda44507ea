//! Common types for the shared crate
//!
//! Identifier aliases used across models and the client.

use chrono::{DateTime, Utc};

/// Dining table identifier
pub type TableId = i64;

/// Order identifier
pub type OrderId = i64;

/// Reservation identifier
pub type ReservationId = i64;

/// User identifier
pub type UserId = i64;

/// Point in time as exchanged with the API (always UTC)
pub type Instant = DateTime<Utc>;
