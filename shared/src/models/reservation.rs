//! Reservation Model

use serde::{Deserialize, Serialize};

use crate::types::{Instant, ReservationId, TableId};

/// Reservation status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// 已确认，客人未到
    Confirmed,
    /// 客人已入座
    Seated,
    Cancelled,
    Completed,
    #[serde(other)]
    Unknown,
}

impl ReservationStatus {
    /// Confirmed or seated: the reservation still holds its table
    pub fn is_live(self) -> bool {
        matches!(self, ReservationStatus::Confirmed | ReservationStatus::Seated)
    }

    /// confirmed → seated → completed, confirmed → cancelled.
    ///
    /// `completed → completed` is accepted so that repeated completion
    /// requests stay harmless.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Confirmed, Seated)
                | (Confirmed, Cancelled)
                | (Seated, Completed)
                | (Completed, Completed)
        )
    }
}

/// Reservation entity (read replica)
///
/// Invariant upheld by the backend: `reserved_from < reserved_to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub table_id: TableId,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    pub guest_count: i32,
    pub reserved_from: Instant,
    pub reserved_to: Instant,
    pub status: ReservationStatus,
}

impl Reservation {
    /// Window `[reserved_from, reserved_to]` contains `now` (both ends inclusive)
    pub fn covers(&self, now: Instant) -> bool {
        self.reserved_from <= now && now <= self.reserved_to
    }

    /// Live and covering `now`
    pub fn is_current(&self, now: Instant) -> bool {
        self.status.is_live() && self.covers(now)
    }

    /// Seated guest whose window has already ended
    pub fn is_expired_seating(&self, now: Instant) -> bool {
        self.status == ReservationStatus::Seated && self.reserved_to < now
    }
}

/// Create reservation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCreate {
    pub table_id: TableId,
    pub customer_name: String,
    pub customer_phone: String,
    pub guest_count: i32,
    pub reserved_from: Instant,
    pub reserved_to: Instant,
}

/// Update reservation payload (`PUT /reservations/:id`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<TableId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_from: Option<Instant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_to: Option<Instant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>,
}

impl ReservationUpdate {
    /// Status-only update, e.g. `{"status":"completed"}`
    pub fn status(status: ReservationStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// `GET /reservations/available` query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub table_id: TableId,
    pub reserved_from: Instant,
    pub reserved_to: Instant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_reservation_id: Option<ReservationId>,
}

/// `GET /reservations/available` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}
