//! Table availability engine
//!
//! Derives the display status of every dining table from the current
//! orders and reservations. All functions are pure: they read the snapshot
//! they are handed and never mutate it, so one pass over a snapshot is
//! always internally consistent.
//!
//! Priority (first match wins):
//!
//! | # | Condition                                                   | Status         |
//! |---|-------------------------------------------------------------|----------------|
//! | 1 | active order on the table                                   | `Occupied`     |
//! | 2 | seated reservation covering `now`                           | `Occupied`     |
//! | 3 | confirmed reservation covering `now`                        | `Reserved`     |
//! | 4 | live reservation starting within 30 min, not yet ended      | `ReservedSoon` |
//! | 5 | otherwise                                                   | `Free`         |

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::{DiningTable, Order, Reservation, ReservationStatus};
use crate::types::{Instant, ReservationId};

/// How far ahead an upcoming reservation marks its table as reserved soon
pub const RESERVED_SOON_LOOKAHEAD_MINUTES: i64 = 30;

/// Derived occupancy of a table (never persisted)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Free,
    ReservedSoon,
    Reserved,
    Occupied,
}

impl TableStatus {
    /// Whether a walk-in can be seated right now
    pub fn is_available(self) -> bool {
        matches!(self, TableStatus::Free | TableStatus::ReservedSoon)
    }
}

/// Classify one table.
pub fn derive_status(
    table: &DiningTable,
    orders: &[Order],
    reservations: &[Reservation],
    now: Instant,
) -> TableStatus {
    if orders.iter().any(|o| o.occupies(table.id)) {
        return TableStatus::Occupied;
    }

    let on_table = || reservations.iter().filter(move |r| r.table_id == table.id);

    if on_table().any(|r| r.status == ReservationStatus::Seated && r.covers(now)) {
        return TableStatus::Occupied;
    }

    if on_table().any(|r| r.status == ReservationStatus::Confirmed && r.covers(now)) {
        return TableStatus::Reserved;
    }

    let horizon = now + Duration::minutes(RESERVED_SOON_LOOKAHEAD_MINUTES);
    if on_table().any(|r| r.status.is_live() && r.reserved_from <= horizon && r.reserved_to > now)
    {
        return TableStatus::ReservedSoon;
    }

    TableStatus::Free
}

/// No active order and no current reservation.
///
/// Defined through [`derive_status`] so the dashboard counts and the table
/// grid can never disagree: a table that is only reserved soon is free.
pub fn is_table_free(
    table: &DiningTable,
    orders: &[Order],
    reservations: &[Reservation],
    now: Instant,
) -> bool {
    derive_status(table, orders, reservations, now).is_available()
}

/// Seated reservations whose window has ended and should be completed.
pub fn select_expired(reservations: &[Reservation], now: Instant) -> Vec<ReservationId> {
    reservations
        .iter()
        .filter(|r| r.is_expired_seating(now))
        .map(|r| r.id)
        .collect()
}

/// One cell of the table grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub table: DiningTable,
    pub status: TableStatus,
}

/// Status of every table, in the order the tables were given.
pub fn derive_board(
    tables: &[DiningTable],
    orders: &[Order],
    reservations: &[Reservation],
    now: Instant,
) -> Vec<TableView> {
    tables
        .iter()
        .map(|table| TableView {
            table: table.clone(),
            status: derive_status(table, orders, reservations, now),
        })
        .collect()
}

/// Dashboard counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FloorSummary {
    pub total: usize,
    pub free: usize,
    pub reserved_soon: usize,
    pub reserved: usize,
    pub occupied: usize,
}

impl FloorSummary {
    pub fn from_board(board: &[TableView]) -> Self {
        board.iter().fold(Self::default(), |mut acc, view| {
            acc.total += 1;
            match view.status {
                TableStatus::Free => acc.free += 1,
                TableStatus::ReservedSoon => acc.reserved_soon += 1,
                TableStatus::Reserved => acc.reserved += 1,
                TableStatus::Occupied => acc.occupied += 1,
            }
            acc
        })
    }

    /// Tables counted as free on the dashboard (same rule as [`is_table_free`])
    pub fn available(&self) -> usize {
        self.free + self.reserved_soon
    }
}
