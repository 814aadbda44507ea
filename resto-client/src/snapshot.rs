//! Floor snapshot: the client-side read replica of tables, orders and reservations

use shared::availability::{self, FloorSummary, TableView};
use shared::models::{DiningTable, Order, Reservation};
use shared::types::Instant;
use shared::ReservationId;

use crate::ClientResult;
use crate::http::FloorApi;

/// Shown when none of the three collections could be loaded
pub const LOAD_FAILED_WARNING: &str = "Could not load tables, orders or reservations";

/// One consistent read of the floor. Never mutated after loading.
#[derive(Debug, Clone, Default)]
pub struct FloorSnapshot {
    pub tables: Vec<DiningTable>,
    pub orders: Vec<Order>,
    pub reservations: Vec<Reservation>,
    pub loaded_at: Option<Instant>,
}

impl FloorSnapshot {
    pub fn board(&self, now: Instant) -> Vec<TableView> {
        availability::derive_board(&self.tables, &self.orders, &self.reservations, now)
    }

    pub fn summary(&self, now: Instant) -> FloorSummary {
        FloorSummary::from_board(&self.board(now))
    }

    pub fn expired_reservations(&self, now: Instant) -> Vec<ReservationId> {
        availability::select_expired(&self.reservations, now)
    }

    pub fn table(&self, id: shared::TableId) -> Option<&DiningTable> {
        self.tables.iter().find(|t| t.id == id)
    }
}

const COLLECTIONS: usize = 3;

fn degrade<T>(what: &str, result: ClientResult<Vec<T>>, failures: &mut usize) -> Vec<T> {
    result.unwrap_or_else(|e| {
        *failures += 1;
        tracing::warn!(collection = what, error = %e, "Failed to load collection, using empty list");
        Vec::new()
    })
}

/// Result of a snapshot load
#[derive(Debug, Clone)]
pub struct SnapshotLoad {
    pub snapshot: FloorSnapshot,
    /// Set only when every collection failed
    pub warning: Option<&'static str>,
}

/// Fetch the three collections concurrently.
///
/// Each failed collection degrades to empty; a warning is produced only if
/// all of them failed.
pub async fn load_snapshot<A: FloorApi + ?Sized>(api: &A, now: Instant) -> SnapshotLoad {
    let (tables, orders, reservations) = tokio::join!(
        api.fetch_tables(),
        api.fetch_active_orders(),
        api.fetch_reservations()
    );

    let mut failures = 0;
    let tables = degrade("tables", tables, &mut failures);
    let orders = degrade("orders", orders, &mut failures);
    let reservations = degrade("reservations", reservations, &mut failures);

    let warning = (failures == COLLECTIONS).then_some(LOAD_FAILED_WARNING);
    if warning.is_some() {
        tracing::error!("Snapshot load failed for every collection");
    } else {
        tracing::debug!(
            tables = tables.len(),
            orders = orders.len(),
            reservations = reservations.len(),
            "Snapshot loaded"
        );
    }

    SnapshotLoad {
        snapshot: FloorSnapshot {
            tables,
            orders,
            reservations,
            loaded_at: Some(now),
        },
        warning,
    }
}
