//! Order Model

use serde::{Deserialize, Serialize};

use crate::types::{Instant, OrderId, TableId};

/// Order status
///
/// Unrecognized values decode to [`OrderStatus::Unknown`], which never
/// occupies a table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    InProgress,
    Ready,
    Payment,
    Closed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Statuses that occupy the order's table
    pub const ACTIVE: [OrderStatus; 4] = [
        OrderStatus::Open,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Payment,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Wire value, as used in `?status=` filters
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Ready => "ready",
            OrderStatus::Payment => "payment",
            OrderStatus::Closed => "closed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unknown => "unknown",
        }
    }

    /// Whether the kitchen/floor workflow allows moving to `next`
    ///
    /// open → in_progress → ready → payment → closed, and
    /// open | in_progress → cancelled.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Open, InProgress)
                | (InProgress, Ready)
                | (Ready, Payment)
                | (Payment, Closed)
                | (Open, Cancelled)
                | (InProgress, Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order entity (read replica)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Takeaway orders have no table
    #[serde(default)]
    pub table_id: Option<TableId>,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<Instant>,
    #[serde(default)]
    pub total_amount: Option<f64>,
}

impl Order {
    /// Whether this order currently occupies `table_id`
    pub fn occupies(&self, table_id: TableId) -> bool {
        self.table_id == Some(table_id) && self.status.is_active()
    }
}

/// `PUT /orders/:id/status` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// `GET /orders/:id/can-close` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanCloseResponse {
    pub can_close: bool,
    #[serde(default)]
    pub reason: Option<String>,
}
