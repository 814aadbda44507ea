//! Dining Table Model

use serde::{Deserialize, Serialize};

use crate::types::TableId;

/// Capacities offered by the table form
pub const TABLE_CAPACITIES: [i32; 5] = [2, 4, 6, 8, 10];

/// Dining table entity (桌台)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiningTable {
    pub id: TableId,
    pub name: String,
    pub capacity: i32,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiningTableCreate {
    pub name: String,
    pub capacity: i32,
}

/// Update dining table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiningTableUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
}
