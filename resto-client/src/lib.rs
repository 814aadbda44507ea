//! Resto Client - REST client and floor worker for the restaurant API
//!
//! Provides the API collaborator, the explicit login session, snapshot
//! loading, reservation booking and the expired-reservation reconciler.

pub mod booking;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod reconcile;
pub mod session;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, MonitorConfig};
pub use error::{ClientError, ClientResult, FormError, FormResult};
pub use http::{ApiClient, FloorApi};
pub use reconcile::{FloorState, Reconciler, ReconcilerHandle};
pub use session::Session;
pub use snapshot::{FloorSnapshot, load_snapshot};
