//! In-memory [`FloorApi`] used by unit tests

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::TimeZone;
use tokio_util::sync::CancellationToken;

use shared::models::{
    AvailabilityQuery, DiningTable, Order, OrderStatus, Reservation, ReservationCreate,
    ReservationStatus, ReservationUpdate,
};
use shared::types::Instant;
use shared::{ReservationId, TableId};

use crate::http::FloorApi;
use crate::{ClientError, ClientResult};

pub fn at(h: u32, m: u32) -> Instant {
    chrono::Utc.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap()
}

pub fn table(id: TableId) -> DiningTable {
    DiningTable {
        id,
        name: format!("Mesa {id}"),
        capacity: 4,
    }
}

pub fn order(id: i64, table_id: TableId, status: OrderStatus) -> Order {
    Order {
        id,
        table_id: Some(table_id),
        status,
        created_at: None,
        total_amount: None,
    }
}

pub fn reservation(
    id: ReservationId,
    table_id: TableId,
    status: ReservationStatus,
    from: Instant,
    to: Instant,
) -> Reservation {
    Reservation {
        id,
        table_id,
        customer_name: "Guest".into(),
        customer_phone: "600000000".into(),
        guest_count: 2,
        reserved_from: from,
        reserved_to: to,
        status,
    }
}

#[derive(Default)]
struct State {
    tables: Vec<DiningTable>,
    orders: Vec<Order>,
    reservations: Vec<Reservation>,
    fail_tables: bool,
    fail_orders: bool,
    fail_reservations: bool,
    failing_ids: HashSet<ReservationId>,
    conflict_ids: HashSet<ReservationId>,
    unavailable: bool,
    fail_availability: bool,
    cancel_on_fetch: Option<CancellationToken>,
    reservation_fetches: usize,
    status_calls: Vec<(ReservationId, ReservationStatus)>,
    availability_queries: Vec<AvailabilityQuery>,
    created: Vec<ReservationCreate>,
    updates: Vec<(ReservationId, ReservationUpdate)>,
}

/// Behaves like a consistent backend: committed status changes show up in
/// the next fetch.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<State>,
}

impl MockApi {
    pub fn with_floor(
        tables: Vec<DiningTable>,
        orders: Vec<Order>,
        reservations: Vec<Reservation>,
    ) -> Self {
        let api = Self::default();
        {
            let mut s = api.state.lock().unwrap();
            s.tables = tables;
            s.orders = orders;
            s.reservations = reservations;
        }
        api
    }

    pub fn fail_collections(&self, tables: bool, orders: bool, reservations: bool) {
        let mut s = self.state.lock().unwrap();
        s.fail_tables = tables;
        s.fail_orders = orders;
        s.fail_reservations = reservations;
    }

    pub fn add_table(&self, table: DiningTable) {
        self.state.lock().unwrap().tables.push(table);
    }

    /// Cancel `token` when reservations are fetched, as if the view closed mid-load
    pub fn cancel_during_load(&self, token: CancellationToken) {
        self.state.lock().unwrap().cancel_on_fetch = Some(token);
    }

    pub fn fail_completion(&self, id: ReservationId) {
        self.state.lock().unwrap().failing_ids.insert(id);
    }

    pub fn conflict_on(&self, id: ReservationId) {
        self.state.lock().unwrap().conflict_ids.insert(id);
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().unavailable = !available;
    }

    pub fn fail_availability(&self) {
        self.state.lock().unwrap().fail_availability = true;
    }

    pub fn reservation_fetches(&self) -> usize {
        self.state.lock().unwrap().reservation_fetches
    }

    pub fn status_calls(&self) -> Vec<(ReservationId, ReservationStatus)> {
        self.state.lock().unwrap().status_calls.clone()
    }

    pub fn availability_queries(&self) -> Vec<AvailabilityQuery> {
        self.state.lock().unwrap().availability_queries.clone()
    }

    pub fn created(&self) -> Vec<ReservationCreate> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn updates(&self) -> Vec<(ReservationId, ReservationUpdate)> {
        self.state.lock().unwrap().updates.clone()
    }
}

fn unreachable_backend() -> ClientError {
    ClientError::Internal("503: backend unavailable".into())
}

#[async_trait]
impl FloorApi for MockApi {
    async fn fetch_tables(&self) -> ClientResult<Vec<DiningTable>> {
        let s = self.state.lock().unwrap();
        if s.fail_tables {
            return Err(unreachable_backend());
        }
        Ok(s.tables.clone())
    }

    async fn fetch_active_orders(&self) -> ClientResult<Vec<Order>> {
        let s = self.state.lock().unwrap();
        if s.fail_orders {
            return Err(unreachable_backend());
        }
        Ok(s.orders.iter().filter(|o| o.status.is_active()).cloned().collect())
    }

    async fn fetch_reservations(&self) -> ClientResult<Vec<Reservation>> {
        let mut s = self.state.lock().unwrap();
        s.reservation_fetches += 1;
        if let Some(token) = &s.cancel_on_fetch {
            token.cancel();
        }
        if s.fail_reservations {
            return Err(unreachable_backend());
        }
        Ok(s.reservations.clone())
    }

    async fn set_reservation_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> ClientResult<()> {
        let mut s = self.state.lock().unwrap();
        s.status_calls.push((id, status));
        if s.failing_ids.contains(&id) {
            return Err(unreachable_backend());
        }
        if s.conflict_ids.contains(&id) {
            return Err(ClientError::Conflict("reservation already completed".into()));
        }
        match s.reservations.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.status = status;
                Ok(())
            }
            None => Err(ClientError::NotFound(format!("reservation {id}"))),
        }
    }

    async fn check_availability(&self, query: &AvailabilityQuery) -> ClientResult<bool> {
        let mut s = self.state.lock().unwrap();
        s.availability_queries.push(query.clone());
        if s.fail_availability {
            return Err(ClientError::Timeout("availability".into()));
        }
        Ok(!s.unavailable)
    }

    async fn create_reservation(&self, draft: &ReservationCreate) -> ClientResult<Reservation> {
        let mut s = self.state.lock().unwrap();
        s.created.push(draft.clone());
        let reservation = Reservation {
            id: 1000 + s.created.len() as i64,
            table_id: draft.table_id,
            customer_name: draft.customer_name.clone(),
            customer_phone: draft.customer_phone.clone(),
            guest_count: draft.guest_count,
            reserved_from: draft.reserved_from,
            reserved_to: draft.reserved_to,
            status: ReservationStatus::Confirmed,
        };
        s.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn update_reservation(
        &self,
        id: ReservationId,
        update: &ReservationUpdate,
    ) -> ClientResult<()> {
        self.state
            .lock()
            .unwrap()
            .updates
            .push((id, update.clone()));
        Ok(())
    }
}
