//! Reservation booking
//!
//! Writes never trust a local availability computation: every booking is
//! checked against `GET /reservations/available` first, and a failed check
//! counts as "not available".

use thiserror::Error;

use shared::models::{
    AvailabilityQuery, DiningTable, Reservation, ReservationCreate, ReservationStatus,
    ReservationUpdate,
};
use shared::types::Instant;
use shared::validation::{ValidationError, validate_reservation};
use shared::{ReservationId, TableId};

use crate::{ClientError, ClientResult};
use crate::http::FloorApi;

#[derive(Debug, Error)]
pub enum BookingError {
    /// Field-level problems, shown inline
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Table {table_id} is not available for the requested time")]
    Unavailable { table_id: TableId },

    /// Server rejected the submission, shown as one top-level error
    #[error(transparent)]
    Api(#[from] ClientError),
}

/// Ask the server whether `table_id` is free over `[from, to]`.
///
/// Fails closed: any error yields `false`.
pub async fn check_table_availability<A: FloorApi + ?Sized>(
    api: &A,
    table_id: TableId,
    from: Instant,
    to: Instant,
    exclude_reservation_id: Option<ReservationId>,
) -> bool {
    let query = AvailabilityQuery {
        table_id,
        reserved_from: from,
        reserved_to: to,
        exclude_reservation_id,
    };
    match api.check_availability(&query).await {
        Ok(available) => available,
        Err(e) => {
            tracing::warn!(table_id, error = %e, "Availability check failed, treating table as unavailable");
            false
        }
    }
}

/// Validate, check availability, then create the reservation.
///
/// `table` is the selected table when it is known locally, used for the
/// capacity check.
pub async fn book_reservation<A: FloorApi + ?Sized>(
    api: &A,
    draft: &ReservationCreate,
    table: Option<&DiningTable>,
    now: Instant,
) -> Result<Reservation, BookingError> {
    let draft = normalized(draft);
    validate_reservation(&draft, table.map(|t| t.capacity), Some(now))?;

    if !check_table_availability(api, draft.table_id, draft.reserved_from, draft.reserved_to, None)
        .await
    {
        return Err(BookingError::Unavailable {
            table_id: draft.table_id,
        });
    }

    let reservation = api.create_reservation(&draft).await?;
    tracing::info!(
        reservation_id = reservation.id,
        table_id = reservation.table_id,
        "Reservation created"
    );
    Ok(reservation)
}

/// Edit an existing reservation. Its own slot is excluded from the overlap check.
pub async fn reschedule_reservation<A: FloorApi + ?Sized>(
    api: &A,
    id: ReservationId,
    draft: &ReservationCreate,
    table: Option<&DiningTable>,
) -> Result<(), BookingError> {
    let draft = normalized(draft);
    validate_reservation(&draft, table.map(|t| t.capacity), None)?;

    if !check_table_availability(
        api,
        draft.table_id,
        draft.reserved_from,
        draft.reserved_to,
        Some(id),
    )
    .await
    {
        return Err(BookingError::Unavailable {
            table_id: draft.table_id,
        });
    }

    let update = ReservationUpdate {
        table_id: Some(draft.table_id),
        customer_name: Some(draft.customer_name),
        customer_phone: Some(draft.customer_phone),
        guest_count: Some(draft.guest_count),
        reserved_from: Some(draft.reserved_from),
        reserved_to: Some(draft.reserved_to),
        status: None,
    };
    api.update_reservation(id, &update).await?;
    tracing::info!(reservation_id = id, "Reservation updated");
    Ok(())
}

/// Move a reservation along its lifecycle. The transition is checked locally first.
pub async fn transition_reservation<A: FloorApi + ?Sized>(
    api: &A,
    reservation: &Reservation,
    next: ReservationStatus,
) -> ClientResult<()> {
    if !reservation.status.can_transition_to(next) {
        return Err(ClientError::InvalidTransition(format!(
            "reservation {} cannot go from {:?} to {:?}",
            reservation.id, reservation.status, next
        )));
    }
    api.set_reservation_status(reservation.id, next).await?;
    tracing::info!(reservation_id = reservation.id, status = ?next, "Reservation status changed");
    Ok(())
}

/// Guest arrived
pub async fn seat_reservation<A: FloorApi + ?Sized>(
    api: &A,
    reservation: &Reservation,
) -> ClientResult<()> {
    transition_reservation(api, reservation, ReservationStatus::Seated).await
}

pub async fn cancel_reservation<A: FloorApi + ?Sized>(
    api: &A,
    reservation: &Reservation,
) -> ClientResult<()> {
    transition_reservation(api, reservation, ReservationStatus::Cancelled).await
}

fn normalized(draft: &ReservationCreate) -> ReservationCreate {
    ReservationCreate {
        customer_name: draft.customer_name.trim().to_string(),
        customer_phone: draft.customer_phone.trim().to_string(),
        ..draft.clone()
    }
}
