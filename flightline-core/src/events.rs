use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::Booking;

/// Change notification emitted by the booking screen after a mutation has
/// been confirmed by the store. Fanned out over a tokio broadcast channel;
/// delivery is best-effort and lagging receivers miss events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BookingEvent {
    Created(Booking),
    Updated(Booking),
    Deleted { id: Uuid },
}

impl BookingEvent {
    /// Id of the booking the event refers to. `Created`/`Updated` carry the
    /// persisted record, so the id is present in practice.
    pub fn booking_id(&self) -> Option<Uuid> {
        match self {
            BookingEvent::Created(booking) | BookingEvent::Updated(booking) => booking.id,
            BookingEvent::Deleted { id } => Some(*id),
        }
    }
}
