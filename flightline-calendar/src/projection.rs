use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use flightline_core::booking::Booking;
use flightline_core::identity::Identity;

/// Label used when a booking has no title of its own.
pub const DEFAULT_EVENT_TITLE: &str = "Booking";

/// A booking projected for calendar rendering and click dispatch.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resource_id: Uuid,
    pub profile_id: Uuid,
}

/// Events for the acting member's own bookings, across all resources.
pub fn my_bookings(bookings: &[Booking], identity: Identity) -> Vec<CalendarEvent> {
    bookings
        .iter()
        .filter(|booking| booking.owned_by(identity.id))
        .filter_map(project)
        .collect()
}

/// Events for one resource's calendar.
pub fn for_resource(bookings: &[Booking], resource_id: Uuid) -> Vec<CalendarEvent> {
    bookings
        .iter()
        .filter(|booking| booking.resource_id == resource_id)
        .filter_map(project)
        .collect()
}

/// Unsaved drafts carry no id and cannot dispatch clicks, so they are
/// never projected.
fn project(booking: &Booking) -> Option<CalendarEvent> {
    let id = booking.id?;
    Some(CalendarEvent {
        id,
        title: booking
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_string()),
        start: booking.start_time,
        end: booking.end_time,
        resource_id: booking.resource_id,
        profile_id: booking.profile_id,
    })
}
