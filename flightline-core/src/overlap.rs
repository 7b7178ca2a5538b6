use crate::booking::Booking;

/// Returns the first persisted booking whose time range collides with the
/// candidate on the same resource, if any.
///
/// Intervals are half-open `[start_time, end_time)`: a booking that ends
/// exactly when another starts does not collide. A candidate that carries an
/// `id` is never checked against the stored row with the same id, so editing
/// a booking does not conflict with its own prior version. A zero-duration
/// candidate (`start_time == end_time`) collides only when it falls strictly
/// inside an existing booking; at an endpoint it slips through, and two
/// coincident zero-duration bookings never collide. That quirk is kept as
/// documented behavior.
pub fn find_conflict<'a>(candidate: &Booking, existing: &'a [Booking]) -> Option<&'a Booking> {
    let conflict = existing.iter().find(|other| conflicts(candidate, other));
    if let Some(other) = conflict {
        tracing::debug!(
            resource_id = %candidate.resource_id,
            conflicting_start = %other.start_time,
            conflicting_end = %other.end_time,
            "booking overlap detected"
        );
    }
    conflict
}

/// True when the candidate collides with any booking in `existing`.
pub fn is_overlapping(candidate: &Booking, existing: &[Booking]) -> bool {
    find_conflict(candidate, existing).is_some()
}

fn conflicts(candidate: &Booking, other: &Booking) -> bool {
    if other.resource_id != candidate.resource_id {
        return false;
    }
    // A candidate under edit never conflicts with itself.
    if let (Some(candidate_id), Some(other_id)) = (candidate.id, other.id) {
        if candidate_id == other_id {
            return false;
        }
    }
    candidate.start_time < other.end_time && candidate.end_time > other.start_time
}
