use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use flightline_core::store::{DataSource, StoreError, BOOKINGS, INSTRUCTORS, PROFILES, RESOURCES};
use flightline_store::MemoryDataSource;

/// Loads demo fixtures for local runs: the acting member's profile, a
/// small fleet, one instructor and a booking on tomorrow's schedule.
pub async fn seed_demo(source: &MemoryDataSource, member_id: Uuid) -> Result<(), StoreError> {
    source
        .create(
            PROFILES,
            json!({
                "id": member_id.to_string(),
                "first_name": "Alex",
                "last_name": "Mercer",
                "email": "alex.mercer@flightline.club",
            }),
        )
        .await?;

    let instructor_profile = source
        .create(
            PROFILES,
            json!({
                "first_name": "Dana",
                "last_name": "Whitfield",
                "email": "dana.whitfield@flightline.club",
            }),
        )
        .await?;
    source
        .create(
            INSTRUCTORS,
            json!({
                "profile_id": instructor_profile["id"],
                "rating_level": "CFI",
                "availability": "Weekdays",
            }),
        )
        .await?;

    let mut first_aircraft = None;
    for (name, resource_type, status) in [
        ("Cessna 172 SP-KYR", "AIRCRAFT", "AVAILABLE"),
        ("Piper PA-28 SP-ARR", "AIRCRAFT", "MAINTENANCE"),
        ("ALSIM AL250", "SIMULATOR", "AVAILABLE"),
        ("Briefing Room", "CLASSROOM", "AVAILABLE"),
    ] {
        let resource = source
            .create(
                RESOURCES,
                json!({
                    "name": name,
                    "resource_type": resource_type,
                    "status": status,
                }),
            )
            .await?;
        if first_aircraft.is_none() {
            first_aircraft = Some(resource["id"].clone());
        }
    }

    let start = (Utc::now() + Duration::days(1))
        .date_naive()
        .and_hms_opt(10, 0, 0)
        .expect("valid time of day")
        .and_utc();
    let now = Utc::now();
    source
        .create(
            BOOKINGS,
            json!({
                "profile_id": member_id.to_string(),
                "resource_id": first_aircraft.expect("fleet seeded above"),
                "start_time": start.to_rfc3339(),
                "end_time": (start + Duration::hours(1)).to_rfc3339(),
                "title": "Pattern work",
                "flight_type": "Training",
                "created_at": now.to_rfc3339(),
                "updated_at": now.to_rfc3339(),
            }),
        )
        .await?;

    tracing::info!(member = %member_id, "demo fixtures seeded");
    Ok(())
}
