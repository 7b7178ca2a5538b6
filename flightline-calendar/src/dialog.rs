use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use flightline_core::booking::Booking;
use flightline_core::identity::Identity;
use flightline_core::overlap;

/// Flight type options offered by the booking form.
pub const FLIGHT_TYPES: [&str; 4] = ["Private", "Commercial", "Cargo", "Training"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Closed,
    /// Draft without an id, fully editable.
    New,
    /// Persisted booking opened by its owner.
    Editing,
    /// Persisted booking opened by someone else, read-only.
    Viewing,
}

#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("no booking dialog is open")]
    NotOpen,

    #[error("booking belongs to another member and is read-only")]
    ReadOnly,

    #[error("Start and End times are required.")]
    MissingTimes,

    #[error("This booking overlaps with an existing booking for this resource.")]
    Overlap,

    #[error("only a saved booking opened by its owner can be deleted")]
    NothingToDelete,
}

/// The editable form state behind an open dialog. Start and end stay raw
/// strings the way the time fields hold them; they are parsed at the save
/// gate, not on every keystroke.
#[derive(Debug, Clone)]
pub struct Draft {
    pub id: Option<Uuid>,
    pub profile_id: Uuid,
    pub resource_id: Uuid,
    pub start_text: String,
    pub end_text: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub instructor_id: Option<Uuid>,
    pub flight_type: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl Draft {
    fn from_booking(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            profile_id: booking.profile_id,
            resource_id: booking.resource_id,
            start_text: booking.start_time.to_rfc3339(),
            end_text: booking.end_time.to_rfc3339(),
            title: booking.title.clone(),
            notes: booking.notes.clone(),
            instructor_id: booking.instructor_id,
            flight_type: booking.flight_type.clone(),
            created_at: booking.created_at,
        }
    }
}

/// What the screen controller should execute after a successful save gate.
#[derive(Debug, Clone)]
pub enum SaveCommand {
    Create(Booking),
    Update { id: Uuid, booking: Booking },
}

/// The booking dialog state machine.
///
/// Opens in `New` from an empty-range selection, or in `Editing`/`Viewing`
/// from a click on an existing event depending on ownership. Field edits
/// touch only the local draft; the save and delete gates validate and hand
/// a command back to the caller, which runs the store mutation. Gate and
/// transport failures are recorded as an inline error that survives until
/// the next open or successful edit.
#[derive(Debug)]
pub struct BookingDialog {
    mode: DialogMode,
    draft: Option<Draft>,
    error: Option<String>,
}

impl BookingDialog {
    pub fn new() -> Self {
        Self {
            mode: DialogMode::Closed,
            draft: None,
            error: None,
        }
    }

    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode != DialogMode::Closed
    }

    pub fn is_read_only(&self) -> bool {
        self.mode == DialogMode::Viewing
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// The inline error shown in the dialog, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Closed → New: an empty time range was selected on a resource
    /// calendar. The draft is owned by the acting member.
    pub fn open_new(
        &mut self,
        resource_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        identity: Identity,
    ) {
        let booking = Booking::draft(identity.id, resource_id, start, end);
        self.draft = Some(Draft::from_booking(&booking));
        self.mode = DialogMode::New;
        self.error = None;
    }

    /// Closed → Editing|Viewing: an existing event was clicked. Owners may
    /// edit; everyone else gets a read-only view.
    pub fn open_existing(&mut self, booking: &Booking, identity: Identity) {
        self.draft = Some(Draft::from_booking(booking));
        self.mode = if booking.owned_by(identity.id) {
            DialogMode::Editing
        } else {
            DialogMode::Viewing
        };
        self.error = None;
    }

    pub fn set_start_time(&mut self, raw: impl Into<String>) -> Result<(), DialogError> {
        let raw = raw.into();
        self.edit(|draft| draft.start_text = raw)
    }

    pub fn set_end_time(&mut self, raw: impl Into<String>) -> Result<(), DialogError> {
        let raw = raw.into();
        self.edit(|draft| draft.end_text = raw)
    }

    pub fn set_title(&mut self, title: Option<String>) -> Result<(), DialogError> {
        self.edit(|draft| draft.title = title)
    }

    pub fn set_notes(&mut self, notes: Option<String>) -> Result<(), DialogError> {
        self.edit(|draft| draft.notes = notes)
    }

    pub fn set_instructor(&mut self, instructor_id: Option<Uuid>) -> Result<(), DialogError> {
        self.edit(|draft| draft.instructor_id = instructor_id)
    }

    pub fn set_flight_type(&mut self, flight_type: Option<String>) -> Result<(), DialogError> {
        self.edit(|draft| draft.flight_type = flight_type)
    }

    /// Save gate. Validates the draft times, then runs the overlap check
    /// against `existing`, and only then yields the command to persist.
    /// On failure the dialog stays open with the inline error set and no
    /// command is produced.
    pub fn prepare_save(&mut self, existing: &[Booking]) -> Result<SaveCommand, DialogError> {
        match self.mode {
            DialogMode::Closed => return Err(self.fail(DialogError::NotOpen)),
            DialogMode::Viewing => return Err(self.fail(DialogError::ReadOnly)),
            DialogMode::New | DialogMode::Editing => {}
        }

        let draft = self.draft.as_ref().ok_or(DialogError::NotOpen)?;
        let (start, end) = match (parse_time(&draft.start_text), parse_time(&draft.end_text)) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(self.fail(DialogError::MissingTimes)),
        };

        let mut booking = Booking::draft(draft.profile_id, draft.resource_id, start, end);
        booking.id = draft.id;
        booking.title = draft.title.clone();
        booking.notes = draft.notes.clone();
        booking.instructor_id = draft.instructor_id;
        booking.flight_type = draft.flight_type.clone();
        booking.created_at = draft.created_at;

        if overlap::is_overlapping(&booking, existing) {
            return Err(self.fail(DialogError::Overlap));
        }

        self.error = None;
        match booking.id {
            Some(id) => Ok(SaveCommand::Update { id, booking }),
            None => Ok(SaveCommand::Create(booking)),
        }
    }

    /// Delete gate. Only a persisted booking opened by its owner can be
    /// deleted; `New` has nothing persisted and `Viewing` is read-only.
    pub fn prepare_delete(&mut self) -> Result<Uuid, DialogError> {
        match self.mode {
            DialogMode::Closed => return Err(self.fail(DialogError::NotOpen)),
            DialogMode::Viewing => return Err(self.fail(DialogError::ReadOnly)),
            DialogMode::New => return Err(self.fail(DialogError::NothingToDelete)),
            DialogMode::Editing => {}
        }

        let id = self
            .draft
            .as_ref()
            .and_then(|draft| draft.id)
            .ok_or(DialogError::NothingToDelete)?;
        self.error = None;
        Ok(id)
    }

    /// Records a transport failure so the dialog stays open with the error
    /// shown inline.
    pub fn record_failure(&mut self, detail: impl Into<String>) {
        self.error = Some(detail.into());
    }

    /// Cancel/Close from any open state: discards local edits.
    pub fn close(&mut self) {
        self.mode = DialogMode::Closed;
        self.draft = None;
        self.error = None;
    }

    fn edit(&mut self, apply: impl FnOnce(&mut Draft)) -> Result<(), DialogError> {
        match self.mode {
            DialogMode::Closed => return Err(self.fail(DialogError::NotOpen)),
            DialogMode::Viewing => return Err(self.fail(DialogError::ReadOnly)),
            DialogMode::New | DialogMode::Editing => {}
        }
        if let Some(draft) = self.draft.as_mut() {
            apply(draft);
            self.error = None;
        }
        Ok(())
    }

    fn fail(&mut self, err: DialogError) -> DialogError {
        self.error = Some(err.to_string());
        err
    }
}

impl Default for BookingDialog {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the time forms the dialog round-trips: RFC 3339 with offset, or
/// the minute-granularity `YYYY-MM-DDTHH:MM` field value (with an optional
/// seconds part), taken as UTC.
fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn member() -> Identity {
        Identity::new(Uuid::new_v4())
    }

    fn instant(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    fn persisted(owner: Identity, resource_id: Uuid, start_hour: u32, end_hour: u32) -> Booking {
        let mut booking = Booking::draft(
            owner.id,
            resource_id,
            instant(start_hour, 0),
            instant(end_hour, 0),
        );
        booking.id = Some(Uuid::new_v4());
        booking
    }

    #[test]
    fn test_open_new_prefills_owner_and_range() {
        let me = member();
        let resource = Uuid::new_v4();
        let mut dialog = BookingDialog::new();

        dialog.open_new(resource, instant(10, 0), instant(11, 0), me);

        assert_eq!(dialog.mode(), DialogMode::New);
        let draft = dialog.draft().unwrap();
        assert_eq!(draft.profile_id, me.id);
        assert_eq!(draft.resource_id, resource);
        assert!(draft.id.is_none());
    }

    #[test]
    fn test_owner_opens_in_editing_others_in_viewing() {
        let owner = member();
        let stranger = member();
        let booking = persisted(owner, Uuid::new_v4(), 10, 11);

        let mut dialog = BookingDialog::new();
        dialog.open_existing(&booking, owner);
        assert_eq!(dialog.mode(), DialogMode::Editing);

        dialog.open_existing(&booking, stranger);
        assert_eq!(dialog.mode(), DialogMode::Viewing);
    }

    #[test]
    fn test_viewing_rejects_edits_save_and_delete() {
        let owner = member();
        let stranger = member();
        let booking = persisted(owner, Uuid::new_v4(), 10, 11);

        let mut dialog = BookingDialog::new();
        dialog.open_existing(&booking, stranger);

        assert!(matches!(
            dialog.set_title(Some("mine now".to_string())),
            Err(DialogError::ReadOnly)
        ));
        assert!(matches!(dialog.prepare_save(&[]), Err(DialogError::ReadOnly)));
        assert!(matches!(dialog.prepare_delete(), Err(DialogError::ReadOnly)));
        assert!(dialog.error().is_some());
    }

    #[test]
    fn test_save_requires_parseable_times() {
        let me = member();
        let mut dialog = BookingDialog::new();
        dialog.open_new(Uuid::new_v4(), instant(10, 0), instant(11, 0), me);
        dialog.set_end_time("").unwrap();

        let err = dialog.prepare_save(&[]).unwrap_err();
        assert!(matches!(err, DialogError::MissingTimes));
        assert_eq!(dialog.error(), Some("Start and End times are required."));
        assert!(dialog.is_open());
    }

    #[test]
    fn test_save_rejects_overlap_and_keeps_dialog_open() {
        let me = member();
        let resource = Uuid::new_v4();
        let existing = vec![persisted(member(), resource, 10, 11)];

        let mut dialog = BookingDialog::new();
        dialog.open_new(resource, instant(10, 30), instant(11, 30), me);

        let err = dialog.prepare_save(&existing).unwrap_err();
        assert!(matches!(err, DialogError::Overlap));
        assert!(dialog.is_open());
        assert!(dialog.error().is_some());
    }

    #[test]
    fn test_save_yields_create_for_new_draft() {
        let me = member();
        let mut dialog = BookingDialog::new();
        dialog.open_new(Uuid::new_v4(), instant(10, 0), instant(11, 0), me);
        dialog.set_title(Some("Checkride".to_string())).unwrap();
        dialog.set_flight_type(Some("Training".to_string())).unwrap();

        match dialog.prepare_save(&[]).unwrap() {
            SaveCommand::Create(booking) => {
                assert!(booking.id.is_none());
                assert_eq!(booking.title.as_deref(), Some("Checkride"));
                assert_eq!(booking.flight_type.as_deref(), Some("Training"));
            }
            other => panic!("expected Create, got {:?}", other),
        }
        assert!(dialog.error().is_none());
    }

    #[test]
    fn test_save_yields_update_and_excludes_self_from_overlap() {
        let owner = member();
        let resource = Uuid::new_v4();
        let booking = persisted(owner, resource, 10, 11);
        // The collection still holds the stored version of the edited booking.
        let existing = vec![booking.clone()];

        let mut dialog = BookingDialog::new();
        dialog.open_existing(&booking, owner);
        dialog.set_start_time("2024-06-01T10:15").unwrap();
        dialog.set_end_time("2024-06-01T11:15").unwrap();

        match dialog.prepare_save(&existing).unwrap() {
            SaveCommand::Update { id, booking: edited } => {
                assert_eq!(Some(id), booking.id);
                assert_eq!(edited.start_time, instant(10, 15));
            }
            other => panic!("expected Update, got {:?}", other),
        }
    }

    #[test]
    fn test_every_offered_flight_type_reaches_the_save_command() {
        let me = member();
        for option in FLIGHT_TYPES {
            let mut dialog = BookingDialog::new();
            dialog.open_new(Uuid::new_v4(), instant(10, 0), instant(11, 0), me);
            dialog.set_flight_type(Some(option.to_string())).unwrap();

            match dialog.prepare_save(&[]).unwrap() {
                SaveCommand::Create(booking) => {
                    assert_eq!(booking.flight_type.as_deref(), Some(option))
                }
                other => panic!("expected Create, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_minute_granularity_times_parse_as_utc() {
        assert_eq!(parse_time("2024-06-01T10:30"), Some(instant(10, 30)));
        assert_eq!(parse_time("2024-06-01T10:30:00"), Some(instant(10, 30)));
        assert_eq!(
            parse_time("2024-06-01T12:30:00+02:00"),
            Some(instant(10, 30))
        );
        assert_eq!(parse_time("next tuesday"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_delete_only_from_editing() {
        let owner = member();
        let booking = persisted(owner, Uuid::new_v4(), 10, 11);

        let mut dialog = BookingDialog::new();
        assert!(matches!(dialog.prepare_delete(), Err(DialogError::NotOpen)));

        dialog.open_new(Uuid::new_v4(), instant(9, 0), instant(10, 0), owner);
        assert!(matches!(
            dialog.prepare_delete(),
            Err(DialogError::NothingToDelete)
        ));

        dialog.open_existing(&booking, owner);
        assert_eq!(dialog.prepare_delete().unwrap(), booking.id.unwrap());
    }

    #[test]
    fn test_close_discards_draft_and_error() {
        let me = member();
        let mut dialog = BookingDialog::new();
        dialog.open_new(Uuid::new_v4(), instant(10, 0), instant(11, 0), me);
        dialog.record_failure("store rejected the request (500): boom");

        dialog.close();

        assert_eq!(dialog.mode(), DialogMode::Closed);
        assert!(dialog.draft().is_none());
        assert!(dialog.error().is_none());
    }

    #[test]
    fn test_successful_edit_clears_inline_error() {
        let me = member();
        let mut dialog = BookingDialog::new();
        dialog.open_new(Uuid::new_v4(), instant(10, 0), instant(11, 0), me);
        dialog.set_end_time("").unwrap();
        dialog.prepare_save(&[]).unwrap_err();
        assert!(dialog.error().is_some());

        dialog.set_end_time("2024-06-01T11:00").unwrap();
        assert!(dialog.error().is_none());
        assert!(dialog.prepare_save(&[]).is_ok());
    }
}
