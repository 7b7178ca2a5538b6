use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use flightline_core::booking::{Booking, Instructor, Resource};
use flightline_core::events::BookingEvent;
use flightline_core::identity::Identity;
use flightline_core::store::{DataSource, StoreError};
use flightline_store::{BookingStore, InstructorDirectory, ResourceDirectory};

use crate::dialog::{BookingDialog, DialogError, SaveCommand};
use crate::projection::{self, CalendarEvent};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Progressive loading state of one fetched collection. Each collection
/// records its own failure, so one failing list does not blank the others.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    NotLoaded,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    fn absorb(&mut self, result: Result<T, StoreError>) {
        *self = match result {
            Ok(value) => Loadable::Ready(value),
            Err(err) => Loadable::Failed(err.to_string()),
        };
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error(transparent)]
    Dialog(#[from] DialogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unknown booking: {0}")]
    UnknownBooking(Uuid),
}

/// The booking screen controller.
///
/// Owns the three fetched collections, the selected-resource set, the
/// dialog and the change-event channel. Saves and deletes are
/// server-confirmed: the store call runs first, then the booking
/// collection is refetched, then the event is broadcast and the dialog
/// closes. Local state is never mutated ahead of the store.
pub struct BookingScreen {
    identity: Identity,
    bookings_store: BookingStore,
    resource_directory: ResourceDirectory,
    instructor_directory: InstructorDirectory,
    bookings: Loadable<Vec<Booking>>,
    resources: Loadable<Vec<Resource>>,
    instructors: Loadable<Vec<Instructor>>,
    selected: Vec<Uuid>,
    dialog: BookingDialog,
    events_tx: broadcast::Sender<BookingEvent>,
}

impl BookingScreen {
    pub fn new(source: Arc<dyn DataSource>, identity: Identity) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            identity,
            bookings_store: BookingStore::new(source.clone()),
            resource_directory: ResourceDirectory::new(source.clone()),
            instructor_directory: InstructorDirectory::new(source),
            bookings: Loadable::NotLoaded,
            resources: Loadable::NotLoaded,
            instructors: Loadable::NotLoaded,
            selected: Vec::new(),
            dialog: BookingDialog::new(),
            events_tx,
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn dialog(&self) -> &BookingDialog {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut BookingDialog {
        &mut self.dialog
    }

    pub fn bookings(&self) -> &Loadable<Vec<Booking>> {
        &self.bookings
    }

    pub fn resources(&self) -> &Loadable<Vec<Resource>> {
        &self.resources
    }

    pub fn instructors(&self) -> &Loadable<Vec<Instructor>> {
        &self.instructors
    }

    /// Receiver of booking change events. Delivery is best-effort; a
    /// lagging receiver misses events.
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.events_tx.subscribe()
    }

    /// Fetches bookings, resources and instructors concurrently. Each
    /// collection resolves independently.
    pub async fn load(&mut self) {
        self.bookings = Loadable::Loading;
        self.resources = Loadable::Loading;
        self.instructors = Loadable::Loading;

        let (bookings, resources, instructors) = tokio::join!(
            self.bookings_store.list_all(),
            self.resource_directory.list_all(),
            self.instructor_directory.list_all(),
        );

        self.bookings.absorb(bookings);
        self.resources.absorb(resources);
        self.instructors.absorb(instructors);
    }

    pub async fn refresh_bookings(&mut self) -> Result<(), StoreError> {
        let bookings = self.bookings_store.list_all().await?;
        self.bookings = Loadable::Ready(bookings);
        Ok(())
    }

    pub async fn refresh_resources(&mut self) -> Result<(), StoreError> {
        let resources = self.resource_directory.list_all().await?;
        self.resources = Loadable::Ready(resources);
        Ok(())
    }

    pub async fn refresh_instructors(&mut self) -> Result<(), StoreError> {
        let instructors = self.instructor_directory.list_all().await?;
        self.instructors = Loadable::Ready(instructors);
        Ok(())
    }

    pub fn select_resources(&mut self, ids: Vec<Uuid>) {
        self.selected = ids;
    }

    pub fn selected_resources(&self) -> &[Uuid] {
        &self.selected
    }

    /// An empty time range was dragged on a resource's calendar; opens the
    /// dialog on a fresh draft owned by the acting member. The resource id
    /// comes from that resource's own calendar and is trusted as-is.
    pub fn select_range(&mut self, resource_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.dialog.open_new(resource_id, start, end, self.identity);
    }

    /// An existing event was clicked; opens the dialog in `Editing` or
    /// `Viewing` depending on ownership.
    pub fn open_booking(&mut self, id: Uuid) -> Result<(), ScreenError> {
        let booking = self
            .bookings
            .ready()
            .and_then(|bookings| bookings.iter().find(|b| b.id == Some(id)))
            .cloned()
            .ok_or(ScreenError::UnknownBooking(id))?;
        self.dialog.open_existing(&booking, self.identity);
        Ok(())
    }

    /// Runs the save gate and, when it passes, the store mutation. A gate
    /// failure makes no store call; a store failure keeps the dialog open
    /// with the error inline. On success the booking collection is
    /// refetched, the change event broadcast, and the dialog closed.
    pub async fn save(&mut self) -> Result<(), ScreenError> {
        let existing = self.bookings.ready().map(Vec::as_slice).unwrap_or(&[]);
        let command = self.dialog.prepare_save(existing)?;

        let result = match command {
            SaveCommand::Create(booking) => self
                .bookings_store
                .create(&booking)
                .await
                .map(BookingEvent::Created),
            SaveCommand::Update { id, booking } => self
                .bookings_store
                .update(id, &booking)
                .await
                .map(BookingEvent::Updated),
        };
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                self.dialog.record_failure(err.to_string());
                return Err(err.into());
            }
        };

        self.confirm_refetch().await;
        let _ = self.events_tx.send(event);
        self.dialog.close();
        Ok(())
    }

    /// Runs the delete gate and the delete mutation, with the same
    /// refetch-then-close flow as `save`.
    pub async fn delete(&mut self) -> Result<(), ScreenError> {
        let id = self.dialog.prepare_delete()?;

        if let Err(err) = self.bookings_store.delete(id).await {
            self.dialog.record_failure(err.to_string());
            return Err(err.into());
        }

        self.confirm_refetch().await;
        let _ = self.events_tx.send(BookingEvent::Deleted { id });
        self.dialog.close();
        Ok(())
    }

    /// Closes the dialog and discards any local edits. An in-flight
    /// request is not aborted.
    pub fn cancel(&mut self) {
        self.dialog.close();
    }

    pub fn my_events(&self) -> Vec<CalendarEvent> {
        self.bookings
            .ready()
            .map(|bookings| projection::my_bookings(bookings, self.identity))
            .unwrap_or_default()
    }

    pub fn resource_events(&self, resource_id: Uuid) -> Vec<CalendarEvent> {
        self.bookings
            .ready()
            .map(|bookings| projection::for_resource(bookings, resource_id))
            .unwrap_or_default()
    }

    /// One event list per selected resource, in selection order.
    pub fn resource_calendars(&self) -> Vec<(Uuid, Vec<CalendarEvent>)> {
        self.selected
            .iter()
            .map(|&resource_id| (resource_id, self.resource_events(resource_id)))
            .collect()
    }

    // The mutation already succeeded; a failing refetch only leaves the
    // previous snapshot on screen.
    async fn confirm_refetch(&mut self) {
        if let Err(err) = self.refresh_bookings().await {
            tracing::warn!(error = %err, "refetch after mutation failed");
        }
    }
}
