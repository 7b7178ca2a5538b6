pub mod dialog;
pub mod projection;
pub mod screen;

pub use dialog::{BookingDialog, DialogError, DialogMode, SaveCommand, FLIGHT_TYPES};
pub use projection::{CalendarEvent, DEFAULT_EVENT_TITLE};
pub use screen::{BookingScreen, Loadable, ScreenError};
