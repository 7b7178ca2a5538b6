pub mod booking;
pub mod events;
pub mod identity;
pub mod overlap;
pub mod store;

pub use booking::{Booking, Instructor, Profile, Resource, ResourceStatus, ResourceType};
pub use events::BookingEvent;
pub use identity::{FixedIdentityProvider, Identity, IdentityProvider};
pub use store::{DataSource, Filter, FilterOp, ListPage, ListQuery, StoreError};
