pub mod app_config;
pub mod bookings;
pub mod directory;
pub mod memory;
pub mod rest;

pub use bookings::BookingStore;
pub use directory::{InstructorDirectory, ResourceDirectory};
pub use memory::MemoryDataSource;
pub use rest::RestDataSource;
