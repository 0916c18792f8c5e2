pub mod bike;
pub mod location;
pub mod reservation;
pub mod transaction;
pub mod user;

pub use bike::{Bike, BikeStatus};
pub use location::{HourException, HoursType, Location, WeeklyHours};
pub use reservation::{Reservation, ReservationStatus};
pub use transaction::{LedgerEntry, Transaction, TransactionStatus};
pub use user::{Role, User};
