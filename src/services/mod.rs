pub mod availability;
pub mod booking;
pub mod clock;
pub mod hours;
pub mod notify;
pub mod pricing;
pub mod timebar;
