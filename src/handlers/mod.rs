pub mod availability;
pub mod bikes;
pub mod health;
pub mod locations;
pub mod reservations;
pub mod settings;
pub mod transactions;
pub mod users;
