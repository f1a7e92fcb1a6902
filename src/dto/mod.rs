pub mod analytics;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod content;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reports;
pub mod uploads;
pub mod users;
