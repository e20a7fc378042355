pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod events;
pub mod requests;
