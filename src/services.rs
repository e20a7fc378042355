pub mod auth;
pub mod dashboard_service;
pub mod events;
pub mod lifecycle;
pub mod request_service;
