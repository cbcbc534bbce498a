pub mod analytics;
pub mod auth;
pub mod campaign;
pub mod extract;
pub mod website;
