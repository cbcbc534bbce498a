// Re-export all model types for ease of use

pub mod user;
pub mod website;
pub mod campaign;
pub mod analytics;
pub mod responses;

pub use user::*;
pub use website::*;
pub use campaign::*;
pub use analytics::*;
pub use responses::*;
