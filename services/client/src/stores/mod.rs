pub mod auth;
pub mod goals;
pub mod sessions;

pub use auth::{AuthGate, Identity};
pub use goals::GoalsStore;
pub use sessions::SessionStore;
