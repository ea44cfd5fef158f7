//! services/client/src/lib.rs
//!
//! The client-side core of the study-coach application: stateful session and
//! goal stores around the domain crate's ports, HTTP adapters for the remote
//! analysis, insights, and document-store endpoints, and the wiring to hold
//! it all together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod state;
pub mod stores;
pub mod telemetry;

pub use config::Config;
pub use error::ClientError;
pub use state::AppState;
