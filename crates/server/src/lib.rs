//! InternHub server: REST boundary, configuration and process wiring.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{init_logging, AppConfig};
pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, Manager, Scheduler};
