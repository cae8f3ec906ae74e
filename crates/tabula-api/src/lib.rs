//! HTTP boundary for Tabula.
//!
//! Handlers validate typed request models, call into the core crates, and
//! map each error to its HTTP representation. Status-code policy lives here
//! and nowhere else.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

pub use routes::configure_routes;
pub use state::AppContext;
