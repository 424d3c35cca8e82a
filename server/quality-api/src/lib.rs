//! PR Quality API
//!
//! HTTP service that runs the quality engine over PR bundles posted by the
//! dashboard. Bind to 127.0.0.1 by default (internal only).

mod handlers;
mod state;

pub use handlers::{health, report};
pub use state::AppState;
