//! NeetPrep web server: pages, quiz API, and the streaming AI tutor.

pub mod error;
pub mod routes;
pub mod session;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
