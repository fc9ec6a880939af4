//! NeetPrep Store — rows are read and written through PostgREST.
//!
//! The schema is owned by the hosted database; this crate only knows the
//! handful of tables and RPCs the application touches.

pub mod client;
pub mod query;
pub mod types;

pub use client::SupabaseClient;
pub use query::Query;
pub use types::*;
