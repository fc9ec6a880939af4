//! NeetPrep Core — shared configuration and error taxonomy.

pub mod config;
pub mod error;

pub use config::{AppConfig, TutorSettings};
pub use error::{Error, Result};
