//! Heat assignment and round progression for timed events.
//!
//! The crate turns an event roster into qualifying heats, seeds semifinals from
//! qualifying results, selects the final field, and records per-athlete results.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod heats;
pub mod models;
pub mod results;

pub use error::{MeetError, MeetResult};
