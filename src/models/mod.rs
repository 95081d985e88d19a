//! Domain models for trackmeet.
//!
//! # Core Concepts
//!
//! ## Registry Entities
//!
//! Owned by the registration side of the meet and only read by the heat engine:
//!
//! - [`Event`]: One timed event (e.g. "100m Freestyle"), tied to a [`SportGroup`]
//!   that fixes its lane count.
//! - [`Athlete`]: A competitor with a unique chest number, enrolled in events
//!   through [`EventEntry`] rows that carry registration order.
//! - [`Round`]: One stage of an event ([`RoundKind::Heats`], `Semifinals`, `Final`).
//!
//! ## Progression Entities
//!
//! Created by the heat engine and mutated only by the result recorder:
//!
//! - [`Heat`]: One race within a round, with a fixed-length [`Placement`] snapshot.
//! - [`AthleteHeat`]: The authoritative lane/position/time record for one athlete
//!   in one heat.

mod athlete;
mod athlete_heat;
mod event;
mod heat;
mod round;

pub use athlete::*;
pub use athlete_heat::*;
pub use event::*;
pub use heat::*;
pub use round::*;
