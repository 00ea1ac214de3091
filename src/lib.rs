//! Watches a used-car search for newly listed vehicles.
//!
//! Each cycle fetches the search page, extracts the listings, compares them
//! against the ones already reported, notifies about the rest, and records
//! them. [`Monitor`] runs the cycle once or on a [`Schedule`].

pub mod commands;
pub mod error;
pub mod logging;
mod monitor;
mod schedule;

pub use crate::monitor::{CycleReport, Monitor, Phase};
pub use crate::schedule::Schedule;
