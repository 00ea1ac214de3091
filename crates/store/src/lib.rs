//! Persistence of reported listings, and detection of which listings on a
//! page haven't been reported yet.

mod detect;
pub mod error;
mod fingerprint;
mod json;
mod known;

pub use crate::detect::{Classified, classify, diff, removed};
pub use crate::fingerprint::{Fingerprint, fingerprint};
pub use crate::json::JsonStore;
pub use crate::known::KnownSet;
