//! Extraction of vehicle listings from rendered search result markup.
//!
//! Build an [`Extractor`] over the page, then narrow the result with
//! [`Criteria`].

mod consts;
mod criteria;
pub mod error;
mod extract;
pub mod models;

pub use crate::consts::{DEFAULT_MAX_HOPS, UNKNOWN_PRICE};
pub use crate::criteria::Criteria;
pub use crate::extract::{Association, Extractor, find_associated_field};
pub use crate::models::Listing;
pub use crate::models::listing::parse_man_yen;
