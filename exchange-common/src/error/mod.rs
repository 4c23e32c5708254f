//! Error classification shared by every layer of the client.
//!
//! Call-level failures ([`crate::venue::VenueError`]) and record-level
//! failures ([`crate::venue::RecordError`]) both describe themselves through
//! [`ErrorClassification`], so callers such as the CLI can tell a throttle
//! from a malformed payload without matching on concrete variants.
//!
//! # Usage
//!
//! ```rust,ignore
//! use exchange_common::error::ErrorClassification;
//!
//! fn report(err: &impl ErrorClassification) {
//!     if err.is_transient() {
//!         // safe to try again later
//!     }
//! }
//! ```

mod traits;

pub use traits::*;
