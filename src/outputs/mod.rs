//! Output generation: the rendered page and an optional JSON dump.
//!
//! # Submodules
//!
//! - [`html`]: Renders the [`crate::models::AggregationResult`] into one static HTML document
//! - [`json`]: Writes the same result as JSON for other consumers
//!
//! Both consume the result read-only; neither touches the network.

pub mod html;
pub mod json;
