//! Output generation.
//!
//! - [`json`]: writes the [`BatchResult`](crate::models::BatchResult) snapshot

pub mod json;
