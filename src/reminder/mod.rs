// File: src/reminder/mod.rs
//! Daily reminder pipeline: bucket open action items by due date and render
//! one digest per recipient.
pub mod classify;
pub mod digest;

pub use classify::{Bucket, Buckets, classify};
pub use digest::{MAX_ITEMS_PER_BUCKET, format_digest};
