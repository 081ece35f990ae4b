// File: ./src/model/mod.rs
pub mod intake;
pub mod item;

pub use item::{ActionItem, Due, ParsedActionItem, TBD};
