// Crate root library declaration and module exports.
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod extract;
pub mod markup;
pub mod model;
pub mod reminder;
pub mod storage;
