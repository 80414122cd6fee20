//! Command handlers for the `sift` binary.

pub mod ask;
pub mod config;
pub mod enrich;
pub mod serve;
pub mod types;
