//! CLI command implementations.
//!
//! Each command returns the JSON value to print.

pub mod read;
pub mod write;
