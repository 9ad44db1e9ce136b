//! Core types and errors shared across the warehouse ETL crates.

pub mod cluster;
pub mod error;

pub use cluster::*;
pub use error::{Error, Result};
