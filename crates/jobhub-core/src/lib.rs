//! # jobhub-core
//!
//! Core crate for JobHub. Contains the unified error system, configuration
//! schemas, typed identifiers, job lifecycle and priority policy types, and
//! the broker and clock ports implemented by other crates.
//!
//! This crate has **no** internal dependencies on other JobHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod sanitize;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
