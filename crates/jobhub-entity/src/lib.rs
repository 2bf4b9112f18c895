//! # jobhub-entity
//!
//! Domain models for JobHub: job classes and their typed payloads, completion
//! webhook events, notification records and subject state.

pub mod job;
pub mod notification;
pub mod subject;
pub mod webhook;
