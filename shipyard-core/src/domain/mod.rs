//! Core domain types
//!
//! These types are shared between the builder (which produces log events and
//! uploads artifacts) and the CLI (which consumes log events).

pub mod artifact;
pub mod log;
pub mod manifest;
pub mod pipeline;
