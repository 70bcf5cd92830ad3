//! Shipyard Core
//!
//! Shared types for the Shipyard build-and-deploy pipeline.
//!
//! This crate contains:
//! - Log events: the pub/sub payload streamed while a build runs
//! - Build manifest: the parsed project descriptor
//! - Artifacts: upload tasks, object keys and upload reports
//! - Pipeline states: the stages a single run moves through

pub mod domain;
