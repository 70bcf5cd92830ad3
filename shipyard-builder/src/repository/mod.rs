//! Repository layer
//!
//! Repositories are thin clients for the external systems a run talks to:
//! the pub/sub backend that carries log events and the object store that
//! receives build artifacts. They hold no pipeline logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod channel;
mod object_store;

// Re-export traits
pub use channel::EventChannel;
pub use object_store::ObjectStore;

// Re-export implementations
pub use channel::RedisEventChannel;
pub use object_store::S3ObjectStore;
