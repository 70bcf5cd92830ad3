//! Service layer
//!
//! Services hold the logic of each pipeline stage. They use the repositories
//! and the process runner, and report progress through the log publisher,
//! which every stage receives from the executor.

mod build;
mod fetcher;
pub mod locator;
mod publisher;
mod uploader;

pub use build::BuildRunner;
pub use fetcher::RepositoryFetcher;
pub use publisher::LogPublisher;
pub use uploader::ArtifactUploader;
