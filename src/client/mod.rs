//! GitHub client modules
//!
//! The HTTP boundary ([`GithubApi`]) is kept apart from the polling state
//! machine ([`EventPoller`]); the two meet at the [`ActivityFeed`] trait so
//! the poller can be driven by a scripted feed in tests.

pub mod api;
pub mod config;
pub mod error;
pub mod poller;


// Re-export main types for convenience
pub use api::{ActivityFeed, GithubApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use poller::EventPoller;
