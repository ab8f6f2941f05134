//! Outbound API clients

pub mod client;
pub mod github;
pub mod vercel;

pub use github::{GitHubClient, SourceHost};
pub use vercel::{DeployProvider, ReadyState, VercelClient};
