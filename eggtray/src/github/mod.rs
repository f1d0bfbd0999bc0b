//! GitHub REST access shared by enrichment and issue reporting

pub mod auth;
pub mod http;

pub use auth::{AppCredentials, GitHubAuth};
pub use http::GitHubHttp;
