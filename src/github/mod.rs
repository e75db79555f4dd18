pub mod client;
pub mod excerpt;
pub mod models;
pub mod url;

pub use client::GitHubClient;
pub use excerpt::ExcerptSelector;
pub use models::*;
pub use url::RepoRef;
