//! Shared HTTP client construction.

use reqwest::Client;
use std::time::Duration;

/// User agent sent when `--user-agent` is not given.
pub const DEFAULT_USER_AGENT: &str = concat!("news_snapshot/", env!("CARGO_PKG_VERSION"));

/// Build the single client used for feeds, homepages and articles.
///
/// The timeout is the only bound on a hung fetch.
pub fn build_client(timeout: Duration, user_agent: &str) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(5), DEFAULT_USER_AGENT).is_ok());
    }

    #[test]
    fn test_default_user_agent_has_version() {
        assert!(DEFAULT_USER_AGENT.starts_with("news_snapshot/"));
    }
}
