//! HTTP client construction.

use crate::config::UpdaterConfig;
use crate::core::{Result, UpdaterError};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};

/// `User-Agent` sent with every request. GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!("trilium-updater/", env!("CARGO_PKG_VERSION"));

fn base_builder(config: &UpdaterConfig) -> ClientBuilder {
    Client::builder().user_agent(USER_AGENT).connect_timeout(config.connect_timeout())
}

/// Client builder with the user agent and the configured timeouts applied.
///
/// The request timeout covers the whole exchange, body included, which suits
/// small API answers.
#[must_use]
pub fn client_builder(config: &UpdaterConfig) -> ClientBuilder {
    base_builder(config).timeout(config.timeout())
}

/// Client that follows redirects, used for API calls.
pub fn build_client(config: &UpdaterConfig) -> Result<Client> {
    finish(client_builder(config))
}

/// Client for archive downloads.
///
/// The timeout only bounds how long the server may stay silent, so a slow but
/// steady transfer of a large archive is never cut off.
pub fn build_download_client(config: &UpdaterConfig) -> Result<Client> {
    finish(base_builder(config).read_timeout(config.timeout()))
}

/// Client that never follows redirects.
///
/// Asset URL resolution needs to see the redirect GitHub answers with instead
/// of downloading the asset body.
pub fn build_no_redirect_client(config: &UpdaterConfig) -> Result<Client> {
    finish(client_builder(config).redirect(Policy::none()))
}

fn finish(builder: ClientBuilder) -> Result<Client> {
    builder.build().map_err(|e| UpdaterError::Other {
        message: format!("Failed to build HTTP client: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("trilium-updater/"));
        assert!(USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_clients_build_with_defaults() {
        let config = UpdaterConfig::default();
        build_client(&config).unwrap();
        build_no_redirect_client(&config).unwrap();
        build_download_client(&config).unwrap();
    }
}
