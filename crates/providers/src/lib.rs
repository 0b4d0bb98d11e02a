//! Custom endpoint initialization for OpenAI-compatible providers.
//!
//! [`CustomEndpointInitializer`] looks up a declared endpoint, resolves its
//! credentials (literal, `${ENV_VAR}` or per-user), attaches token rates and
//! returns a [`ClientConfig`] ready for the chat client.

pub mod client_options;
pub mod credentials;
pub mod error;
pub mod initialize;
pub mod models;
pub mod token_cache;

pub use {
    client_options::{ClientConfig, ClientOptions, ClientOptionsBuilder, OpenAiCompatBuilder},
    credentials::{CredentialStore, MemoryCredentialStore, RequestContext, UserKeyValues},
    error::{Error, ErrorPayload, Result},
    initialize::{CustomEndpointInitializer, InitializeRequest},
    models::{FetchModelsRequest, HttpModelFetcher, ModelFetcher},
    token_cache::{MemoryTokenConfigCache, TokenConfigCache, token_cache_key},
};

/// Shared HTTP client for provider calls.
///
/// Fetchers that don't need custom proxy settings should reuse this client to
/// share connection pools and TLS sessions.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}
