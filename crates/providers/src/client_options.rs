//! Client options handed to the OpenAI-compatible client builder, and the
//! [`ClientConfig`] it produces.

use std::{collections::BTreeMap, fmt};

use {
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    serde_json::{Map, Value},
    switchyard_common::redact::REDACTED,
    switchyard_config::{CustomEndpointBlock, EnvSnapshot, TokenConfig, substitute_env},
    tracing::trace,
};

use crate::error::Result;

/// Header-value placeholder replaced with the requesting user's id.
pub const USER_ID_PLACEHOLDER: &str = "{{USER_ID}}";

/// Endpoint behaviour options carried through to the chat client untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOptions {
    pub title_convo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_model: Option<String>,
    pub title_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_prompt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_display_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_endpoint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_rate: Option<u64>,
}

impl CustomOptions {
    pub fn from_block(block: &CustomEndpointBlock) -> Self {
        Self {
            title_convo: block.title_convo,
            title_model: block.title_model.clone(),
            title_method: block
                .title_method
                .clone()
                .unwrap_or_else(|| "completion".into()),
            context_strategy: block.summarize.then(|| "summarize".to_string()),
            summary_model: block.summary_model.clone(),
            force_prompt: block.force_prompt,
            model_display_label: block.model_display_label.clone(),
            direct_endpoint: block.direct_endpoint,
            stream_rate: block.stream_rate,
        }
    }
}

/// Provider-agnostic inputs for building a client.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub base_url: String,
    pub proxy: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub drop_params: Vec<String>,
    /// Block `add_params` overlaid with the caller's model parameters and `user`.
    pub model_options: Map<String, Value>,
    pub custom: CustomOptions,
}

/// Ready-to-use client configuration.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(skip)]
    pub api_key: Secret<String>,
    /// Request-level options sent with every completion call.
    pub llm_config: Map<String, Value>,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    pub default_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    pub custom_options: CustomOptions,
    /// Send message content as plain strings rather than content parts.
    pub use_legacy_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_token_config: Option<TokenConfig>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &REDACTED)
            .field("llm_config", &self.llm_config)
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers.keys())
            .field("proxy", &self.proxy)
            .field("custom_options", &self.custom_options)
            .field("use_legacy_content", &self.use_legacy_content)
            .field("endpoint_token_config", &self.endpoint_token_config)
            .finish()
    }
}

/// Turns resolved credentials and options into a [`ClientConfig`].
pub trait ClientOptionsBuilder: Send + Sync {
    fn build(
        &self,
        api_key: &Secret<String>,
        options: ClientOptions,
        endpoint: &str,
    ) -> Result<ClientConfig>;
}

/// Builder for OpenAI-compatible chat clients.
///
/// Streams by default and strips `drop_params` from the model options last,
/// so a dropped parameter never reaches the provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiCompatBuilder;

impl ClientOptionsBuilder for OpenAiCompatBuilder {
    fn build(
        &self,
        api_key: &Secret<String>,
        options: ClientOptions,
        endpoint: &str,
    ) -> Result<ClientConfig> {
        let mut llm_config = Map::new();
        llm_config.insert("streaming".into(), Value::Bool(true));
        llm_config.extend(options.model_options);
        for param in &options.drop_params {
            llm_config.remove(param);
        }
        trace!(endpoint, params = llm_config.len(), "built client options");

        Ok(ClientConfig {
            api_key: Secret::new(api_key.expose_secret().clone()),
            llm_config,
            base_url: options.base_url,
            default_headers: options.headers,
            proxy: options.proxy,
            custom_options: options.custom,
            use_legacy_content: false,
            endpoint_token_config: None,
        })
    }
}

/// Block defaults, then caller parameters, then the effective user id.
pub fn merge_model_options(
    add_params: &Map<String, Value>,
    caller: Option<&Map<String, Value>>,
    user_id: &str,
) -> Map<String, Value> {
    let mut merged = add_params.clone();
    if let Some(caller) = caller {
        merged.extend(caller.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged.insert("user".into(), Value::String(user_id.to_string()));
    merged
}

/// Expand `${VAR}` and the user id placeholder in header values.
pub fn resolve_headers(
    headers: &BTreeMap<String, String>,
    env: &EnvSnapshot,
    user_id: &str,
) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = substitute_env(value, env).replace(USER_ID_PLACEHOLDER, user_id);
            (name.clone(), value)
        })
        .collect()
}
