//! Custom endpoint initialization: lookup, credentials, token rates, client.
//!
//! Every custom endpoint goes through the same pipeline; there is no
//! per-provider special casing here. Any step failing aborts the call.

use std::sync::Arc;

use {
    serde_json::{Map, Value},
    switchyard_config::{
        AppConfig, CustomEndpointBlock, EnvSnapshot, TokenConfig, env::PROXY, find_custom_endpoint,
    },
    tracing::{debug, info},
};

use crate::{
    client_options::{
        ClientConfig, ClientOptions, ClientOptionsBuilder, CustomOptions, OpenAiCompatBuilder,
        merge_model_options, resolve_headers,
    },
    credentials::{CredentialStore, RequestContext, ResolvedCredentials, resolve_credentials},
    error::{Error, Result},
    models::{FetchModelsRequest, ModelFetcher},
    token_cache::{TokenConfigCache, token_cache_key},
};

/// One initialization call.
#[derive(Debug, Clone, Copy)]
pub struct InitializeRequest<'a> {
    pub context: &'a RequestContext,
    pub endpoint: &'a str,
    pub model_parameters: Option<&'a Map<String, Value>>,
    pub app_config: Option<&'a AppConfig>,
}

/// Builds client configurations for custom endpoints.
///
/// Holds the process-wide collaborators; create one at startup and share it.
pub struct CustomEndpointInitializer {
    env: EnvSnapshot,
    credential_store: Arc<dyn CredentialStore>,
    token_cache: Arc<dyn TokenConfigCache>,
    model_fetcher: Arc<dyn ModelFetcher>,
    options_builder: Arc<dyn ClientOptionsBuilder>,
}

impl CustomEndpointInitializer {
    pub fn new(
        env: EnvSnapshot,
        credential_store: Arc<dyn CredentialStore>,
        token_cache: Arc<dyn TokenConfigCache>,
        model_fetcher: Arc<dyn ModelFetcher>,
    ) -> Self {
        Self {
            env,
            credential_store,
            token_cache,
            model_fetcher,
            options_builder: Arc::new(OpenAiCompatBuilder),
        }
    }

    #[must_use]
    pub fn with_options_builder(mut self, builder: Arc<dyn ClientOptionsBuilder>) -> Self {
        self.options_builder = builder;
        self
    }

    pub async fn initialize(&self, request: InitializeRequest<'_>) -> Result<ClientConfig> {
        let endpoint = request.endpoint;
        let user_id = request.context.user_id.as_str();

        let block = find_custom_endpoint(endpoint, request.app_config)?.ok_or_else(|| {
            Error::ConfigNotFound {
                endpoint: endpoint.to_string(),
            }
        })?;

        let credentials = resolve_credentials(
            endpoint,
            block,
            request.context,
            &self.env,
            self.credential_store.as_ref(),
        )
        .await?;

        let token_config = self
            .token_config(endpoint, block, &credentials, user_id)
            .await?;

        let options = ClientOptions {
            base_url: credentials.base_url.clone(),
            proxy: self.env.get(PROXY).map(str::to_string),
            headers: resolve_headers(&block.headers, &self.env, user_id),
            drop_params: block.drop_params.clone(),
            model_options: merge_model_options(
                &block.add_params,
                request.model_parameters,
                user_id,
            ),
            custom: CustomOptions::from_block(block),
        };

        let mut config = self
            .options_builder
            .build(&credentials.api_key, options, endpoint)?;
        config.use_legacy_content = true;
        config.endpoint_token_config = token_config;

        info!(
            endpoint,
            user_provided = credentials.user_provided,
            token_config = config.endpoint_token_config.is_some(),
            "custom endpoint initialized"
        );
        Ok(config)
    }

    /// Static rates win; otherwise the cache, then a fetch if the block asks for one.
    async fn token_config(
        &self,
        endpoint: &str,
        block: &CustomEndpointBlock,
        credentials: &ResolvedCredentials,
        user_id: &str,
    ) -> Result<Option<TokenConfig>> {
        if let Some(static_config) = &block.token_config {
            return Ok(Some(static_config.clone()));
        }

        let cache_key = token_cache_key(endpoint, user_id, credentials.user_provided);
        if let Some(cached) = self.token_cache.get(&cache_key).await? {
            debug!(endpoint, %cache_key, "token config cache hit");
            return Ok(Some(cached));
        }
        if !block.models.fetch {
            return Ok(None);
        }

        debug!(endpoint, %cache_key, "token config cache miss, fetching models");
        self.model_fetcher
            .fetch_models(FetchModelsRequest {
                api_key: credentials.api_key.clone(),
                base_url: credentials.base_url.clone(),
                name: endpoint.to_string(),
                user: user_id.to_string(),
                cache_key: cache_key.clone(),
                proxy: self.env.get(PROXY).map(str::to_string),
            })
            .await?;
        self.token_cache.get(&cache_key).await
    }
}
