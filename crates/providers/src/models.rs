//! Model discovery for custom endpoints.
//!
//! A [`ModelFetcher`] asks a provider which models it serves. Fetchers that
//! learn token rates along the way write them to the [`TokenConfigCache`]
//! under the key they were handed; the initializer re-reads the cache after
//! fetching.

use std::{fmt, sync::Arc};

use {
    async_trait::async_trait,
    dashmap::DashMap,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::Value,
    switchyard_common::redact::REDACTED,
    switchyard_config::{ModelTokenRates, TokenConfig},
    tracing::{debug, info},
};

use crate::{
    error::{Error, Result},
    shared_http_client,
    token_cache::TokenConfigCache,
};

/// Inputs for one model listing call.
#[derive(Clone)]
pub struct FetchModelsRequest {
    pub api_key: Secret<String>,
    pub base_url: String,
    /// Endpoint name as requested.
    pub name: String,
    pub user: String,
    /// Where fetched token rates must be stored.
    pub cache_key: String,
    /// Outbound proxy for the listing call, from `PROXY`.
    pub proxy: Option<String>,
}

impl fmt::Debug for FetchModelsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchModelsRequest")
            .field("api_key", &REDACTED)
            .field("base_url", &self.base_url)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("cache_key", &self.cache_key)
            .field("proxy", &self.proxy)
            .finish()
    }
}

#[async_trait]
pub trait ModelFetcher: Send + Sync {
    /// List model ids, storing any token rates under `request.cache_key`.
    async fn fetch_models(&self, request: FetchModelsRequest) -> Result<Vec<String>>;
}

/// Fetches `GET {base_url}/models` from an OpenAI-compatible provider.
///
/// Entries carrying OpenRouter-style `pricing` (USD per token) and
/// `context_length` become token rates per million tokens. Requests carrying
/// a proxy go through a client built once per proxy URL.
pub struct HttpModelFetcher {
    client: reqwest::Client,
    proxied: DashMap<String, reqwest::Client>,
    cache: Arc<dyn TokenConfigCache>,
}

impl HttpModelFetcher {
    pub fn new(cache: Arc<dyn TokenConfigCache>) -> Self {
        Self::with_client(shared_http_client().clone(), cache)
    }

    pub fn with_client(client: reqwest::Client, cache: Arc<dyn TokenConfigCache>) -> Self {
        Self {
            client,
            proxied: DashMap::new(),
            cache,
        }
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<reqwest::Client> {
        let Some(proxy) = proxy else {
            return Ok(self.client.clone());
        };
        if let Some(client) = self.proxied.get(proxy) {
            return Ok(client.clone());
        }
        let client = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all(proxy)?)
            .build()?;
        self.proxied.insert(proxy.to_string(), client.clone());
        Ok(client)
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    pricing: Option<Pricing>,
    #[serde(default)]
    context_length: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Pricing {
    #[serde(default)]
    prompt: Value,
    #[serde(default)]
    completion: Value,
}

/// Prices arrive as strings (`"0.000002"`) or numbers depending on provider.
///
/// Negative prices mean "variable" (OpenRouter reports `-1` for
/// `openrouter/auto`) and are treated as unknown.
fn price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (price >= 0.0).then_some(price)
}

fn token_config_from(models: &[ModelEntry]) -> TokenConfig {
    models
        .iter()
        .filter_map(|model| {
            let pricing = model.pricing.as_ref()?;
            let rates = ModelTokenRates {
                prompt: price(&pricing.prompt)? * 1_000_000.0,
                completion: price(&pricing.completion)? * 1_000_000.0,
                context: model.context_length.unwrap_or_default(),
            };
            Some((model.id.clone(), rates))
        })
        .collect()
}

#[async_trait]
impl ModelFetcher for HttpModelFetcher {
    async fn fetch_models(&self, request: FetchModelsRequest) -> Result<Vec<String>> {
        let url = format!("{}/models", request.base_url.trim_end_matches('/'));
        debug!(endpoint = %request.name, %url, "fetching model list");

        let resp = self
            .client_for(request.proxy.as_deref())?
            .get(&url)
            .bearer_auth(request.api_key.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::upstream(format!(
                "{} model listing returned HTTP {status}: {body}",
                request.name
            )));
        }

        let list: ModelList = resp.json().await?;
        let token_config = token_config_from(&list.data);
        if !token_config.is_empty() {
            self.cache.set(&request.cache_key, token_config).await?;
        }

        let ids: Vec<String> = list.data.into_iter().map(|m| m.id).collect();
        info!(endpoint = %request.name, models = ids.len(), "fetched model list");
        Ok(ids)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::token_cache::MemoryTokenConfigCache, rstest::rstest};

    fn request(base_url: &str, cache_key: &str) -> FetchModelsRequest {
        FetchModelsRequest {
            api_key: Secret::new("sk-test".to_string()),
            base_url: base_url.to_string(),
            name: "OpenRouter".into(),
            user: "u1".into(),
            cache_key: cache_key.into(),
            proxy: None,
        }
    }

    #[rstest]
    #[case(serde_json::json!("0.000002"), Some(0.000002))]
    #[case(serde_json::json!(0.5), Some(0.5))]
    #[case(serde_json::json!("0"), Some(0.0))]
    #[case(serde_json::json!("-1"), None)]
    #[case(serde_json::json!(-1), None)]
    #[case(serde_json::json!("free"), None)]
    #[case(Value::Null, None)]
    fn parses_prices(#[case] raw: Value, #[case] expected: Option<f64>) {
        assert_eq!(price(&raw), expected);
    }

    #[tokio::test]
    async fn stores_token_rates_under_cache_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/models")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "data": [
                        {
                            "id": "meta/llama-3-8b",
                            "pricing": { "prompt": "0.000001", "completion": "0.000002" },
                            "context_length": 8192
                        },
                        {
                            "id": "openrouter/auto",
                            "pricing": { "prompt": "-1", "completion": "-1" }
                        },
                        { "id": "no-pricing" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let cache = Arc::new(MemoryTokenConfigCache::new());
        let fetcher = HttpModelFetcher::new(cache.clone());
        let base_url = format!("{}/api/v1/", server.url());

        let ids = fetcher
            .fetch_models(request(&base_url, "OpenRouter:u1"))
            .await
            .unwrap();

        assert_eq!(ids, vec!["meta/llama-3-8b", "openrouter/auto", "no-pricing"]);
        let stored = cache.get("OpenRouter:u1").await.unwrap().unwrap();
        let rates = stored["meta/llama-3-8b"];
        assert!((rates.prompt - 1.0).abs() < 1e-9);
        assert!((rates.completion - 2.0).abs() < 1e-9);
        assert_eq!(rates.context, 8192);
        assert!(!stored.contains_key("no-pricing"));
        assert!(!stored.contains_key("openrouter/auto"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn listing_without_pricing_leaves_cache_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"gpt-4o-mini"}]}"#)
            .create_async()
            .await;

        let cache = Arc::new(MemoryTokenConfigCache::new());
        let fetcher = HttpModelFetcher::new(cache.clone());

        let ids = fetcher
            .fetch_models(request(&server.url(), "X"))
            .await
            .unwrap();

        assert_eq!(ids, vec!["gpt-4o-mini"]);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn http_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .with_status(401)
            .with_body("bad key")
            .create_async()
            .await;

        let fetcher = HttpModelFetcher::new(Arc::new(MemoryTokenConfigCache::new()));
        let err = fetcher
            .fetch_models(request(&server.url(), "X"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upstream { .. }));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn routes_listing_through_proxy() {
        let mut proxy = mockito::Server::new_async().await;
        let mock = proxy
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":[{"id":"behind-proxy"}]}"#)
            .expect(2)
            .create_async()
            .await;

        let fetcher = HttpModelFetcher::new(Arc::new(MemoryTokenConfigCache::new()));
        let mut req = request("http://upstream.invalid/v1", "X");
        req.proxy = Some(proxy.url());

        let ids = fetcher.fetch_models(req.clone()).await.unwrap();
        assert_eq!(ids, vec!["behind-proxy"]);
        fetcher.fetch_models(req).await.unwrap();
        assert_eq!(fetcher.proxied.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_proxy_is_an_http_error() {
        let fetcher = HttpModelFetcher::new(Arc::new(MemoryTokenConfigCache::new()));
        let mut req = request("http://upstream.invalid/v1", "X");
        req.proxy = Some("not a proxy url".into());

        let err = fetcher.fetch_models(req).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
