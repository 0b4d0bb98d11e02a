//! Credential resolution for custom endpoints.
//!
//! Each of the API key and base URL is either a literal, a `${VAR}` placeholder
//! or the `user_provided` sentinel. Sentinel values are looked up in the
//! per-user [`CredentialStore`], gated on the request's key expiry.

use std::fmt;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    dashmap::DashMap,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

use {
    switchyard_common::{redact::REDACTED, redact_secret},
    switchyard_config::{
        CredentialField, CustomEndpointBlock, EnvSnapshot, USER_PROVIDED, contains_placeholder,
        is_placeholder, resolve_placeholder,
    },
};

use crate::error::{CredentialKind, Error, ErrorPayload, Result};

/// Request-scoped identity used for per-user credential lookups.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user_id: String,
    /// RFC 3339 expiry of the user's stored key, sent along with the request.
    pub expires_at: Option<String>,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: impl Into<String>) -> Self {
        self.expires_at = Some(expires_at.into());
        self
    }
}

/// Secrets a user stored for one endpoint.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKeyValues {
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
    #[serde(default, rename = "baseURL")]
    pub base_url: Option<String>,
}

impl fmt::Debug for UserKeyValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserKeyValues")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Per-user credential storage. Only the query side lives here.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_user_key_values(&self, user_id: &str, name: &str) -> Result<UserKeyValues>;

    /// Fail with [`ErrorPayload::ExpiredUserKey`] once `expires_at` has passed.
    fn check_key_expiry(&self, expires_at: &str, endpoint: &str) -> Result<()> {
        check_key_expiry_at(expires_at, endpoint, Utc::now())
    }
}

/// Expiry check against an explicit clock. Timestamps that do not parse are
/// treated as expired.
pub fn check_key_expiry_at(expires_at: &str, endpoint: &str, now: DateTime<Utc>) -> Result<()> {
    let still_valid = DateTime::parse_from_rfc3339(expires_at)
        .map(|at| at.with_timezone(&Utc) >= now)
        .unwrap_or(false);
    if still_valid {
        return Ok(());
    }
    Err(ErrorPayload::ExpiredUserKey {
        expired_at: expires_at.to_string(),
        endpoint: endpoint.to_string(),
    }
    .into())
}

/// In-process credential store keyed by `(user_id, endpoint name)`.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    keys: DashMap<(String, String), UserKeyValues>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: &str, name: &str, values: UserKeyValues) {
        self.keys
            .insert((user_id.to_string(), name.to_string()), values);
    }

    pub fn remove(&self, user_id: &str, name: &str) -> Option<UserKeyValues> {
        self.keys
            .remove(&(user_id.to_string(), name.to_string()))
            .map(|(_, values)| values)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_user_key_values(&self, user_id: &str, name: &str) -> Result<UserKeyValues> {
        Ok(self
            .keys
            .get(&(user_id.to_string(), name.to_string()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

/// One credential after placeholder resolution.
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedCredential {
    Literal(String),
    /// Still `${VAR}` after resolution: the variable is unset.
    UnresolvedPlaceholder(String),
    UserProvided,
}

impl ResolvedCredential {
    pub fn resolve(field: &CredentialField, env: &EnvSnapshot) -> Self {
        let value = resolve_placeholder(&field.raw(), env);
        if is_placeholder(&value) || contains_placeholder(&value) {
            Self::UnresolvedPlaceholder(value)
        } else if value == USER_PROVIDED {
            Self::UserProvided
        } else {
            Self::Literal(value)
        }
    }
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f
                .debug_tuple("Literal")
                .field(&redact_secret(value))
                .finish(),
            Self::UnresolvedPlaceholder(raw) => {
                f.debug_tuple("UnresolvedPlaceholder").field(raw).finish()
            },
            Self::UserProvided => f.write_str("UserProvided"),
        }
    }
}

/// Final API key and base URL for an endpoint.
#[derive(Clone)]
pub struct ResolvedCredentials {
    pub api_key: Secret<String>,
    pub base_url: String,
    /// At least one value came from the per-user store.
    pub user_provided: bool,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("api_key", &REDACTED)
            .field("base_url", &self.base_url)
            .field("user_provided", &self.user_provided)
            .finish()
    }
}

/// Resolve both credentials of `block` for the requesting user.
///
/// The store is read at most once, and only when a field is `user_provided`.
pub async fn resolve_credentials(
    endpoint: &str,
    block: &CustomEndpointBlock,
    context: &RequestContext,
    env: &EnvSnapshot,
    store: &dyn CredentialStore,
) -> Result<ResolvedCredentials> {
    let api_key = ResolvedCredential::resolve(&block.api_key, env);
    let base_url = ResolvedCredential::resolve(&block.base_url, env);

    for (kind, credential) in [
        (CredentialKind::ApiKey, &api_key),
        (CredentialKind::BaseUrl, &base_url),
    ] {
        if matches!(credential, ResolvedCredential::UnresolvedPlaceholder(_)) {
            return Err(Error::MissingEnvVar {
                field: kind,
                endpoint: endpoint.to_string(),
            });
        }
    }

    let user_provided = api_key == ResolvedCredential::UserProvided
        || base_url == ResolvedCredential::UserProvided;

    let stored = if user_provided {
        if let Some(expires_at) = context.expires_at.as_deref() {
            store.check_key_expiry(expires_at, endpoint)?;
        }
        debug!(endpoint, user_id = %context.user_id, "reading user-provided credentials");
        Some(store.get_user_key_values(&context.user_id, endpoint).await?)
    } else {
        None
    };
    let stored = stored.unwrap_or_default();

    let api_key = finalize(
        CredentialKind::ApiKey,
        api_key,
        stored.api_key.as_ref().map(|key| key.expose_secret().as_str()),
        endpoint,
    )?;
    let base_url = finalize(
        CredentialKind::BaseUrl,
        base_url,
        stored.base_url.as_deref(),
        endpoint,
    )?;

    Ok(ResolvedCredentials {
        api_key: Secret::new(api_key),
        base_url,
        user_provided,
    })
}

fn finalize(
    kind: CredentialKind,
    credential: ResolvedCredential,
    stored: Option<&str>,
    endpoint: &str,
) -> Result<String> {
    match credential {
        ResolvedCredential::UserProvided => stored
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                let payload = match kind {
                    CredentialKind::ApiKey => ErrorPayload::NoUserKey,
                    CredentialKind::BaseUrl => ErrorPayload::NoBaseUrl,
                };
                payload.into()
            }),
        ResolvedCredential::Literal(value) if value.is_empty() => {
            let endpoint = endpoint.to_string();
            Err(match kind {
                CredentialKind::ApiKey => Error::MissingApiKey { endpoint },
                CredentialKind::BaseUrl => Error::MissingBaseUrl { endpoint },
            })
        },
        ResolvedCredential::Literal(value) => Ok(value),
        ResolvedCredential::UnresolvedPlaceholder(_) => Err(Error::MissingEnvVar {
            field: kind,
            endpoint: endpoint.to_string(),
        }),
    }
}
