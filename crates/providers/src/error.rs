use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-matchable failure kinds for per-user credentials.
///
/// Rendered as JSON (`{"type":"no_user_key"}`) so clients can branch on the
/// kind and prompt the user for a key instead of showing free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorPayload {
    NoUserKey,
    NoBaseUrl,
    ExpiredUserKey {
        #[serde(rename = "expiredAt")]
        expired_at: String,
        endpoint: String,
    },
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Which of the two endpoint credentials an error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ApiKey,
    BaseUrl,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ApiKey => "API Key",
            Self::BaseUrl => "Base URL",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config not found for the {endpoint} custom endpoint.")]
    ConfigNotFound { endpoint: String },

    /// A `${VAR}` credential whose variable is unset.
    #[error("Missing {field} for {endpoint}.")]
    MissingEnvVar {
        field: CredentialKind,
        endpoint: String,
    },

    #[error("{0}")]
    UserKey(ErrorPayload),

    #[error("{endpoint} API key not provided.")]
    MissingApiKey { endpoint: String },

    #[error("{endpoint} Base URL not provided.")]
    MissingBaseUrl { endpoint: String },

    #[error(transparent)]
    Config(switchyard_config::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Failure reported by an external collaborator, passed through as-is.
    #[error("{source}")]
    Upstream {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn upstream(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Upstream {
            source: source.into(),
        }
    }

    /// The structured kind, for errors that carry one.
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            Self::UserKey(payload) => Some(payload),
            _ => None,
        }
    }
}

impl From<ErrorPayload> for Error {
    fn from(payload: ErrorPayload) -> Self {
        Self::UserKey(payload)
    }
}

impl From<switchyard_config::Error> for Error {
    fn from(err: switchyard_config::Error) -> Self {
        match err {
            switchyard_config::Error::ConfigNotFound { endpoint } => {
                Self::ConfigNotFound { endpoint }
            },
            other => Self::Config(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_renders_as_tagged_json() {
        assert_eq!(
            Error::from(ErrorPayload::NoUserKey).to_string(),
            r#"{"type":"no_user_key"}"#
        );
        let expired = ErrorPayload::ExpiredUserKey {
            expired_at: "2024-01-01T00:00:00Z".into(),
            endpoint: "X".into(),
        };
        let value: serde_json::Value = serde_json::from_str(&expired.to_string()).unwrap();
        assert_eq!(value["type"], "expired_user_key");
        assert_eq!(value["expiredAt"], "2024-01-01T00:00:00Z");
        assert_eq!(value["endpoint"], "X");
    }

    #[test]
    fn missing_env_var_names_field_and_endpoint() {
        let err = Error::MissingEnvVar {
            field: CredentialKind::BaseUrl,
            endpoint: "X".into(),
        };
        assert_eq!(err.to_string(), "Missing Base URL for X.");
        assert!(err.payload().is_none());
    }

    #[test]
    fn config_not_found_maps_through() {
        let err: Error = switchyard_config::Error::ConfigNotFound {
            endpoint: "X".into(),
        }
        .into();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }
}
