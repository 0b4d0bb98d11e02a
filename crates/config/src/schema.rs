/// Config schema types: custom endpoints, balance, transactions, file paths.
use std::{borrow::Cow, collections::BTreeMap, fmt};

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    switchyard_common::redact_secret,
};

/// Sentinel credential value: the real secret is stored per user.
pub const USER_PROVIDED: &str = "user_provided";

/// Root configuration, assembled once at startup and shared read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub endpoints: EndpointsConfig,
    /// `None` means the declarative source said nothing about balances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<BalanceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<TransactionsConfig>,
    pub paths: FilePaths,
    pub file_strategy: FileStrategy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Custom endpoints in declaration order. Order matters for lookup.
    pub custom: Vec<CustomEndpointBlock>,
}

/// One declared OpenAI-compatible provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEndpointBlock {
    pub name: String,
    pub api_key: CredentialField,
    #[serde(rename = "baseURL")]
    pub base_url: CredentialField,
    #[serde(default)]
    pub models: ModelsConfig,
    /// Extra request parameters merged into every completion request.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub add_params: Map<String, Value>,
    /// Request parameters stripped before sending.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drop_params: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Static token rates. When present, fetched or cached rates are ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_config: Option<TokenConfig>,
    #[serde(default)]
    pub title_convo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_method: Option<String>,
    #[serde(default)]
    pub summarize: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_prompt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_display_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_endpoint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_rate: Option<u64>,
}

impl CustomEndpointBlock {
    /// Minimal block with the three required fields; everything else defaults.
    pub fn new(name: impl Into<String>, api_key: &str, base_url: &str) -> Self {
        Self {
            name: name.into(),
            api_key: CredentialField::parse(api_key),
            base_url: CredentialField::parse(base_url),
            models: ModelsConfig::default(),
            add_params: Map::new(),
            drop_params: Vec::new(),
            headers: BTreeMap::new(),
            token_config: None,
            title_convo: false,
            title_model: None,
            title_method: None,
            summarize: false,
            summary_model: None,
            force_prompt: None,
            model_display_label: None,
            direct_endpoint: None,
            stream_rate: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub default: Vec<String>,
    /// Ask the provider's `/models` listing for models and token rates.
    pub fetch: bool,
}

/// Raw credential as declared: a literal, an env placeholder or the
/// `user_provided` sentinel.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CredentialField {
    Literal(String),
    /// `${VAR}`; holds the variable name.
    Placeholder(String),
    UserProvided,
}

impl CredentialField {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == USER_PROVIDED {
            return Self::UserProvided;
        }
        match crate::env_subst::placeholder_name(trimmed) {
            Some(var) => Self::Placeholder(var.to_string()),
            None => Self::Literal(trimmed.to_string()),
        }
    }

    /// The declared text, suitable for placeholder resolution.
    pub fn raw(&self) -> Cow<'_, str> {
        match self {
            Self::Literal(value) => Cow::Borrowed(value),
            Self::Placeholder(var) => Cow::Owned(format!("${{{var}}}")),
            Self::UserProvided => Cow::Borrowed(USER_PROVIDED),
        }
    }

    pub fn is_user_provided(&self) -> bool {
        matches!(self, Self::UserProvided)
    }
}

impl From<String> for CredentialField {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<CredentialField> for String {
    fn from(value: CredentialField) -> Self {
        value.raw().into_owned()
    }
}

impl fmt::Debug for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f
                .debug_tuple("Literal")
                .field(&redact_secret(value))
                .finish(),
            Self::Placeholder(var) => f.debug_tuple("Placeholder").field(var).finish(),
            Self::UserProvided => f.write_str("UserProvided"),
        }
    }
}

/// Per-model token rates reported by a provider, keyed by model id.
pub type TokenConfig = BTreeMap<String, ModelTokenRates>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTokenRates {
    /// Price per million prompt tokens.
    pub prompt: f64,
    /// Price per million completion tokens.
    pub completion: f64,
    /// Context window in tokens.
    pub context: u64,
}

/// Declarative balance settings. Every field is optional so that the
/// environment can fill the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_balance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_refill_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refill_interval_value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refill_interval_unit: Option<RefillIntervalUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refill_amount: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefillIntervalUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Where uploaded and generated files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePaths {
    pub uploads: String,
    pub images: String,
}

impl Default for FilePaths {
    fn default() -> Self {
        Self {
            uploads: "uploads".into(),
            images: "public/images".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStrategy {
    #[default]
    Local,
    S3,
    AzureBlob,
}
