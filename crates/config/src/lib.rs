//! Application configuration for custom endpoints: schema, environment
//! snapshot, `${ENV_VAR}` placeholders, endpoint lookup and the
//! balance/transactions policy.
//!
//! Config files: `switchyard.toml`, `switchyard.yaml` or `switchyard.json`,
//! searched in `./` then `~/.config/switchyard/`.

pub mod balance;
pub mod endpoints;
pub mod env;
pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    balance::{BalancePolicy, TransactionsPolicy, is_enabled, resolve_balance, resolve_transactions},
    endpoints::{find_custom_endpoint, normalize_endpoint_name},
    env::EnvSnapshot,
    env_subst::{contains_placeholder, is_placeholder, resolve_placeholder, substitute_env},
    error::{Error, Result},
    loader::{config_dir, discover_and_load, load_config},
    schema::{
        AppConfig, BalanceConfig, CredentialField, CustomEndpointBlock, ModelTokenRates,
        TokenConfig, TransactionsConfig, USER_PROVIDED,
    },
};
