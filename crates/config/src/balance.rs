//! Balance and transactions policy.
//!
//! Balance settings come from two places: the legacy `CHECK_BALANCE` /
//! `START_BALANCE` environment variables and the declarative `balance` block.
//! The declarative block wins field by field. Transactions must be recorded
//! whenever balances are tracked, whatever the transactions block says.

use {
    serde::{Deserialize, Serialize},
    tracing::warn,
};

use crate::{
    env::{CHECK_BALANCE, EnvSnapshot, START_BALANCE},
    schema::{AppConfig, BalanceConfig, RefillIntervalUnit},
};

/// Effective balance settings after merging environment and config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePolicy {
    pub enabled: bool,
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

/// Effective transactions setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsPolicy {
    pub enabled: bool,
}

impl Default for TransactionsPolicy {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Boolean-like environment value: `true` in any case, surrounding whitespace ignored.
pub fn is_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Integer prefix of `raw` (`"20000.5"` gives `20000`), `None` without one.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let unsigned = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let end = raw.len() - unsigned.len() + digits;
    if digits == 0 {
        return None;
    }
    raw[..end].parse().ok()
}

fn env_balance_defaults(env: &EnvSnapshot) -> BalancePolicy {
    BalancePolicy {
        enabled: is_enabled(env.get(CHECK_BALANCE)),
        start_balance: env.get(START_BALANCE).and_then(leading_integer),
        ..BalancePolicy::default()
    }
}

fn overlay(mut base: BalancePolicy, declared: &BalanceConfig) -> BalancePolicy {
    if let Some(enabled) = declared.enabled {
        base.enabled = enabled;
    }
    base.start_balance = declared.start_balance.or(base.start_balance);
    base.auto_refill_enabled = declared.auto_refill_enabled.or(base.auto_refill_enabled);
    base.refill_interval_value = declared.refill_interval_value.or(base.refill_interval_value);
    base.refill_interval_unit = declared.refill_interval_unit.or(base.refill_interval_unit);
    base.refill_amount = declared.refill_amount.or(base.refill_amount);
    base
}

/// Merge environment-derived balance defaults with the declarative block.
pub fn resolve_balance(env: &EnvSnapshot, config: Option<&AppConfig>) -> BalancePolicy {
    let defaults = env_balance_defaults(env);
    match config.and_then(|cfg| cfg.balance.as_ref()) {
        Some(declared) => overlay(defaults, declared),
        None => defaults,
    }
}

/// Resolve the transactions policy, forcing it on while balances are tracked.
pub fn resolve_transactions(env: &EnvSnapshot, config: Option<&AppConfig>) -> TransactionsPolicy {
    let (policy, forced) = reconcile_transactions(env, config);
    if forced {
        warn!(
            "balance tracking is enabled but transactions are disabled; enabling transactions"
        );
    }
    policy
}

/// Returns the effective policy and whether the declared value was overridden.
pub(crate) fn reconcile_transactions(
    env: &EnvSnapshot,
    config: Option<&AppConfig>,
) -> (TransactionsPolicy, bool) {
    let Some(config) = config else {
        return (TransactionsPolicy::default(), false);
    };
    let declared = config
        .transactions
        .as_ref()
        .and_then(|t| t.enabled)
        .unwrap_or(true);

    if !declared && resolve_balance(env, Some(config)).enabled {
        return (TransactionsPolicy { enabled: true }, true);
    }
    (TransactionsPolicy { enabled: declared }, false)
}
