use std::{collections::HashMap, fmt};

/// Enables balance tracking when set to `true`.
pub const CHECK_BALANCE: &str = "CHECK_BALANCE";
/// Starting balance for new users, as an integer.
pub const START_BALANCE: &str = "START_BALANCE";
/// Outbound proxy handed to every endpoint client.
pub const PROXY: &str = "PROXY";

/// Point-in-time view of environment variables.
///
/// A variable counts as set only when it is present and non-empty. Resolvers
/// take a snapshot instead of reading the process environment so that tests
/// can supply their own.
#[derive(Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Non-UTF-8 entries are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// Values are secrets more often than not; only show how many there are.
impl fmt::Debug for EnvSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSnapshot")
            .field("vars", &self.vars.len())
            .finish()
    }
}
