//! `${ENV_VAR}` placeholders in credential, URL and header values.
//!
//! Unresolved placeholders are left verbatim. Callers detect failure by
//! checking whether the *resolved* value still looks like a placeholder.

use crate::env::EnvSnapshot;

/// Variable name of a whole-value `${VAR}` placeholder.
pub(crate) fn placeholder_name(value: &str) -> Option<&str> {
    value
        .strip_prefix("${")?
        .strip_suffix('}')
        .filter(|name| !name.is_empty() && !name.contains(['$', '{', '}']))
}

/// Whether `value` is shaped like `${...}` from end to end.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.len() > 3 && value.starts_with("${") && value.ends_with('}')
}

/// Whether any well-formed `${VAR}` is still present anywhere in `value`.
///
/// A credential like `${A}-${B}` with only `A` set resolves to `left-${B}`;
/// this catches the leftover where [`is_placeholder`] does not.
pub fn contains_placeholder(value: &str) -> bool {
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let after_open = &rest[start + 2..];
        match after_open.find('}') {
            Some(end) if end > 0 => return true,
            Some(end) => rest = &after_open[end + 1..],
            None => return false,
        }
    }
    false
}

/// Resolve a raw config value against the environment.
///
/// A whole-value placeholder becomes the variable's value when it is set and
/// non-empty, otherwise the trimmed input comes back unchanged. Placeholders
/// embedded in longer values are substituted individually.
pub fn resolve_placeholder(raw: &str, env: &EnvSnapshot) -> String {
    let trimmed = raw.trim();
    if let Some(name) = placeholder_name(trimmed) {
        return env
            .get(name)
            .map_or_else(|| trimmed.to_string(), str::to_string);
    }
    substitute_env(trimmed, env)
}

/// Replace every `${VAR}` in `input` that the snapshot can satisfy.
pub fn substitute_env(input: &str, env: &EnvSnapshot) -> String {
    substitute_env_with(input, |name| env.get(name).map(str::to_string))
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find('}') else {
            // Unterminated, keep the tail as written.
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after_open[..end];
        match (!name.is_empty()).then(|| lookup(name)).flatten() {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after_open[end + 1..];
    }

    out.push_str(rest);
    out
}
