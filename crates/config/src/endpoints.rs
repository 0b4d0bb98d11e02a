use tracing::debug;

use crate::{
    error::{Error, Result},
    schema::{AppConfig, CustomEndpointBlock},
};

/// Canonical form of an endpoint name for matching.
///
/// Ollama is commonly written with arbitrary capitalization, so every case
/// variant maps to `ollama`. Other names are returned as-is.
pub fn normalize_endpoint_name(name: &str) -> &str {
    if name.eq_ignore_ascii_case("ollama") {
        "ollama"
    } else {
        name
    }
}

/// Find the custom endpoint block declared under `endpoint`.
///
/// Returns `Ok(None)` when the endpoint is simply not declared and
/// [`Error::ConfigNotFound`] when there is no application config at all. The
/// first block in declaration order wins when several normalize to the same
/// name.
pub fn find_custom_endpoint<'a>(
    endpoint: &str,
    config: Option<&'a AppConfig>,
) -> Result<Option<&'a CustomEndpointBlock>> {
    let config = config.ok_or_else(|| Error::ConfigNotFound {
        endpoint: endpoint.to_string(),
    })?;
    let wanted = normalize_endpoint_name(endpoint);

    let mut matches = config
        .endpoints
        .custom
        .iter()
        .filter(|block| normalize_endpoint_name(&block.name) == wanted);
    let found = matches.next();

    let shadowed = matches.count();
    if shadowed > 0 {
        debug!(
            endpoint = %wanted,
            shadowed,
            "duplicate custom endpoint names; using the first declared"
        );
    }

    Ok(found)
}
