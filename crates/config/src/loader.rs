use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    error::{Context, Error, Result},
    schema::AppConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "switchyard.toml",
    "switchyard.yaml",
    "switchyard.yml",
    "switchyard.json",
];

/// Load config from the given path (any supported format).
///
/// Placeholders are kept as written; they are resolved per request so that
/// an unset variable surfaces as an error on the endpoint that needs it.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./switchyard.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/switchyard/switchyard.{toml,yaml,yml,json}` (user-global)
///
/// Returns `None` when no file exists or the file fails to parse; lookups
/// against a missing config report `ConfigNotFound`.
pub fn discover_and_load() -> Option<AppConfig> {
    let search_dirs = std::iter::once(PathBuf::from(".")).chain(config_dir());
    discover_in(search_dirs)
}

/// Load the first config file found in `dirs`, checked in order.
fn discover_in(dirs: impl IntoIterator<Item = PathBuf>) -> Option<AppConfig> {
    let Some(path) = find_config_file(dirs) else {
        debug!("no config file found");
        return None;
    };
    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config");
            None
        },
    }
}

fn find_config_file(dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/switchyard/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "switchyard").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<AppConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            ext: ext.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::CredentialField};

    #[test]
    fn loads_yaml_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switchyard.yaml");
        std::fs::write(
            &path,
            r#"
endpoints:
  custom:
    - name: "OpenRouter"
      apiKey: "${OPENROUTER_KEY}"
      baseURL: "https://openrouter.ai/api/v1"
      models:
        default: ["meta-llama/llama-3-70b-instruct"]
        fetch: true
      headers:
        X-Title: "switchyard"
balance:
  enabled: true
  startBalance: 1000
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        let block = &cfg.endpoints.custom[0];
        assert_eq!(
            block.api_key,
            CredentialField::Placeholder("OPENROUTER_KEY".into())
        );
        assert_eq!(block.headers["X-Title"], "switchyard");
        assert_eq!(cfg.balance.unwrap().start_balance, Some(1000));
    }

    #[test]
    fn loads_toml_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switchyard.toml");
        std::fs::write(
            &path,
            r#"
[transactions]
enabled = false

[[endpoints.custom]]
name = "Groq"
apiKey = "user_provided"
baseURL = "https://api.groq.com/openai/v1"
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert!(cfg.endpoints.custom[0].api_key.is_user_provided());
        assert_eq!(cfg.transactions.unwrap().enabled, Some(false));
        assert!(cfg.balance.is_none());
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switchyard.ini");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { ext }) if ext == "ini"
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/switchyard.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/switchyard.toml"));
    }

    #[test]
    fn discovery_prefers_earlier_dirs() {
        let local = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();
        std::fs::write(
            local.path().join("switchyard.json"),
            r#"{"endpoints":{"custom":[{"name":"Local","apiKey":"k","baseURL":"http://l"}]}}"#,
        )
        .unwrap();
        std::fs::write(
            global.path().join("switchyard.toml"),
            "[[endpoints.custom]]\nname = \"Global\"\napiKey = \"k\"\nbaseURL = \"http://g\"\n",
        )
        .unwrap();

        let dirs = [local.path().to_path_buf(), global.path().to_path_buf()];
        let cfg = discover_in(dirs.clone()).unwrap();
        assert_eq!(cfg.endpoints.custom[0].name, "Local");

        let cfg = discover_in([dirs[1].clone()]).unwrap();
        assert_eq!(cfg.endpoints.custom[0].name, "Global");
    }

    #[test]
    fn discovery_yields_none_for_missing_or_broken_files() {
        let empty = tempfile::tempdir().unwrap();
        assert!(discover_in([empty.path().to_path_buf()]).is_none());

        let broken = tempfile::tempdir().unwrap();
        std::fs::write(broken.path().join("switchyard.yaml"), "endpoints: [").unwrap();
        assert!(discover_in([broken.path().to_path_buf()]).is_none());
    }
}
