use crate::reference::SourceKind;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OLS_URL: &str = "https://www.ebi.ac.uk/ols4";

const CONFIG_PATH_ENV: &str = "OAK_MCP_CONFIG";

/// Runtime settings for the ontology search core.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OakConfig {
    /// Result count used when a call does not pass one.
    pub default_limit: usize,
    /// Largest result count a call may request.
    pub max_limit: usize,
    /// Minimum number of candidates fetched from a backend before ranking.
    pub candidate_pool: usize,
    /// Hard cap on candidates fetched from a backend in one call.
    pub max_fetch: usize,
    pub query_timeout_ms: u64,
    pub open_timeout_ms: u64,
    pub default_source: SourceKind,
    pub ols_base_url: String,
    /// Directory holding `<name>.db` Semantic-SQL files for `sqlite:obo:<name>`.
    pub semsql_dir: PathBuf,
}

impl Default for OakConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
            candidate_pool: 25,
            max_fetch: 100,
            query_timeout_ms: 30_000,
            open_timeout_ms: 30_000,
            default_source: SourceKind::Ols,
            ols_base_url: DEFAULT_OLS_URL.to_string(),
            semsql_dir: default_semsql_dir(),
        }
    }
}

fn default_semsql_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".data").join("oaklib"))
        .unwrap_or_else(|| PathBuf::from(".data/oaklib"))
}

impl OakConfig {
    /// Defaults, overlaid by the TOML file named in `OAK_MCP_CONFIG`, overlaid by `OAK_MCP_*` env.
    pub fn load() -> Result<Self> {
        let mut config = match env_value(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(env_value);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw)
            .with_context(|| format!("Config file {} is not valid TOML", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        Ok(config)
    }

    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        override_parsed(&mut self.default_limit, "OAK_MCP_DEFAULT_LIMIT", &lookup);
        override_parsed(&mut self.max_limit, "OAK_MCP_MAX_LIMIT", &lookup);
        override_parsed(&mut self.query_timeout_ms, "OAK_MCP_TIMEOUT_MS", &lookup);
        if let Some(tag) = lookup("OAK_MCP_DEFAULT_SOURCE") {
            match SourceKind::from_tag(&tag) {
                Some(source) => self.default_source = source,
                None => log::warn!(
                    "Unknown OAK_MCP_DEFAULT_SOURCE '{tag}', keeping '{}'",
                    self.default_source
                ),
            }
        }
        if let Some(url) = lookup("OAK_MCP_OLS_URL") {
            self.ols_base_url = url;
        }
        if let Some(dir) = lookup("OAK_MCP_SEMSQL_DIR") {
            self.semsql_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_limit == 0 {
            anyhow::bail!("max_limit must be at least 1");
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            anyhow::bail!(
                "default_limit must be within 1..={} (got {})",
                self.max_limit,
                self.default_limit
            );
        }
        if self.max_fetch < self.max_limit {
            anyhow::bail!(
                "max_fetch ({}) must not be smaller than max_limit ({})",
                self.max_fetch,
                self.max_limit
            );
        }
        if self.query_timeout_ms == 0 || self.open_timeout_ms == 0 {
            anyhow::bail!("timeouts must be positive");
        }
        if self.ols_base_url.trim().is_empty() {
            anyhow::bail!("ols_base_url must not be empty");
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    /// Number of candidates to request from a backend for a call asking for `n` results.
    pub fn fetch_limit(&self, n: usize) -> usize {
        n.max(self.candidate_pool).min(self.max_fetch).max(n)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn override_parsed<T: std::str::FromStr>(
    slot: &mut T,
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => log::warn!("Ignoring {key}='{raw}': not a valid number"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = OakConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.max_limit, 50);
        assert_eq!(config.default_source, SourceKind::Ols);
    }

    #[test]
    fn toml_overlays_defaults() {
        let config = OakConfig::from_toml(
            r#"
max_limit = 20
default_source = "sqlite"
semsql_dir = "/srv/semsql"
"#,
        )
        .expect("parse");
        assert_eq!(config.max_limit, 20);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.default_source, SourceKind::Sqlite);
        assert_eq!(config.semsql_dir, PathBuf::from("/srv/semsql"));
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        assert!(OakConfig::from_toml("max_limt = 3").is_err());
    }

    #[test]
    fn env_overrides_and_ignores_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OAK_MCP_MAX_LIMIT", "7"),
            ("OAK_MCP_DEFAULT_LIMIT", "seven"),
            ("OAK_MCP_OLS_URL", "http://localhost:8080"),
            ("OAK_MCP_DEFAULT_SOURCE", "nope"),
        ]);
        let mut config = OakConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.max_limit, 7);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.ols_base_url, "http://localhost:8080");
        assert_eq!(config.default_source, SourceKind::Ols);
        assert!(config.validate().is_err(), "default_limit > max_limit");
    }

    #[test]
    fn fetch_limit_overfetches_within_cap() {
        let config = OakConfig::default();
        assert_eq!(config.fetch_limit(2), 25);
        assert_eq!(config.fetch_limit(40), 40);
        let tight = OakConfig {
            candidate_pool: 500,
            ..OakConfig::default()
        };
        assert_eq!(tight.fetch_limit(3), 100);
    }
}
