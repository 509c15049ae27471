//! Coach configuration from environment variables

use std::env;

use tracing::info;

use crate::error::CoachError;

/// Depth used when SEARCH_DEPTH is unset
pub const DEFAULT_SEARCH_DEPTH: u32 = 15;

const MAX_SEARCH_DEPTH: u32 = 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    /// Path to the UCI engine binary
    pub path: String,

    /// Fixed depth for every `go depth` request
    pub depth: u32,

    /// Engine `Threads` option
    pub threads: u32,

    /// Engine `Hash` option in MB
    pub hash_mb: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            path: "stockfish".to_string(),
            depth: DEFAULT_SEARCH_DEPTH,
            threads: 1,
            hash_mb: 64,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoachConfig {
    pub engine: EngineSettings,
}

impl CoachConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, CoachError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoachError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineSettings::default();

        let path = lookup("STOCKFISH_PATH")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(defaults.path);

        let depth = parse_var(&lookup, "SEARCH_DEPTH")?.unwrap_or(defaults.depth);
        let threads = parse_var(&lookup, "ENGINE_THREADS")?.unwrap_or(defaults.threads);
        let hash_mb = parse_var(&lookup, "ENGINE_HASH_MB")?.unwrap_or(defaults.hash_mb);

        let config = Self {
            engine: EngineSettings {
                path,
                depth,
                threads,
                hash_mb,
            },
        };
        config.validate()?;

        info!(engine = %config.engine.path, depth, "Coach config loaded");
        Ok(config)
    }

    /// Apply command line overrides on top of the environment.
    pub fn with_overrides(mut self, path: Option<String>, depth: Option<u32>) -> Result<Self, CoachError> {
        if let Some(path) = path {
            self.engine.path = path;
        }
        if let Some(depth) = depth {
            self.engine.depth = depth;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), CoachError> {
        if !(1..=MAX_SEARCH_DEPTH).contains(&self.engine.depth) {
            return Err(CoachError::Config(format!(
                "search depth must be between 1 and {MAX_SEARCH_DEPTH}, got {}",
                self.engine.depth
            )));
        }
        if self.engine.threads == 0 {
            return Err(CoachError::Config("ENGINE_THREADS must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Result<Option<u32>, CoachError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CoachError::Config(format!("{key} is not a number: '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CoachConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.engine.path, "stockfish");
        assert_eq!(config.engine.depth, 15);
        assert_eq!(config.engine.threads, 1);
        assert_eq!(config.engine.hash_mb, 64);
    }

    #[test]
    fn test_env_values() {
        let config = CoachConfig::from_lookup(lookup_from(&[
            ("STOCKFISH_PATH", "/opt/sf"),
            ("SEARCH_DEPTH", " 14 "),
            ("ENGINE_HASH_MB", "128"),
        ]))
        .unwrap();
        assert_eq!(config.engine.path, "/opt/sf");
        assert_eq!(config.engine.depth, 14);
        assert_eq!(config.engine.hash_mb, 128);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(matches!(
            CoachConfig::from_lookup(lookup_from(&[("SEARCH_DEPTH", "deep")])),
            Err(CoachError::Config(_))
        ));
        assert!(matches!(
            CoachConfig::from_lookup(lookup_from(&[("SEARCH_DEPTH", "0")])),
            Err(CoachError::Config(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = CoachConfig::default()
            .with_overrides(Some("sf16".into()), Some(10))
            .unwrap();
        assert_eq!(config.engine.path, "sf16");
        assert_eq!(config.engine.depth, 10);
        assert!(CoachConfig::default().with_overrides(None, Some(99)).is_err());
    }
}
