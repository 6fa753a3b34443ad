use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pipeline::DurationBounds;

/// Client configuration: API endpoints plus the tunable pipeline constants.
/// Loaded from a TOML file in the platform config directory, every field
/// overridable through `MINDWELL_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend REST API.
    pub api_url: String,
    /// Public Overpass interpreter used for the psychologist lookup.
    pub overpass_url: String,
    /// Items per page in the discovery view.
    pub page_size: usize,
    /// Duration bucket cutoffs in minutes (short/medium boundary, medium/long boundary).
    pub duration_bounds: DurationBounds,
    /// Mean wellbeing score at or above which an EASY plan is suggested.
    pub plan_easy_threshold: f64,
    /// Mean wellbeing score at or above which an INTERMEDIATE plan is suggested.
    pub plan_intermediate_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            overpass_url: "https://overpass.kumi.systems/api/interpreter".to_string(),
            page_size: 12,
            duration_bounds: DurationBounds::default(),
            plan_easy_threshold: 7.0,
            plan_intermediate_threshold: 4.0,
        }
    }
}

impl Config {
    /// Load from the default config file (if present) and apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match default_config_path() {
            Ok(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file: {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config file: {}", path.display()))?
            }
            _ => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("MINDWELL_API_URL") {
            if !v.trim().is_empty() { self.api_url = v; }
        }
        if let Ok(v) = std::env::var("MINDWELL_OVERPASS_URL") {
            if !v.trim().is_empty() { self.overpass_url = v; }
        }
        if let Some(v) = env_parse("MINDWELL_PAGE_SIZE") {
            self.page_size = v;
        }
        if let Some(v) = env_parse("MINDWELL_SHORT_MAX_MIN") {
            self.duration_bounds.short_max = v;
        }
        if let Some(v) = env_parse("MINDWELL_MEDIUM_MAX_MIN") {
            self.duration_bounds.medium_max = v;
        }
        if let Some(v) = env_parse("MINDWELL_PLAN_EASY_THRESHOLD") {
            self.plan_easy_threshold = v;
        }
        if let Some(v) = env_parse("MINDWELL_PLAN_INTERMEDIATE_THRESHOLD") {
            self.plan_intermediate_threshold = v;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn default_config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "mindwell", "mindwell")
        .context("unable to determine config directory")?;
    Ok(proj.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_discovery_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.page_size, 12);
        assert_eq!(cfg.duration_bounds.short_max, 10);
        assert_eq!(cfg.duration_bounds.medium_max, 20);
    }

    #[test]
    fn every_field_has_an_env_override() {
        std::env::set_var("MINDWELL_API_URL", "https://env.example.org");
        std::env::set_var("MINDWELL_OVERPASS_URL", "https://op.example.org");
        std::env::set_var("MINDWELL_PAGE_SIZE", "24");
        std::env::set_var("MINDWELL_SHORT_MAX_MIN", "20");
        std::env::set_var("MINDWELL_MEDIUM_MAX_MIN", "40");
        std::env::set_var("MINDWELL_PLAN_EASY_THRESHOLD", "8.5");
        std::env::set_var("MINDWELL_PLAN_INTERMEDIATE_THRESHOLD", "3.5");

        let mut cfg = Config::default();
        cfg.apply_env();
        assert_eq!(cfg.api_url, "https://env.example.org");
        assert_eq!(cfg.overpass_url, "https://op.example.org");
        assert_eq!(cfg.page_size, 24);
        assert_eq!(cfg.duration_bounds.short_max, 20);
        assert_eq!(cfg.duration_bounds.medium_max, 40);
        assert_eq!(cfg.plan_easy_threshold, 8.5);
        assert_eq!(cfg.plan_intermediate_threshold, 3.5);

        for key in [
            "MINDWELL_API_URL",
            "MINDWELL_OVERPASS_URL",
            "MINDWELL_PAGE_SIZE",
            "MINDWELL_SHORT_MAX_MIN",
            "MINDWELL_MEDIUM_MAX_MIN",
            "MINDWELL_PLAN_EASY_THRESHOLD",
            "MINDWELL_PLAN_INTERMEDIATE_THRESHOLD",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let cfg: Config = toml::from_str("api_url = \"https://api.example.org\"").unwrap();
        assert_eq!(cfg.api_url, "https://api.example.org");
        assert_eq!(cfg.page_size, 12);
    }
}
