use std::env;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PLANNER_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Application configuration loaded from environment variables.
/// A `.env` file in the working directory is read first when present.
#[derive(Debug, Clone)]
pub struct Config {
    // Planning service
    pub ai_api_key: String,
    pub ai_base_url: String,
    pub planner_model: String,

    // Video search
    pub youtube_api_key: String,
    pub youtube_base_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| get(key).ok_or_else(|| anyhow!("{key} environment variable is required"));

        let web_port = match get("WEB_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("WEB_PORT must be a port number, got {raw:?}"))?,
            None => 3000,
        };

        Ok(Self {
            ai_api_key: required("AI_API_KEY")?,
            ai_base_url: get("AI_BASE_URL").unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
            planner_model: get("PLANNER_MODEL")
                .unwrap_or_else(|| DEFAULT_PLANNER_MODEL.to_string()),
            youtube_api_key: required("YOUTUBE_API_KEY")?,
            youtube_base_url: get("YOUTUBE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_YOUTUBE_BASE_URL.to_string()),
            web_host: get("WEB_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            web_port,
        })
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().count().min(5);
            let head: String = val.chars().take(n).collect();
            format!("{}...({} chars)", head, val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  AI_API_KEY: {}", preview(&self.ai_api_key));
        tracing::info!("  AI_BASE_URL: {}", self.ai_base_url);
        tracing::info!("  PLANNER_MODEL: {}", self.planner_model);
        tracing::info!("  YOUTUBE_API_KEY: {}", preview(&self.youtube_api_key));
        tracing::info!("  YOUTUBE_BASE_URL: {}", self.youtube_base_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config =
            Config::from_lookup(lookup(&[("AI_API_KEY", "sk-1"), ("YOUTUBE_API_KEY", "yt-1")]))
                .unwrap();
        assert_eq!(config.ai_base_url, DEFAULT_AI_BASE_URL);
        assert_eq!(config.planner_model, DEFAULT_PLANNER_MODEL);
        assert_eq!(config.youtube_base_url, DEFAULT_YOUTUBE_BASE_URL);
        assert_eq!(config.web_host, "0.0.0.0");
        assert_eq!(config.web_port, 3000);
    }

    #[test]
    fn missing_required_key_is_named() {
        let err = Config::from_lookup(lookup(&[("AI_API_KEY", "sk-1")])).unwrap_err();
        assert!(err.to_string().contains("YOUTUBE_API_KEY"));
    }

    #[test]
    fn blank_required_key_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[("AI_API_KEY", "  "), ("YOUTUBE_API_KEY", "yt")]))
            .unwrap_err();
        assert!(err.to_string().contains("AI_API_KEY"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("AI_API_KEY", "sk-1"),
            ("YOUTUBE_API_KEY", "yt-1"),
            ("WEB_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("WEB_PORT"));
    }

    #[test]
    fn overrides_are_respected() {
        let config = Config::from_lookup(lookup(&[
            ("AI_API_KEY", "sk-1"),
            ("YOUTUBE_API_KEY", "yt-1"),
            ("PLANNER_MODEL", "gemini-2.5-flash"),
            ("WEB_PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.planner_model, "gemini-2.5-flash");
        assert_eq!(config.web_port, 8080);
    }
}
