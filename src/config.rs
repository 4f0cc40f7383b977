//! Optional config file loading. Search order: ./ebookscrape.toml, then
//! $XDG_CONFIG_HOME/ebookscrape/config.toml (or ~/.config/ebookscrape/config.toml).

use crate::scraper::MarkerConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Default output directory when -o is not set. Paths are relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// Site root, e.g. "https://www.ebooks.com".
    pub base_url: Option<String>,
    /// Path under the site root where subject listings live, e.g. "en-us/subjects".
    pub catalog_path: Option<String>,
    /// Query parameter carrying the 1-based listing page index.
    pub page_param: Option<String>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// HTTP Accept-Language header.
    pub accept_language: Option<String>,
    /// Delay in seconds between requests.
    pub request_delay_secs: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Attempts per request for transient failures (default 2).
    pub retry_count: Option<u32>,
    /// Delay in seconds before each retry (e.g. [2, 5]).
    pub retry_backoff_secs: Option<Vec<u64>>,
    /// Safety cap on listing pages per collection run.
    pub max_pages: Option<u32>,
    /// Entries missing a title or link: skip (default) or abort.
    pub parse_errors: Option<String>,
    /// Marker selector overrides. Unset markers keep their defaults.
    pub markers: Option<MarkerConfig>,
}

/// Search order: (1) ./ebookscrape.toml, (2) $XDG_CONFIG_HOME/ebookscrape/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("ebookscrape.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("ebookscrape").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            tracing::debug!(path = %path.display(), "loaded config");
            return Ok(Some(config));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let c: Config = toml::from_str("").unwrap();
        assert!(c.output_dir.is_none());
        assert!(c.base_url.is_none());
        assert!(c.user_agent.is_none());
        assert!(c.request_delay_secs.is_none());
        assert!(c.max_pages.is_none());
        assert!(c.parse_errors.is_none());
        assert!(c.markers.is_none());
    }

    #[test]
    fn parse_full_config() {
        let s = r#"
            output_dir = "out"
            base_url = "http://127.0.0.1:9000"
            catalog_path = "subjects"
            page_param = "pageNumber"
            user_agent = "Custom/1.0"
            accept_language = "en-GB"
            request_delay_secs = 3
            timeout_secs = 60
            retry_count = 3
            retry_backoff_secs = [1, 4]
            max_pages = 50
            parse_errors = "abort"

            [markers]
            entry = "li.result"
            price = "span.amount"
        "#;
        let c: Config = toml::from_str(s).unwrap();
        assert_eq!(c.output_dir.as_deref(), Some(std::path::Path::new("out")));
        assert_eq!(c.base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(c.catalog_path.as_deref(), Some("subjects"));
        assert_eq!(c.page_param.as_deref(), Some("pageNumber"));
        assert_eq!(c.user_agent.as_deref(), Some("Custom/1.0"));
        assert_eq!(c.accept_language.as_deref(), Some("en-GB"));
        assert_eq!(c.request_delay_secs, Some(3));
        assert_eq!(c.timeout_secs, Some(60));
        assert_eq!(c.retry_count, Some(3));
        assert_eq!(c.retry_backoff_secs.as_deref(), Some([1, 4].as_slice()));
        assert_eq!(c.max_pages, Some(50));
        assert_eq!(c.parse_errors.as_deref(), Some("abort"));
        let markers = c.markers.unwrap();
        assert_eq!(markers.entry, "li.result");
        assert_eq!(markers.price, "span.amount");
    }

    #[test]
    fn partial_markers_keep_defaults() {
        let c: Config = toml::from_str("[markers]\ntitle = \"h2\"").unwrap();
        let markers = c.markers.unwrap();
        let defaults = MarkerConfig::default();
        assert_eq!(markers.title, "h2");
        assert_eq!(markers.entry, defaults.entry);
        assert_eq!(markers.next_page, defaults.next_page);
    }

    #[test]
    fn parse_partial_config() {
        let c: Config = toml::from_str("request_delay_secs = 0").unwrap();
        assert_eq!(c.request_delay_secs, Some(0));
        assert!(c.timeout_secs.is_none());
    }

    #[test]
    fn invalid_toml_errors() {
        assert!(toml::from_str::<Config>("output_dir = [").is_err());
    }
}
