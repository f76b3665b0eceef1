use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

pub const UPSTREAM_ROOT: &str = "https://api.meetup.com/";
pub const GROUP_URL_NAME: &str = "Manchester-React-User-Group";
pub const DEFAULT_PORT: u16 = 4000;
// Upstream allows 30 requests every 10 seconds; stay below it.
pub const RATE_LIMIT_REQUESTS: u32 = 20;
pub const RATE_LIMIT_WINDOW_MS: u64 = 10_000;
pub const CACHE_DURATION_SECS: u64 = 60;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Deployment configuration, normally read from the process environment.
#[derive(Clone)]
pub struct Config {
    pub app_key: String,
    pub group_url_name: String,
    pub upstream_root: String,
    pub port: u16,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    /// When false every call is authorized with the application key.
    pub allow_user_tokens: bool,
}

impl Config {
    pub fn new(app_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            group_url_name: GROUP_URL_NAME.to_string(),
            upstream_root: UPSTREAM_ROOT.to_string(),
            port: DEFAULT_PORT,
            rate_limit_requests: RATE_LIMIT_REQUESTS,
            rate_limit_window: Duration::from_millis(RATE_LIMIT_WINDOW_MS),
            cache_ttl: Duration::from_secs(CACHE_DURATION_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            allow_user_tokens: true,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup, applying defaults for
    /// everything except the application key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_key = lookup("MEETUP_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("MEETUP_KEY"))?;
        let mut config = Config::new(app_key);

        if let Some(group) = lookup("GROUP_URL_NAME") {
            config.group_url_name = group;
        }
        if let Some(root) = lookup("UPSTREAM_ROOT") {
            config.upstream_root = root;
        }
        if !config.upstream_root.ends_with('/') {
            config.upstream_root.push('/');
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(requests) = parse_var::<u32, _>(&lookup, "RATE_LIMIT_REQUESTS")? {
            if requests == 0 {
                return Err(ConfigError::Zero("RATE_LIMIT_REQUESTS"));
            }
            config.rate_limit_requests = requests;
        }
        if let Some(window) = parse_var::<u64, _>(&lookup, "RATE_LIMIT_WINDOW_MS")? {
            if window == 0 {
                return Err(ConfigError::Zero("RATE_LIMIT_WINDOW_MS"));
            }
            config.rate_limit_window = Duration::from_millis(window);
        }
        if let Some(ttl) = parse_var(&lookup, "CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(ttl);
        }
        if let Some(timeout) = parse_var(&lookup, "REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(allow) = parse_var(&lookup, "ALLOW_USER_TOKENS")? {
            config.allow_user_tokens = allow;
        }

        Ok(config)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_key", &"<redacted>")
            .field("group_url_name", &self.group_url_name)
            .field("upstream_root", &self.upstream_root)
            .field("port", &self.port)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("cache_ttl", &self.cache_ttl)
            .field("request_timeout", &self.request_timeout)
            .field("allow_user_tokens", &self.allow_user_tokens)
            .finish()
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_apply() {
        let config = Config::from_lookup(lookup(&[("MEETUP_KEY", "APPKEY")])).unwrap();
        assert_eq!(config.app_key, "APPKEY");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.upstream_root, UPSTREAM_ROOT);
        assert_eq!(config.rate_limit_requests, RATE_LIMIT_REQUESTS);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert!(config.allow_user_tokens);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let err = Config::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MEETUP_KEY")));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = Config::from_lookup(lookup(&[
            ("MEETUP_KEY", "APPKEY"),
            ("UPSTREAM_ROOT", "http://localhost:9000"),
            ("PORT", "8080"),
            ("RATE_LIMIT_REQUESTS", "30"),
            ("RATE_LIMIT_WINDOW_MS", "5000"),
            ("ALLOW_USER_TOKENS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.upstream_root, "http://localhost:9000/");
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit_requests, 30);
        assert_eq!(config.rate_limit_window, Duration::from_millis(5000));
        assert!(!config.allow_user_tokens);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Config::from_lookup(lookup(&[("MEETUP_KEY", "k"), ("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = Config::from_lookup(lookup(&[("MEETUP_KEY", "k"), ("RATE_LIMIT_REQUESTS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Zero("RATE_LIMIT_REQUESTS")));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::new("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
