//! Client-wide configuration.
//!
//! `origin` plays the role of the calling page's location: relative URLs are
//! joined against it and same-origin targets always send credentials.
//! `fetch_available` models whether the promise-based transport exists in
//! the running environment; when it is false every call goes through the
//! legacy transport.

use url::Url;

use crate::error::ConfigError;
use crate::transport::Capabilities;

pub const ORIGIN_VAR: &str = "UNIFETCH_ORIGIN";
pub const DISABLE_FETCH_VAR: &str = "UNIFETCH_DISABLE_FETCH";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub origin: Option<Url>,
    pub fetch_available: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: None,
            fetch_available: true,
        }
    }
}

impl ClientConfig {
    pub fn with_origin(mut self, origin: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(origin).map_err(|e| ConfigError::InvalidOrigin(origin.to_string(), e))?;
        self.origin = Some(url);
        Ok(self)
    }

    pub fn fetch_available(mut self, available: bool) -> Self {
        self.fetch_available = available;
        self
    }

    /// Read `UNIFETCH_ORIGIN` and `UNIFETCH_DISABLE_FETCH` from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(origin) = lookup(ORIGIN_VAR).filter(|v| !v.is_empty()) {
            config = config.with_origin(&origin)?;
        }
        if let Some(flag) = lookup(DISABLE_FETCH_VAR) {
            config.fetch_available = !matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            fetch: self.fetch_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.origin.is_none());
        assert!(config.fetch_available);
    }

    #[test]
    fn reads_origin_and_fetch_flag() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ORIGIN_VAR, "http://app.local:8080"),
            (DISABLE_FETCH_VAR, "true"),
        ]))
        .unwrap();
        assert_eq!(config.origin.unwrap().host_str(), Some("app.local"));
        assert!(!config.fetch_available);
    }

    #[test]
    fn bad_origin_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ORIGIN_VAR, "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin(_, _)));
    }
}
