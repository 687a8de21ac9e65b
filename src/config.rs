//! Layered settings.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, `IMGPROXY_DOCTOR_*` environment variables, and finally the
//! command line (applied by the binary).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::history::DEFAULT_API_METHODS;
use crate::data::reports::DEFAULT_GATEWAY;
use crate::data::{CounterResetPolicy, RateBasis};
use crate::error::Result;
use crate::source::{HttpSource, SamplerConfig};

/// Prefix of environment overrides, e.g. `IMGPROXY_DOCTOR_ENDPOINT`.
pub const ENV_PREFIX: &str = "IMGPROXY_DOCTOR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the proxy; RPC calls are posted here.
    pub endpoint: String,
    pub metrics_path: String,
    pub info_path: String,
    pub jsonrpc_version: String,
    pub poll_interval_ms: u64,
    pub window_capacity: usize,
    pub request_timeout_ms: u64,
    pub rate_basis: RateBasis,
    pub counter_reset: CounterResetPolicy,
    /// RPC methods summed into "total requests".
    pub api_methods: Vec<String>,
    /// Documents described at start; `"*"` selects all.
    pub describe_urls: Vec<String>,
    /// Gateway prefix for document links.
    pub gateway: String,
    pub log_file: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081".to_string(),
            metrics_path: "/metrics".to_string(),
            info_path: "/info".to_string(),
            jsonrpc_version: "1.0.0".to_string(),
            poll_interval_ms: 5000,
            window_capacity: 60,
            request_timeout_ms: 10_000,
            rate_basis: RateBasis::Nominal,
            counter_reset: CounterResetPolicy::Rebaseline,
            api_methods: DEFAULT_API_METHODS.iter().map(|m| m.to_string()).collect(),
            describe_urls: vec!["*".to_string()],
            gateway: DEFAULT_GATEWAY.to_string(),
            log_file: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(
        path: Option<&Path>,
        env: Environment,
    ) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the sampler cannot run with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Message("endpoint must not be empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Message("poll_interval_ms must be positive".to_string()));
        }
        if self.window_capacity == 0 {
            return Err(ConfigError::Message("window_capacity must be positive".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            poll_interval: self.poll_interval(),
            window_capacity: self.window_capacity,
            rate_basis: self.rate_basis,
            counter_reset: self.counter_reset,
            api_methods: self.api_methods.clone(),
            describe_urls: self.describe_urls.clone(),
        }
    }

    pub fn http_source(&self) -> Result<HttpSource> {
        HttpSource::builder()
            .endpoint(&self.endpoint)
            .metrics_path(&self.metrics_path)
            .info_path(&self.info_path)
            .jsonrpc_version(&self.jsonrpc_version)
            .timeout(self.request_timeout())
            .build()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("api_methods")
        .with_list_parse_key("describe_urls")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        environment().source(Some(map))
    }

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn defaults_without_sources() {
        let settings = Settings::load_with_env(None, env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.poll_interval(), Duration::from_secs(5));
        assert_eq!(settings.api_methods.len(), 4);
    }

    #[test]
    fn file_overrides_defaults() {
        let file = toml_file(
            r#"
endpoint = "http://proxy:9000"
poll_interval_ms = 2000
rate_basis = "measured"
counter_reset = "clamp_to_zero"
"#,
        );
        let settings = Settings::load_with_env(Some(file.path()), env(&[])).unwrap();
        assert_eq!(settings.endpoint, "http://proxy:9000");
        assert_eq!(settings.poll_interval_ms, 2000);
        assert_eq!(settings.rate_basis, RateBasis::Measured);
        assert_eq!(settings.counter_reset, CounterResetPolicy::ClampToZero);
        assert_eq!(settings.window_capacity, 60);
    }

    #[test]
    fn environment_overrides_file() {
        let file = toml_file("poll_interval_ms = 2000\n");
        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[
                ("IMGPROXY_DOCTOR_POLL_INTERVAL_MS", "1000"),
                ("IMGPROXY_DOCTOR_API_METHODS", "img_proxy_fetch,img_proxy_describe"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.poll_interval_ms, 1000);
        assert_eq!(settings.api_methods, vec!["img_proxy_fetch", "img_proxy_describe"]);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let file = toml_file("poll_interval_ms = 0\n");
        let err = Settings::load_with_env(Some(file.path()), env(&[])).unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn sampler_config_follows_settings() {
        let settings = Settings {
            window_capacity: 12,
            rate_basis: RateBasis::Measured,
            ..Settings::default()
        };
        let config = settings.sampler_config();
        assert_eq!(config.window_capacity, 12);
        assert_eq!(config.rate_basis, RateBasis::Measured);
        assert_eq!(config.describe_urls, vec!["*"]);
        assert!(settings.http_source().is_ok());
    }
}
