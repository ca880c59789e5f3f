//! Configuration parsing and validation for the relay server
//!
//! Everything is read once at startup from the command line or the environment
//! (the usual route on serverless hosts) and handed to the library as immutable
//! settings.
use anyhow::anyhow;
use clap::Parser;
use lucid_relay::{
    RelayConfig,
    client::PoolSettings,
    cors::OriginPolicy,
    relay::{ApiKey, DEFAULT_MODEL, DEFAULT_UPSTREAM_URL, UpstreamSettings},
};
use std::fmt;
use std::time::Duration;
use url::Url;

#[derive(Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port on which the relay will listen.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Comma separated origins allowed to call the relay. Unset or empty allows any origin.
    #[arg(long, env = "ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,

    /// Key used to authenticate against the upstream chat-completions API.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Older deployments set the key under this lowercase name.
    #[arg(long, env = "openai_api_key", hide = true, hide_env_values = true)]
    pub legacy_api_key: Option<String>,

    /// Model used when a request does not name one.
    #[arg(long, env = "LUCID_DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    pub default_model: String,

    /// Upstream chat-completions endpoint.
    #[arg(long, env = "LUCID_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: Url,

    /// Upper bound (in seconds) on a single upstream call, response body included.
    #[arg(long, env = "LUCID_UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Public host of this deployment, shown on the status page.
    #[arg(long, env = "VERCEL_URL")]
    pub deployment_url: Option<String>,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long, default_value_t = false)]
    pub metrics: bool,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "lucid")]
    pub metrics_prefix: String,

    /// Maximum number of idle HTTP connections to keep alive to the upstream.
    #[arg(long, default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("api_key", &self.resolved_api_key())
            .field("default_model", &self.default_model)
            .field("upstream_url", &self.upstream_url.as_str())
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("deployment_url", &self.deployment_url)
            .field("metrics", &self.metrics)
            .field("metrics_port", &self.metrics_port)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if self.upstream_timeout_secs == 0 {
            return Err(anyhow!("Upstream timeout must be at least one second"));
        }
        if !matches!(self.upstream_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Upstream URL '{}' must use http or https",
                self.upstream_url
            ));
        }
        if self.default_model.trim().is_empty() {
            return Err(anyhow!("Default model must not be empty"));
        }
        Ok(self)
    }

    /// The upstream key, preferring `OPENAI_API_KEY` over the legacy variable.
    pub fn resolved_api_key(&self) -> Option<ApiKey> {
        self.api_key
            .iter()
            .chain(self.legacy_api_key.iter())
            .find_map(|key| ApiKey::new(key.as_str()))
    }

    pub fn relay_config(&self) -> RelayConfig {
        let upstream = UpstreamSettings::builder()
            .url(self.upstream_url.clone())
            .timeout(Duration::from_secs(self.upstream_timeout_secs))
            .default_model(self.default_model.clone())
            .maybe_api_key(self.resolved_api_key())
            .build();

        RelayConfig::builder()
            .policy(OriginPolicy::parse(self.allowed_origins.as_deref()))
            .upstream(upstream)
            .maybe_deployment_url(self.deployment_url.clone())
            .build()
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings::builder()
            .idle_timeout(Duration::from_secs(self.pool_idle_timeout_secs))
            .max_idle_per_host(self.pool_max_idle_per_host)
            .build()
    }
}
