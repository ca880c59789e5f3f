//! HTTP client used to reach the upstream chat-completions API
//!
//! The relay talks to the upstream through the [`HttpClient`] trait so tests can swap
//! in a mock that records requests and returns canned responses.
use async_trait::async_trait;
use axum::response::IntoResponse;
use bon::Builder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use std::time::Duration;

pub type HyperClient = Client<
    hyper_tls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    axum::body::Body,
>;

pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

#[async_trait]
pub trait HttpClient: std::fmt::Debug {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, ClientError>;
}

#[async_trait]
impl HttpClient for HyperClient {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, ClientError> {
        self.request(req)
            .await
            .map(|res| res.into_response())
            .map_err(|e| Box::new(e) as ClientError)
    }
}

/// Connection pool tuning for the upstream client.
#[derive(Debug, Clone, Copy, Builder)]
pub struct PoolSettings {
    /// How long idle connections are kept alive.
    #[builder(default = Duration::from_secs(90))]
    pub idle_timeout: Duration,
    /// Maximum number of idle connections kept per upstream host.
    #[builder(default = 100)]
    pub max_idle_per_host: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub fn create_hyper_client(pool: PoolSettings) -> HyperClient {
    let https = hyper_tls::HttpsConnector::new();

    tracing::debug!(
        "HTTP client pool config: idle_timeout={:?}, max_idle_per_host={}",
        pool.idle_timeout,
        pool.max_idle_per_host
    );

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(pool.idle_timeout)
        .pool_max_idle_per_host(pool.max_idle_per_host)
        .pool_timer(hyper_util::rt::TokioTimer::new())
        .build(https)
}
