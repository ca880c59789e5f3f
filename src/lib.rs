//! lucid-relay - a CORS-aware chat-completion relay
//!
//! This library sits between a browser-based survey front end and an OpenAI compatible
//! chat-completions API. It gates every request through a CORS policy engine, relays
//! validated chat requests upstream with the server-held key, and normalizes the result.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use bon::Builder;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{info, instrument};

pub mod client;
pub mod cors;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod relay;
pub mod status_page;

use client::{HttpClient, HyperClient, PoolSettings};
use cors::{OriginPolicy, RELAY_PATHS, cors_gate};
use handlers::{relay_handler, root};
use relay::UpstreamSettings;

/// Request bodies above this size are rejected with `413 PAYLOAD_TOO_LARGE`.
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Everything loaded once at startup. Read-only afterwards.
#[derive(Debug, Clone, Default, Builder)]
pub struct RelayConfig {
    #[builder(default)]
    pub policy: OriginPolicy,
    #[builder(default)]
    pub upstream: UpstreamSettings,
    /// Host the relay is deployed under, shown on the status page.
    #[builder(into)]
    pub deployment_url: Option<String>,
}

/// The main application state containing the HTTP client and the startup configuration
#[derive(Clone, Debug)]
pub struct AppState<T: HttpClient> {
    pub http_client: T,
    pub policy: Arc<OriginPolicy>,
    pub upstream: Arc<UpstreamSettings>,
    pub deployment_url: Option<Arc<str>>,
}

impl AppState<HyperClient> {
    /// Create a new AppState with the default Hyper client
    pub fn new(config: RelayConfig, pool: PoolSettings) -> Self {
        Self::with_client(config, client::create_hyper_client(pool))
    }
}

impl<T: HttpClient> AppState<T> {
    /// Create a new AppState with a custom HTTP client (useful for testing)
    pub fn with_client(config: RelayConfig, http_client: T) -> Self {
        Self {
            http_client,
            policy: Arc::new(config.policy),
            upstream: Arc::new(config.upstream),
            deployment_url: config.deployment_url.map(Arc::from),
        }
    }
}

/// Build the main router for the relay
/// This creates routes for:
/// - `/` - Status page with the URL to paste into the survey
/// - `/lucid` and `/chatgolem` - Relays chat requests upstream
///
/// Every route sits behind the CORS gate, which also answers preflights.
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + Clone + Send + Sync + 'static>(state: AppState<T>) -> Router {
    info!("Building router");
    let policy = Arc::clone(&state.policy);
    let router = RELAY_PATHS
        .into_iter()
        .fold(
            Router::<AppState<T>>::new().route("/", get(root)),
            |router, path| router.route(path, post(relay_handler)),
        );
    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(middleware::from_fn_with_state(policy, cors_gate))
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
///
/// # Parameters
/// - `prefix`: A string prefix for the metrics, which can be either a string literal or an owned string.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .enable_response_body_size(true)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}
