//! CORS policy engine
//!
//! Decides, per request, whether an origin may talk to the relay and which
//! `Access-Control-*` headers go on the response. The decision functions are pure
//! functions of the request head and the configured [`OriginPolicy`]; [`cors_gate`]
//! is the only piece that touches a live request.
use crate::errors::RelayError;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Paths served by the relay handler. `/chatgolem` is kept for older survey builds.
pub const RELAY_PATHS: [&str; 2] = ["/lucid", "/chatgolem"];

const ROOT_PATH: &str = "/";
const WILDCARD: &str = "*";
const DEFAULT_ALLOWED_HEADERS: &str = "Content-Type";
const ALLOWED_METHODS: &str = "POST, OPTIONS";
const PREFLIGHT_MAX_AGE_SECS: &str = "86400";
const PREFLIGHT_DENIED_BODY: &str = "Origin not permitted for CORS preflight";

pub fn is_relay_path(path: &str) -> bool {
    RELAY_PATHS.contains(&path)
}

/// The set of origins allowed to call the relay, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Any origin, answered with `Access-Control-Allow-Origin: *` and never with credentials.
    #[default]
    Any,
    /// Only origins that exactly match one of these entries.
    List(BTreeSet<String>),
}

impl OriginPolicy {
    /// Parses a comma separated allow-list such as `ALLOWED_ORIGINS`.
    ///
    /// Entries are trimmed and empty entries dropped. An unset or empty list, or one
    /// containing `*`, allows any origin.
    pub fn parse(raw: Option<&str>) -> Self {
        let origins: BTreeSet<String> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        if origins.is_empty() {
            warn!("No allowed origins configured, CORS will allow any origin ('*')");
            return Self::Any;
        }
        if origins.contains(WILDCARD) {
            info!("Allowed origins contain '*', CORS will allow any origin");
            return Self::Any;
        }

        info!(origins = ?origins, "CORS configured with {} allowed origins", origins.len());
        Self::List(origins)
    }

    fn reflect(&self, origin: Option<&str>) -> Option<AllowOrigin> {
        match self {
            OriginPolicy::Any => Some(AllowOrigin::Any),
            OriginPolicy::List(origins) => origin
                .filter(|origin| origins.contains(*origin))
                .map(|origin| AllowOrigin::Exact(origin.to_owned())),
        }
    }
}

/// The value reflected in `Access-Control-Allow-Origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowOrigin {
    Any,
    Exact(String),
}

impl AllowOrigin {
    pub fn as_str(&self) -> &str {
        match self {
            AllowOrigin::Any => WILDCARD,
            AllowOrigin::Exact(origin) => origin,
        }
    }
}

/// Outcome of matching a request against the [`OriginPolicy`].
///
/// Credentials are derived from the reflected origin, so a wildcard origin with
/// credentials cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsDecision {
    Denied,
    Allowed {
        origin: AllowOrigin,
        allowed_headers: String,
    },
}

impl CorsDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CorsDecision::Allowed { .. })
    }

    pub fn origin_to_reflect(&self) -> Option<&str> {
        match self {
            CorsDecision::Allowed { origin, .. } => Some(origin.as_str()),
            CorsDecision::Denied => None,
        }
    }

    pub fn allow_credentials(&self) -> bool {
        matches!(
            self,
            CorsDecision::Allowed {
                origin: AllowOrigin::Exact(_),
                ..
            }
        )
    }

    pub fn allowed_headers(&self) -> Option<&str> {
        match self {
            CorsDecision::Allowed {
                allowed_headers, ..
            } => Some(allowed_headers),
            CorsDecision::Denied => None,
        }
    }

    /// Adds the response annotations for an allowed decision. Denied decisions add nothing.
    pub fn apply(&self, headers: &mut HeaderMap) {
        let Some(origin) = self.origin_to_reflect() else {
            return;
        };
        let Ok(origin) = HeaderValue::from_str(origin) else {
            warn!(origin, "Reflected origin is not a valid header value, skipping CORS headers");
            return;
        };

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
        if self.allow_credentials() {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }

    /// Builds the canned answer to a preflight: `204` with the full header set, or a
    /// bare `403` with a plaintext body.
    pub fn into_preflight_response(self) -> Response {
        if !self.is_allowed() {
            return (StatusCode::FORBIDDEN, PREFLIGHT_DENIED_BODY).into_response();
        }

        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        let headers = response.headers_mut();
        self.apply(headers);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECS),
        );
        let allowed_headers = self
            .allowed_headers()
            .and_then(|value| HeaderValue::from_str(value).ok())
            .unwrap_or(HeaderValue::from_static(DEFAULT_ALLOWED_HEADERS));
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allowed_headers);
        response
    }
}

fn decide(
    origin: Option<&str>,
    requested_headers: Option<&str>,
    policy: &OriginPolicy,
) -> CorsDecision {
    match policy.reflect(origin) {
        Some(origin) => CorsDecision::Allowed {
            origin,
            allowed_headers: requested_headers
                .unwrap_or(DEFAULT_ALLOWED_HEADERS)
                .to_owned(),
        },
        None => CorsDecision::Denied,
    }
}

/// Decides a preflight. Returns `None` unless this is an `OPTIONS` request for a
/// relay endpoint.
pub fn decide_preflight(
    method: &Method,
    path: &str,
    origin: Option<&str>,
    requested_headers: Option<&str>,
    policy: &OriginPolicy,
) -> Option<CorsDecision> {
    if *method != Method::OPTIONS || !is_relay_path(path) {
        return None;
    }
    Some(decide(origin, requested_headers, policy))
}

/// Decides the headers for a real (non-preflight) response.
pub fn decide_response_headers(origin: Option<&str>, policy: &OriginPolicy) -> CorsDecision {
    decide(origin, None, policy)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Middleware gating every request by origin before it is routed.
///
/// - `OPTIONS` on a relay path is answered here and never reaches a handler.
/// - Other requests to a relay path from a denied origin get `403` without CORS headers.
/// - Allowed relay responses and the root page are annotated with the decision.
/// - Everything else passes through untouched.
pub async fn cors_gate(
    State(policy): State<Arc<OriginPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    let origin = header_str(req.headers(), &header::ORIGIN).map(str::to_owned);
    let requested_headers =
        header_str(req.headers(), &header::ACCESS_CONTROL_REQUEST_HEADERS).map(str::to_owned);
    let path = req.uri().path().to_owned();

    if let Some(decision) = decide_preflight(
        req.method(),
        &path,
        origin.as_deref(),
        requested_headers.as_deref(),
        &policy,
    ) {
        if decision.is_allowed() {
            debug!(path = %path, origin = ?origin, "Preflight allowed");
        } else {
            warn!(path = %path, origin = ?origin, "Preflight denied by origin policy");
        }
        return decision.into_preflight_response();
    }

    let relay = is_relay_path(&path);
    if !relay && path != ROOT_PATH {
        return next.run(req).await;
    }

    let decision = decide_response_headers(origin.as_deref(), &policy);
    if relay && !decision.is_allowed() {
        warn!(path = %path, origin = ?origin, "Request denied by origin policy");
        return RelayError::OriginDenied.into_response();
    }

    debug!(
        path = %path,
        origin = ?origin,
        credentials = decision.allow_credentials(),
        "Origin allowed"
    );
    let mut response = next.run(req).await;
    decision.apply(response.headers_mut());
    response
}
