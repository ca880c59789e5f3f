/// Axum handlers for the relay server
use crate::{AppState, MAX_REQUEST_BODY_BYTES};
use crate::client::HttpClient;
use crate::errors::RelayError;
use crate::models::RelayResponse;
use crate::relay::relay;
use crate::status_page;
use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::Html,
};
use tracing::{info, instrument, warn};

/// Relays a chat request from the survey front end to the upstream.
///
/// CORS has already been decided by [`cors_gate`](crate::cors::cors_gate) by the time
/// this runs; errors are turned into the JSON envelope by [`RelayError`]'s
/// `IntoResponse`.
#[instrument(skip(state, body))]
pub async fn relay_handler<T: HttpClient + Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<RelayResponse>, RelayError> {
    let body = body.map_err(|rejection| {
        warn!(
            status = %rejection.status(),
            reason = %rejection.body_text(),
            "Could not read request body"
        );
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RelayError::PayloadTooLarge(MAX_REQUEST_BODY_BYTES)
        } else {
            RelayError::InvalidInput("Could not read request body.".to_owned())
        }
    })?;
    let response = relay(&state.http_client, &state.upstream, &body).await?;
    info!(
        used_temperature = response.used_temperature,
        used_seed = ?response.used_seed,
        "Relayed chat completion"
    );
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn root<T: HttpClient + Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
) -> Html<String> {
    info!("Status page requested");
    Html(status_page::render(state.deployment_url.as_deref()))
}
