//! The upstream relay
//!
//! Turns a raw request body into an upstream chat-completion call and maps whatever
//! comes back onto [`UpstreamResult`]. A request moves through
//! `Received -> Parsed -> ConfigChecked -> UpstreamCalled -> Responded`; every step can
//! bail out with a [`RelayError`] and nothing is retried.
use crate::client::HttpClient;
use crate::errors::RelayError;
use crate::models::{
    ChatCompletion, ChatMessage, ChatRequest, RelayResponse, Role, UpstreamErrorBody,
    UpstreamPayload, Usage,
};
use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode, header},
};
use bon::Builder;
use serde_json::{Map, Value};
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
/// Largest upstream response body the relay will buffer.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;
const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;

/// The server-held upstream key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for an empty or blank key, which counts as not configured.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(<redacted>, len={})", self.0.len())
    }
}

/// Where and how the relay reaches the upstream.
#[derive(Debug, Clone, Builder)]
pub struct UpstreamSettings {
    #[builder(default = default_upstream_url())]
    pub url: Url,
    #[builder(default = DEFAULT_UPSTREAM_TIMEOUT)]
    pub timeout: Duration,
    /// Used when the front end does not name a model.
    #[builder(into, default = DEFAULT_MODEL.to_owned())]
    pub default_model: String,
    #[builder(default = DEFAULT_MAX_RESPONSE_BYTES)]
    pub max_response_bytes: usize,
    /// Missing keys are reported per request, not at startup.
    pub api_key: Option<ApiKey>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_upstream_url() -> Url {
    Url::parse(DEFAULT_UPSTREAM_URL).expect("default upstream URL should be valid")
}

/// Parameters sent upstream after lenient resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedParameters {
    pub temperature: f64,
    pub seed: Option<i64>,
}

/// A successful upstream completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<Usage>,
}

pub type UpstreamResult = Result<Completion, RelayError>;

fn invalid(message: impl Into<String>) -> RelayError {
    RelayError::InvalidInput(message.into())
}

/// Parses and validates a raw request body.
pub fn parse_request(body: &[u8]) -> Result<ChatRequest, RelayError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| RelayError::InvalidJson(e.to_string()))?;
    let Value::Object(mut body) = value else {
        return Err(invalid("Request body must be a JSON object."));
    };

    let messages = match body.remove("messages") {
        Some(Value::Array(messages)) if !messages.is_empty() => messages,
        Some(Value::Array(_)) => return Err(invalid("'messages' list cannot be empty.")),
        _ => {
            return Err(invalid(
                "Missing or invalid 'messages' field (must be a list).",
            ));
        }
    };
    let messages = messages
        .into_iter()
        .enumerate()
        .map(|(index, message)| parse_message(index, message))
        .collect::<Result<Vec<_>, _>>()?;

    let model = match body.remove("model") {
        None | Some(Value::Null) => None,
        Some(Value::String(model)) if model.trim().is_empty() => None,
        Some(Value::String(model)) => Some(model),
        Some(_) => return Err(invalid("'model' must be a string.")),
    };

    Ok(ChatRequest {
        model,
        messages,
        temperature: take_present(&mut body, "temperature"),
        seed: take_present(&mut body, "seed"),
    })
}

fn take_present(body: &mut Map<String, Value>, key: &str) -> Option<Value> {
    body.remove(key).filter(|value| !value.is_null())
}

fn parse_message(index: usize, message: Value) -> Result<ChatMessage, RelayError> {
    let Value::Object(mut message) = message else {
        return Err(invalid(format!("Message {index} must be an object.")));
    };
    let role = message
        .get("role")
        .and_then(Value::as_str)
        .and_then(Role::parse)
        .ok_or_else(|| invalid(format!("Invalid or missing 'role' in message {index}.")))?;
    let Some(Value::String(content)) = message.remove("content") else {
        return Err(invalid(format!(
            "Invalid or missing 'content' in message {index}."
        )));
    };
    Ok(ChatMessage { role, content })
}

/// Resolves temperature and seed. Bad values fall back with a warning instead of failing.
pub fn resolve_parameters(request: &ChatRequest) -> ResolvedParameters {
    ResolvedParameters {
        temperature: resolve_temperature(request.temperature.as_ref()),
        seed: resolve_seed(request.seed.as_ref()),
    }
}

fn resolve_temperature(raw: Option<&Value>) -> f64 {
    let Some(raw) = raw else {
        return DEFAULT_TEMPERATURE;
    };
    let parsed = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(temperature) if TEMPERATURE_RANGE.contains(&temperature) => temperature,
        Some(temperature) => {
            warn!(temperature, "Temperature out of range, using default {DEFAULT_TEMPERATURE}");
            DEFAULT_TEMPERATURE
        }
        None => {
            warn!(
                temperature = %raw,
                "Invalid temperature format, using default {DEFAULT_TEMPERATURE}"
            );
            DEFAULT_TEMPERATURE
        }
    }
}

fn resolve_seed(raw: Option<&Value>) -> Option<i64> {
    let raw = raw?;
    let parsed = match raw {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|seed| seed.fract() == 0.0 && seed.abs() < i64::MAX as f64)
                .map(|seed| seed as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        warn!(seed = %raw, "Invalid seed format, leaving seed unset");
    }
    parsed
}

/// Sends one chat completion upstream and classifies the outcome.
///
/// The timeout covers the whole exchange, response body included.
#[instrument(skip(client, settings, api_key, messages), fields(upstream = %settings.url))]
pub async fn call_upstream<T: HttpClient>(
    client: &T,
    settings: &UpstreamSettings,
    api_key: &ApiKey,
    model: &str,
    messages: &[ChatMessage],
    params: ResolvedParameters,
) -> UpstreamResult {
    let payload = UpstreamPayload {
        model,
        messages,
        temperature: params.temperature,
        seed: params.seed,
    };
    let body = serde_json::to_vec(&payload).map_err(|e| {
        error!(error = %e, "Failed to serialize upstream payload");
        RelayError::InternalError(e.to_string())
    })?;

    let request = Request::builder()
        .method(Method::POST)
        .uri(settings.url.as_str())
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", api_key.expose()),
        )
        .body(Body::from(body))
        .map_err(|e| {
            error!(error = %e, "Failed to build upstream request");
            RelayError::InternalError(e.to_string())
        })?;

    debug!(
        messages = messages.len(),
        temperature = params.temperature,
        seed = ?params.seed,
        "Sending chat completion upstream"
    );

    let exchange = async {
        let response = client.request(request).await.map_err(|e| {
            error!(error = %e, "Network error talking to upstream");
            RelayError::NetworkError(e.to_string())
        })?;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), settings.max_response_bytes)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    limit = settings.max_response_bytes,
                    "Failed to read upstream response body"
                );
                RelayError::NetworkError(e.to_string())
            })?;
        Ok::<_, RelayError>((status, body))
    };

    let (status, body) = match tokio::time::timeout(settings.timeout, exchange).await {
        Ok(exchange) => exchange?,
        Err(_) => {
            warn!(timeout = ?settings.timeout, "Upstream request timed out");
            return Err(RelayError::Timeout(settings.timeout));
        }
    };

    info!(status = status.as_u16(), "Upstream responded");
    interpret_response(status, &body)
}

fn interpret_response(status: StatusCode, body: &[u8]) -> UpstreamResult {
    if status != StatusCode::OK {
        let details = upstream_error_details(body);
        error!(status = status.as_u16(), details = %details, "Upstream returned an error");
        return Err(RelayError::UpstreamError {
            status: status.as_u16(),
            details,
        });
    }

    let completion: ChatCompletion = serde_json::from_slice(body).map_err(|e| {
        error!(
            error = %e,
            body = %String::from_utf8_lossy(body),
            "Unexpected upstream response format"
        );
        RelayError::MalformedUpstreamResponse
    })?;
    let Some(choice) = completion.choices.into_iter().next() else {
        error!("Upstream response has no choices");
        return Err(RelayError::MalformedUpstreamResponse);
    };

    if let Some(usage) = completion.usage {
        info!(
            prompt_tokens = usage.prompt,
            completion_tokens = usage.completion,
            total_tokens = usage.total,
            "Upstream usage"
        );
    }

    Ok(Completion {
        text: choice.message.content,
        usage: completion.usage,
    })
}

/// The upstream's own error message when the body is an OpenAI style error, else the raw body.
fn upstream_error_details(body: &[u8]) -> String {
    serde_json::from_slice::<UpstreamErrorBody>(body)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned())
}

/// Runs one relay request from raw body to the front end's success body.
pub async fn relay<T: HttpClient>(
    client: &T,
    settings: &UpstreamSettings,
    body: &[u8],
) -> Result<RelayResponse, RelayError> {
    debug!("Received request body of size: {}", body.len());
    let request = parse_request(body).inspect_err(|e| warn!(error = %e, "Rejected chat input"))?;

    let Some(api_key) = settings.api_key.as_ref() else {
        error!("Upstream API key is not configured");
        return Err(RelayError::ConfigurationError);
    };

    let params = resolve_parameters(&request);
    let model = request
        .model
        .as_deref()
        .unwrap_or(settings.default_model.as_str());
    info!(
        model,
        temperature = params.temperature,
        seed = ?params.seed,
        "Relaying chat request"
    );

    let completion = call_upstream(
        client,
        settings,
        api_key,
        model,
        &request.messages,
        params,
    )
    .await?;

    Ok(RelayResponse {
        generated_text: completion.text,
        used_temperature: params.temperature,
        used_seed: params.seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockHttpClient;
    use rstest::rstest;
    use serde_json::json;

    const STUB_COMPLETION: &str = r#"{
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello from the stub"}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
    }"#;

    fn settings() -> UpstreamSettings {
        UpstreamSettings::builder()
            .url("https://api.example.com/v1/chat/completions".parse().unwrap())
            .maybe_api_key(ApiKey::new("sk-test-key"))
            .build()
    }

    fn request_with(temperature: Option<Value>, seed: Option<Value>) -> ChatRequest {
        ChatRequest {
            model: None,
            messages: vec![ChatMessage {
                role: Role::User,
                content: "Hi".into(),
            }],
            temperature,
            seed,
        }
    }

    fn user_messages() -> Vec<ChatMessage> {
        vec![ChatMessage {
            role: Role::User,
            content: "Hello".into(),
        }]
    }

    fn defaults() -> ResolvedParameters {
        ResolvedParameters {
            temperature: 1.0,
            seed: None,
        }
    }

    #[test]
    fn test_parse_valid_request() {
        let body = json!({
            "model": "gpt-3.5-turbo",
            "messages": [
                {"role": "system", "content": "Be brief."},
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello!"}
            ],
            "temperature": 0.4,
            "seed": 7
        });
        let request = parse_request(body.to_string().as_bytes()).unwrap();
        assert_eq!(request.model.as_deref(), Some("gpt-3.5-turbo"));
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[2].role, Role::Assistant);
        assert_eq!(request.temperature, Some(json!(0.4)));
        assert_eq!(request.seed, Some(json!(7)));
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"{not json".as_slice())]
    #[case(b"\xff\xfe{}".as_slice())]
    fn test_parse_rejects_invalid_json(#[case] body: &[u8]) {
        assert!(matches!(
            parse_request(body),
            Err(RelayError::InvalidJson(_))
        ));
    }

    #[rstest]
    #[case(json!([1, 2, 3]))]
    #[case(json!({}))]
    #[case(json!({"messages": []}))]
    #[case(json!({"messages": "hello"}))]
    #[case(json!({"messages": ["hello"]}))]
    #[case(json!({"messages": [{"content": "hi"}]}))]
    #[case(json!({"messages": [{"role": "tool", "content": "hi"}]}))]
    #[case(json!({"messages": [{"role": 1, "content": "hi"}]}))]
    #[case(json!({"messages": [{"role": "user"}]}))]
    #[case(json!({"messages": [{"role": "user", "content": 5}]}))]
    #[case(json!({"messages": [{"role": "user", "content": "ok"}, {"role": "user", "content": null}]}))]
    #[case(json!({"model": 4, "messages": [{"role": "user", "content": "hi"}]}))]
    fn test_parse_rejects_invalid_input(#[case] body: Value) {
        assert!(matches!(
            parse_request(body.to_string().as_bytes()),
            Err(RelayError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_treats_null_and_blank_fields_as_absent() {
        let body = json!({
            "model": " ",
            "messages": [{"role": "user", "content": ""}],
            "temperature": null,
            "seed": null
        });
        let request = parse_request(body.to_string().as_bytes()).unwrap();
        assert_eq!(request.model, None);
        assert_eq!(request.temperature, None);
        assert_eq!(request.seed, None);
        assert_eq!(request.messages[0].content, "");
    }

    #[rstest]
    #[case(None, 1.0)]
    #[case(Some(json!(0.0)), 0.0)]
    #[case(Some(json!(2.0)), 2.0)]
    #[case(Some(json!(0.7)), 0.7)]
    #[case(Some(json!(1)), 1.0)]
    #[case(Some(json!("1.3")), 1.3)]
    #[case(Some(json!(2.5)), 1.0)]
    #[case(Some(json!(-0.1)), 1.0)]
    #[case(Some(json!("warm")), 1.0)]
    #[case(Some(json!("NaN")), 1.0)]
    #[case(Some(json!(true)), 1.0)]
    #[case(Some(json!([0.5])), 1.0)]
    fn test_resolve_temperature(#[case] raw: Option<Value>, #[case] expected: f64) {
        let params = resolve_parameters(&request_with(raw, None));
        assert_eq!(params.temperature, expected);
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(json!(42)), Some(42))]
    #[case(Some(json!(-3)), Some(-3))]
    #[case(Some(json!(42.0)), Some(42))]
    #[case(Some(json!(" 99 ")), Some(99))]
    #[case(Some(json!(4.2)), None)]
    #[case(Some(json!("4.2")), None)]
    #[case(Some(json!("abc")), None)]
    #[case(Some(json!(u64::MAX)), None)]
    #[case(Some(json!({"seed": 1})), None)]
    fn test_resolve_seed(#[case] raw: Option<Value>, #[case] expected: Option<i64>) {
        let params = resolve_parameters(&request_with(None, raw));
        assert_eq!(params.seed, expected);
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(json!(0.0)), Some(json!(12)))]
    #[case(Some(json!(2.5)), Some(json!("x")))]
    #[case(Some(json!("1.9")), Some(json!("314")))]
    #[case(Some(json!(1.1)), Some(json!(-8.0)))]
    fn test_resolve_parameters_is_idempotent(
        #[case] temperature: Option<Value>,
        #[case] seed: Option<Value>,
    ) {
        let first = resolve_parameters(&request_with(temperature, seed));
        let fed_back = request_with(Some(json!(first.temperature)), first.seed.map(|s| json!(s)));
        assert_eq!(resolve_parameters(&fed_back), first);
    }

    #[tokio::test]
    async fn test_call_upstream_success() {
        let client = MockHttpClient::new(StatusCode::OK, STUB_COMPLETION);
        let settings = settings();
        let key = ApiKey::new("sk-test-key").unwrap();

        let completion = call_upstream(
            &client,
            &settings,
            &key,
            "gpt-4o",
            &user_messages(),
            defaults(),
        )
        .await
        .unwrap();

        assert_eq!(completion.text, "Hello from the stub");
        assert_eq!(
            completion.usage,
            Some(Usage {
                prompt: 12,
                completion: 5,
                total: 17
            })
        );

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.uri, "https://api.example.com/v1/chat/completions");
        assert_eq!(
            request.header("authorization"),
            Some("Bearer sk-test-key")
        );
        assert_eq!(request.header("content-type"), Some("application/json"));

        let sent: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(
            sent,
            json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "Hello"}],
                "temperature": 1.0
            })
        );
    }

    #[tokio::test]
    async fn test_call_upstream_sends_seed_when_set() {
        let client = MockHttpClient::new(StatusCode::OK, STUB_COMPLETION);
        let key = ApiKey::new("sk-test-key").unwrap();
        let params = ResolvedParameters {
            temperature: 0.2,
            seed: Some(1234),
        };

        call_upstream(&client, &settings(), &key, "gpt-4o", &user_messages(), params)
            .await
            .unwrap();

        let sent: Value = serde_json::from_slice(&client.get_requests()[0].body).unwrap();
        assert_eq!(sent["seed"], 1234);
        assert_eq!(sent["temperature"], 0.2);
    }

    #[rstest]
    #[case(r#"{"choices": []}"#)]
    #[case(r#"{"choices": [{"message": {"role": "assistant"}}]}"#)]
    #[case(r#"{"choices": [{"message": {"content": null}}]}"#)]
    #[case(r#"{"id": "x"}"#)]
    #[case("<html>oops</html>")]
    #[tokio::test]
    async fn test_call_upstream_malformed_success(#[case] body: &str) {
        let client = MockHttpClient::new(StatusCode::OK, body);
        let key = ApiKey::new("sk-test-key").unwrap();

        let result =
            call_upstream(&client, &settings(), &key, "gpt-4o", &user_messages(), defaults())
                .await;
        assert_eq!(result, Err(RelayError::MalformedUpstreamResponse));
    }

    #[tokio::test]
    async fn test_call_upstream_surfaces_upstream_error_message() {
        let client = MockHttpClient::new(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#,
        );
        let key = ApiKey::new("sk-test-key").unwrap();

        let result =
            call_upstream(&client, &settings(), &key, "gpt-4o", &user_messages(), defaults())
                .await;
        assert_eq!(
            result,
            Err(RelayError::UpstreamError {
                status: 429,
                details: "Rate limit reached".into()
            })
        );
    }

    #[tokio::test]
    async fn test_call_upstream_falls_back_to_raw_error_body() {
        let client = MockHttpClient::new(StatusCode::BAD_GATEWAY, "upstream exploded");
        let key = ApiKey::new("sk-test-key").unwrap();

        let result =
            call_upstream(&client, &settings(), &key, "gpt-4o", &user_messages(), defaults())
                .await;
        assert_eq!(
            result,
            Err(RelayError::UpstreamError {
                status: 502,
                details: "upstream exploded".into()
            })
        );
    }

    #[tokio::test]
    async fn test_call_upstream_network_error() {
        let client = MockHttpClient::failing("connection refused");
        let key = ApiKey::new("sk-test-key").unwrap();

        let result =
            call_upstream(&client, &settings(), &key, "gpt-4o", &user_messages(), defaults())
                .await;
        assert!(matches!(result, Err(RelayError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_call_upstream_caps_response_body() {
        let client = MockHttpClient::new(StatusCode::OK, STUB_COMPLETION);
        let settings = UpstreamSettings::builder()
            .max_response_bytes(16)
            .api_key(ApiKey::new("sk-test-key").unwrap())
            .build();
        let key = ApiKey::new("sk-test-key").unwrap();

        let result =
            call_upstream(&client, &settings, &key, "gpt-4o", &user_messages(), defaults()).await;
        assert!(matches!(result, Err(RelayError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_call_upstream_times_out() {
        let client = MockHttpClient::stalled(Duration::from_secs(10));
        let settings = UpstreamSettings::builder()
            .timeout(Duration::from_millis(20))
            .api_key(ApiKey::new("sk-test-key").unwrap())
            .build();
        let key = ApiKey::new("sk-test-key").unwrap();

        let result =
            call_upstream(&client, &settings, &key, "gpt-4o", &user_messages(), defaults()).await;
        assert_eq!(result, Err(RelayError::Timeout(Duration::from_millis(20))));
    }

    #[tokio::test]
    async fn test_relay_uses_default_model_and_temperature() {
        let client = MockHttpClient::new(StatusCode::OK, STUB_COMPLETION);
        let settings = UpstreamSettings::builder()
            .default_model("gpt-3.5-turbo")
            .api_key(ApiKey::new("sk-test-key").unwrap())
            .build();
        let body = json!({"messages": [{"role": "user", "content": "Hi"}]}).to_string();

        let response = relay(&client, &settings, body.as_bytes()).await.unwrap();
        assert_eq!(
            response,
            RelayResponse {
                generated_text: "Hello from the stub".into(),
                used_temperature: 1.0,
                used_seed: None
            }
        );

        let sent: Value = serde_json::from_slice(&client.get_requests()[0].body).unwrap();
        assert_eq!(sent["model"], "gpt-3.5-turbo");
        assert!(sent.get("seed").is_none());
    }

    #[tokio::test]
    async fn test_relay_without_key_never_calls_upstream() {
        let client = MockHttpClient::new(StatusCode::OK, STUB_COMPLETION);
        let settings = UpstreamSettings::builder().build();
        let body = json!({"messages": [{"role": "user", "content": "Hi"}]}).to_string();

        let result = relay(&client, &settings, body.as_bytes()).await;
        assert_eq!(result, Err(RelayError::ConfigurationError));
        assert!(client.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_relay_rejects_empty_messages_before_upstream() {
        let client = MockHttpClient::new(StatusCode::OK, STUB_COMPLETION);
        let body = json!({"messages": []}).to_string();

        let result = relay(&client, &settings(), body.as_bytes()).await;
        assert!(matches!(result, Err(RelayError::InvalidInput(_))));
        assert!(client.get_requests().is_empty());
    }

    #[test]
    fn test_api_key_is_redacted() {
        assert_eq!(ApiKey::new("   "), None);
        let key = ApiKey::new("sk-secret").unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains("sk-secret"));
    }
}
