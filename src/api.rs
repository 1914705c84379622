// API client module: a small blocking HTTP client for the Discord
// application emoji endpoints. Everything runs sequentially, one request at
// a time, so a blocking client is all that is needed.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UploadError;

pub const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// Back-off used when a 429 carries neither a body nor a header hint.
const FALLBACK_RETRY_AFTER: Duration = Duration::from_secs(1);

/// An emoji already registered on the application.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteEmoji {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug)]
struct EmojiList {
    items: Vec<RemoteEmoji>,
}

/// Request body for `POST /applications/{id}/emojis`.
#[derive(Serialize, Debug)]
struct CreateEmojiRequest<'a> {
    name: &'a str,
    image: &'a str,
}

/// Error payload Discord sends with 4xx responses. `errors` is a tree of
/// per-field `_errors` arrays, kept as a `Value` since its shape varies.
#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    retry_after: Option<f64>,
    #[serde(default)]
    errors: Option<Value>,
}

/// What happened to a single upload attempt, short of a hard failure.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Created(RemoteEmoji),
    /// 429: try the same request again after the given delay.
    RateLimited(Duration),
    /// 400 because an emoji with this name exists.
    NameTaken(String),
    /// Any other 400; the item is skipped.
    Rejected(String),
}

/// The remote side of a sync pass. `DiscordClient` is the real thing; tests
/// substitute an in-memory fake.
pub trait EmojiApi {
    fn list_emojis(&self) -> Result<Vec<RemoteEmoji>, UploadError>;
    fn create_emoji(&self, name: &str, image: &str) -> Result<UploadOutcome, UploadError>;
}

#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    base_url: String,
    application_id: String,
    max_retries: u32,
    sleep: fn(Duration),
}

impl DiscordClient {
    /// Build a client authenticated as the bot owning `application_id`.
    pub fn new(token: &str, application_id: &str) -> Result<Self, UploadError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bot {}", token))
            .map_err(|_| UploadError::InvalidToken)?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                "DiscordBot (https://github.com/item-emojis, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            )),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            application_id: application_id.to_string(),
            max_retries: 10,
            sleep: std::thread::sleep,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Cap on consecutive 429s tolerated while listing emojis.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Replace the pause used between rate-limited list requests.
    pub fn with_sleeper(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    fn emojis_url(&self) -> String {
        format!("{}/applications/{}/emojis", self.base_url, self.application_id)
    }
}

impl EmojiApi for DiscordClient {
    fn list_emojis(&self) -> Result<Vec<RemoteEmoji>, UploadError> {
        let url = self.emojis_url();
        let mut attempts = 0;
        loop {
            log::debug!("GET {}", url);
            let res = self.client.get(&url).send()?;
            let status = res.status();
            let header = retry_after_header(res.headers());
            let text = res.text()?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                attempts += 1;
                if attempts > self.max_retries {
                    return Err(UploadError::RateLimitExhausted { attempts });
                }
                let wait = retry_after(&text, header.as_deref());
                log::warn!("Rate limited while listing emojis. Retrying after {:?}", wait);
                (self.sleep)(wait);
                continue;
            }
            if !status.is_success() {
                return Err(UploadError::Status {
                    status: status.as_u16(),
                    message: describe(&text),
                });
            }
            let list: EmojiList = serde_json::from_str(&text)?;
            return Ok(list.items);
        }
    }

    fn create_emoji(&self, name: &str, image: &str) -> Result<UploadOutcome, UploadError> {
        let url = self.emojis_url();
        log::debug!("POST {} name={}", url, name);
        let res = self
            .client
            .post(&url)
            .json(&CreateEmojiRequest { name, image })
            .send()?;
        let status = res.status();
        let header = retry_after_header(res.headers());
        let text = res.text()?;
        classify(status, header.as_deref(), &text, name)
    }
}

fn retry_after_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Map a response from the create endpoint to an outcome, or an error for
/// anything that should stop the batch. A 2xx always counts as created; if
/// its body is unreadable the emoji is recorded under `requested_name`.
pub fn classify(
    status: StatusCode,
    retry_after_header: Option<&str>,
    body: &str,
    requested_name: &str,
) -> Result<UploadOutcome, UploadError> {
    if status.is_success() {
        let emoji = serde_json::from_str::<RemoteEmoji>(body).unwrap_or_else(|e| {
            log::warn!("Created {} but could not read the response: {}", requested_name, e);
            RemoteEmoji {
                id: String::new(),
                name: requested_name.to_string(),
            }
        });
        return Ok(UploadOutcome::Created(emoji));
    }
    match status {
        StatusCode::TOO_MANY_REQUESTS => Ok(UploadOutcome::RateLimited(retry_after(
            body,
            retry_after_header,
        ))),
        StatusCode::BAD_REQUEST if is_name_taken(body) => {
            Ok(UploadOutcome::NameTaken(describe(body)))
        }
        StatusCode::BAD_REQUEST => Ok(UploadOutcome::Rejected(describe(body))),
        _ => Err(UploadError::Status {
            status: status.as_u16(),
            message: describe(body),
        }),
    }
}

/// Delay requested by a 429: the body's `retry_after` seconds first, then
/// the `Retry-After` header, then a fixed second.
pub fn retry_after(body: &str, header: Option<&str>) -> Duration {
    let from_body = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.retry_after);
    let from_header = header.and_then(|h| h.trim().parse::<f64>().ok());
    from_body
        .or(from_header)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(FALLBACK_RETRY_AFTER)
}

fn is_name_taken(body: &str) -> bool {
    if body.contains("ALREADY_TAKEN") {
        return true;
    }
    describe(body).to_ascii_lowercase().contains("already")
}

/// Human-readable message for an error body. Field errors are more useful
/// than the generic "Invalid Form Body", so the first one wins.
fn describe(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.chars().take(200).collect();
    };
    parsed
        .errors
        .as_ref()
        .and_then(first_field_error)
        .or(parsed.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn first_field_error(errors: &Value) -> Option<String> {
    match errors {
        Value::Object(map) => {
            if let Some(Value::Array(list)) = map.get("_errors") {
                if let Some(msg) = list
                    .iter()
                    .find_map(|e| e.get("message").and_then(Value::as_str))
                {
                    return Some(msg.to_string());
                }
            }
            map.values().find_map(first_field_error)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME_TAKEN: &str = r#"{
        "message": "Invalid Form Body",
        "code": 50035,
        "errors": { "name": { "_errors": [
            { "code": "APPLICATION_EMOJI_NAME_ALREADY_TAKEN", "message": "Emoji name already taken" }
        ] } }
    }"#;

    #[test]
    fn created_parses_emoji() {
        let body = r#"{"id":"42","name":"Boots","user":{}}"#;
        let out = classify(StatusCode::CREATED, None, body, "Boots").unwrap();
        assert_eq!(
            out,
            UploadOutcome::Created(RemoteEmoji {
                id: "42".into(),
                name: "Boots".into()
            })
        );
    }

    #[test]
    fn rate_limit_uses_body_retry_after() {
        let body = r#"{"message":"You are being rate limited.","retry_after":1.5,"global":false}"#;
        let out = classify(StatusCode::TOO_MANY_REQUESTS, Some("9"), body, "Boots").unwrap();
        assert_eq!(out, UploadOutcome::RateLimited(Duration::from_millis(1500)));
    }

    #[test]
    fn rate_limit_falls_back_to_header_then_default() {
        assert_eq!(retry_after("", Some("3")), Duration::from_secs(3));
        assert_eq!(retry_after("not json", None), FALLBACK_RETRY_AFTER);
        assert_eq!(retry_after(r#"{"retry_after":-2}"#, None), FALLBACK_RETRY_AFTER);
    }

    #[test]
    fn oversized_retry_after_falls_back() {
        let body = r#"{"message":"You are being rate limited.","retry_after":1e300,"global":false}"#;
        let out = classify(StatusCode::TOO_MANY_REQUESTS, None, body, "Boots").unwrap();
        assert_eq!(out, UploadOutcome::RateLimited(FALLBACK_RETRY_AFTER));
        assert_eq!(retry_after("", Some("1e300")), FALLBACK_RETRY_AFTER);
        assert_eq!(retry_after("", Some("NaN")), FALLBACK_RETRY_AFTER);
    }

    #[test]
    fn created_with_unreadable_body_keeps_requested_name() {
        let out = classify(StatusCode::CREATED, None, "", "Boots").unwrap();
        assert_eq!(
            out,
            UploadOutcome::Created(RemoteEmoji {
                id: String::new(),
                name: "Boots".into()
            })
        );
    }

    #[test]
    fn name_taken_is_detected() {
        let out = classify(StatusCode::BAD_REQUEST, None, NAME_TAKEN, "Boots").unwrap();
        assert_eq!(out, UploadOutcome::NameTaken("Emoji name already taken".into()));
    }

    #[test]
    fn other_bad_request_is_rejected() {
        let body = r#"{"message":"Invalid Form Body","code":50035,"errors":{"image":{"_errors":[{"code":"BINARY_TYPE_MAX_SIZE","message":"File cannot be larger than 256.0 kb."}]}}}"#;
        let out = classify(StatusCode::BAD_REQUEST, None, body, "Boots").unwrap();
        assert_eq!(
            out,
            UploadOutcome::Rejected("File cannot be larger than 256.0 kb.".into())
        );
    }

    #[test]
    fn other_status_is_an_error() {
        let err = classify(
            StatusCode::UNAUTHORIZED,
            None,
            r#"{"message":"401: Unauthorized","code":0}"#,
            "Boots",
        )
        .unwrap_err();
        match err {
            UploadError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "401: Unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn describe_truncates_raw_bodies() {
        let body = "x".repeat(500);
        assert_eq!(describe(&body).len(), 200);
    }

    #[test]
    fn bad_token_is_rejected() {
        assert!(matches!(
            DiscordClient::new("abc\n", "1"),
            Err(UploadError::InvalidToken)
        ));
    }
}
