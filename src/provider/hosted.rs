//! Hosted-chat transport: OpenAI-compatible chat-completion endpoints.
//!
//! The request is a single-turn multimodal message: one text part carrying
//! the prompt, one image part carrying the prepared JPEG as a base64 data
//! URI. Auth is `Authorization: Bearer <credential>`.
//!
//! Non-2xx responses are classified by scanning the body for known failure
//! signatures — hosted gateways (OpenRouter in particular) wrap many
//! distinct upstream failures in the same status code, so the body text is
//! the only reliable discriminator. Anything unrecognised surfaces as
//! [`ExtractError::ProviderError`] with the raw status and body.

use crate::error::ExtractError;
use crate::pipeline::image::PreparedImage;
use crate::provider::Provider;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// Build the chat-completion request body.
///
/// Shape: `{"model", "messages": [{"role": "user", "content":
/// [{"type": "text", ...}, {"type": "image_url", ...}]}]}`.
pub(crate) fn build_body(model: &str, prompt: &str, image: &PreparedImage) -> Value {
    json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    {
                        "type": "image_url",
                        "image_url": { "url": image.to_data_uri() }
                    }
                ]
            }
        ]
    })
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Classify a non-2xx response into the error taxonomy.
///
/// Checked against the body first (case-insensitive substrings), then the
/// status code, because gateways sometimes return 200-family codes with an
/// embedded error object and vice versa.
pub(crate) fn classify_http_error(
    provider: &str,
    model: &str,
    status: u16,
    body: &str,
) -> ExtractError {
    let lower = body.to_lowercase();

    let unauthorized = ["invalid api key", "invalid_api_key", "unauthorized", "api key not valid"];
    if status == 401 || status == 403 || unauthorized.iter().any(|s| lower.contains(s)) {
        return ExtractError::Unauthorized {
            provider: provider.to_string(),
            detail: truncate(body, 200),
        };
    }

    let unavailable = ["model not found", "is not a valid model", "no endpoints found", "model_not_found"];
    if unavailable.iter().any(|s| lower.contains(s)) {
        return ExtractError::ModelUnavailable {
            provider: provider.to_string(),
            model: model.to_string(),
            detail: truncate(body, 200),
        };
    }

    ExtractError::ProviderError {
        provider: provider.to_string(),
        status,
        body: truncate(body, 500),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}\u{2026}", &s[..end])
    }
}

/// POST the request and return the reply text from
/// `choices[0].message.content`.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn dispatch(
    client: &reqwest::Client,
    endpoint: &str,
    provider: &str,
    model: &str,
    credential: &str,
    timeout_secs: u64,
    prompt: &str,
    image: &PreparedImage,
) -> Result<String, ExtractError> {
    let body = build_body(model, prompt, image);

    let response = client
        .post(endpoint)
        .bearer_auth(credential)
        .json(&body)
        .send()
        .await
        .map_err(|e| Provider::transport_error(provider, timeout_secs, e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Provider::transport_error(provider, timeout_secs, e))?;

    if !status.is_success() {
        return Err(classify_http_error(provider, model, status.as_u16(), &text));
    }

    let reply: ChatReply =
        serde_json::from_str(&text).map_err(|e| ExtractError::UnexpectedResponseShape {
            provider: provider.to_string(),
            detail: format!("body is not a chat completion object: {e}"),
        })?;

    let content = reply
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ExtractError::UnexpectedResponseShape {
            provider: provider.to_string(),
            detail: "choices[0].message.content is missing".to_string(),
        })?;

    debug!("Provider '{}' replied with {} bytes", provider, content.len());
    Ok(content)
}
