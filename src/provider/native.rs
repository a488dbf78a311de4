//! Native-client transport: Google Gemini `generateContent`.
//!
//! Gemini does not speak the chat-completion wire format. Its generation
//! call takes the prompt and the image object directly — a `contents` array
//! of parts, with the image as inline base64 bytes rather than a data URI,
//! and the credential in an `x-goog-api-key` header instead of a bearer
//! token. The reply nests text under `candidates[0].content.parts`.
//!
//! An answer whose concatenated part text is empty is
//! [`ExtractError::EmptyResponse`] — Gemini reports safety blocks and
//! unreadable inputs as structurally valid replies with no text.

use crate::error::ExtractError;
use crate::pipeline::image::PreparedImage;
use crate::provider::{classify_http_error, Provider};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const GENERATE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Build the `generateContent` request body.
pub(crate) fn build_body(prompt: &str, image: &PreparedImage) -> Value {
    json!({
        "contents": [
            {
                "parts": [
                    { "text": prompt },
                    {
                        "inline_data": {
                            "mime_type": image.mime_type(),
                            "data": image.to_base64()
                        }
                    }
                ]
            }
        ]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// POST the generation call and return the candidate text.
pub(crate) async fn dispatch(
    client: &reqwest::Client,
    provider: &str,
    model: &str,
    credential: &str,
    timeout_secs: u64,
    prompt: &str,
    image: &PreparedImage,
) -> Result<String, ExtractError> {
    let url = format!("{GENERATE_ENDPOINT}/{model}:generateContent");
    let body = build_body(prompt, image);

    let response = client
        .post(&url)
        .header("x-goog-api-key", credential)
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

    let reply: GenerateReply =
        serde_json::from_str(&text).map_err(|e| ExtractError::UnexpectedResponseShape {
            provider: provider.to_string(),
            detail: format!("body is not a generateContent object: {e}"),
        })?;

    let content = reply
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(ExtractError::EmptyResponse {
            provider: provider.to_string(),
        });
    }

    debug!("Provider '{}' replied with {} bytes", provider, content.len());
    Ok(content)
}
