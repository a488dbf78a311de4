//! Error types for the img2facts library.
//!
//! Every failure the engine can surface is a variant of [`ExtractError`].
//! The taxonomy deliberately separates *where* a call failed:
//!
//! * Image preparation (`ImageNotFound`, `ImageTooLarge`, `InvalidImage`)
//!   fails before any network traffic.
//! * Provider resolution (`UnknownProvider`, `MissingCredential`) fails at
//!   engine construction, so a misconfigured deployment dies immediately
//!   rather than on the first request.
//! * Dispatch (`RequestTimedOut`, `TransportError`, `Unauthorized`,
//!   `ModelUnavailable`, `ProviderError`, `EmptyResponse`,
//!   `UnexpectedResponseShape`) covers the single outbound call.
//! * Reply parsing (`NoJsonArrayFound`, `MarkdownNotJson`, `InvalidJson`,
//!   `NotAnArray`) covers a reply that could not be understood at all.
//!   Individual malformed records inside an otherwise valid array are NOT
//!   errors — the normalizer drops them silently.
//!
//! Callers must be able to distinguish "the model found nothing" (an empty
//! record list) from "the reply could not be understood" (a parse error).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the img2facts library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Image preparation errors ──────────────────────────────────────────
    /// Source image was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// Source file exceeds the transmission size limit.
    #[error(
        "Image file is too large: {size} bytes (limit {limit} bytes) for '{path}'\n\
         Re-export the document at a lower resolution or crop it."
    )]
    ImageTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// The file exists but is not a decodable raster image.
    #[error("File is not a valid image: '{path}': {detail}\nSupported formats: PNG, JPEG, GIF, TIFF, BMP.")]
    InvalidImage { path: PathBuf, detail: String },

    // ── Provider resolution errors ────────────────────────────────────────
    /// No descriptor registered under the given key.
    #[error("Unknown provider '{key}'. Known providers: {known}")]
    UnknownProvider { key: String, known: String },

    /// The provider's credential environment variable is unset or empty.
    #[error(
        "Provider '{provider}' is not configured: set the {env_var} environment variable.\n\
         Example: export {env_var}=sk-..."
    )]
    MissingCredential { provider: String, env_var: String },

    // ── Dispatch errors ───────────────────────────────────────────────────
    /// The outbound call exceeded the configured timeout.
    #[error("Request to provider '{provider}' timed out after {secs}s\nTry a smaller image or increase the timeout.")]
    RequestTimedOut { provider: String, secs: u64 },

    /// Any transport-level failure other than a timeout (DNS, TLS, connect).
    #[error("Transport error talking to provider '{provider}': {detail}\nCheck your internet connection.")]
    TransportError { provider: String, detail: String },

    /// The provider rejected the credential.
    #[error("Provider '{provider}' rejected the API key: {detail}\nCheck the key is valid and not expired.")]
    Unauthorized { provider: String, detail: String },

    /// The named model does not exist at this provider.
    #[error("Model '{model}' is not available at provider '{provider}': {detail}\nTry another model or provider.")]
    ModelUnavailable {
        provider: String,
        model: String,
        detail: String,
    },

    /// Non-2xx response that matched no known failure signature.
    #[error("Provider '{provider}' returned HTTP {status}: {body}")]
    ProviderError {
        provider: String,
        status: u16,
        body: String,
    },

    /// The provider answered, but the textual result was empty.
    #[error("Provider '{provider}' returned an empty response.\nThe image may be unreadable; try a clearer scan or another provider.")]
    EmptyResponse { provider: String },

    /// 2xx response whose JSON body did not have the expected shape.
    #[error("Unexpected response shape from provider '{provider}': {detail}")]
    UnexpectedResponseShape { provider: String, detail: String },

    // ── Reply parsing errors ──────────────────────────────────────────────
    /// The reply contains no `[` … `]` pair to slice a JSON array from.
    #[error("No JSON array found in the model reply.\nThe model may have answered in prose; try re-running or another provider.")]
    NoJsonArrayFound,

    /// The reply contains markdown fences, but no JSON array inside them.
    #[error("The model reply is markdown without a JSON array.\nTry another provider — this one does not follow the response contract.")]
    MarkdownNotJson,

    /// The sliced array text is invalid JSON even after the repair pass.
    #[error("The model reply contains malformed JSON: {detail}")]
    InvalidJson { detail: String },

    /// The sliced text parsed as JSON, but not as an array.
    #[error("The model reply parsed as JSON {found}, expected an array.")]
    NotAnArray { found: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
