//! Provider registry and request dispatch.
//!
//! A [`ProviderDescriptor`] names a hosted vision-model backend: its wire
//! format ([`ProviderTransport`]), default model, and the environment
//! variable holding its credential. The [`ProviderRegistry`] is an explicit
//! value constructed once at startup and passed into the engine by
//! reference — there is no process-wide singleton to mutate.
//!
//! Connecting a provider resolves its credential eagerly, so a missing API
//! key fails at construction ([`ExtractError::MissingCredential`]) rather
//! than on the first request. A connected [`Provider`] performs exactly one
//! outbound network call per [`Provider::dispatch`] and never retries —
//! retry policy, if any, belongs to the caller.

use crate::error::ExtractError;
use crate::pipeline::image::PreparedImage;
use std::time::Duration;
use tracing::debug;

mod hosted;
mod native;

pub(crate) use hosted::classify_http_error;

/// How a provider is addressed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderTransport {
    /// Chat-completion-style HTTP endpoint accepting multimodal messages
    /// (OpenAI-compatible: data-URI image parts, bearer auth).
    HostedChat { endpoint: String },
    /// Dedicated generation API with its own wire format (inline base64
    /// image data, API-key header auth).
    NativeClient,
}

/// Static description of one backend: where it lives and how to pay for it.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Registry key, e.g. "openrouter".
    pub key: String,
    /// Model name sent in requests, e.g. "qwen/qwen2.5-vl-72b-instruct".
    pub model_name: String,
    pub transport: ProviderTransport,
    /// Environment variable that must hold the credential.
    pub credential_env_var: String,
}

impl ProviderDescriptor {
    fn hosted(key: &str, model: &str, endpoint: &str, env_var: &str) -> Self {
        Self {
            key: key.to_string(),
            model_name: model.to_string(),
            transport: ProviderTransport::HostedChat {
                endpoint: endpoint.to_string(),
            },
            credential_env_var: env_var.to_string(),
        }
    }

    fn native(key: &str, model: &str, env_var: &str) -> Self {
        Self {
            key: key.to_string(),
            model_name: model.to_string(),
            transport: ProviderTransport::NativeClient,
            credential_env_var: env_var.to_string(),
        }
    }
}

/// Immutable mapping from provider key to descriptor.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    descriptors: Vec<ProviderDescriptor>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderRegistry {
    /// The built-in provider catalogue.
    pub fn builtin() -> Self {
        Self {
            descriptors: vec![
                ProviderDescriptor::hosted(
                    "openrouter",
                    "qwen/qwen2.5-vl-72b-instruct",
                    "https://openrouter.ai/api/v1/chat/completions",
                    "OPENROUTER_API_KEY",
                ),
                ProviderDescriptor::hosted(
                    "openai",
                    "gpt-4o-mini",
                    "https://api.openai.com/v1/chat/completions",
                    "OPENAI_API_KEY",
                ),
                ProviderDescriptor::native("gemini", "gemini-2.0-flash", "GEMINI_API_KEY"),
            ],
        }
    }

    /// Build a registry from custom descriptors. Later entries shadow
    /// earlier ones with the same key.
    pub fn from_descriptors(descriptors: Vec<ProviderDescriptor>) -> Self {
        Self { descriptors }
    }

    /// All registered keys, in catalogue order.
    pub fn keys(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.key.as_str()).collect()
    }

    /// Look up a descriptor by key.
    pub fn descriptor(&self, key: &str) -> Result<&ProviderDescriptor, ExtractError> {
        // Last match wins so custom registries can shadow builtin entries.
        self.descriptors
            .iter()
            .rev()
            .find(|d| d.key == key)
            .ok_or_else(|| ExtractError::UnknownProvider {
                key: key.to_string(),
                known: self.keys().join(", "),
            })
    }

    /// First registered provider whose credential variable is set and
    /// non-empty, if any. Used for auto-detection when the caller did not
    /// choose a provider.
    pub fn detect(&self) -> Option<&str> {
        self.descriptors
            .iter()
            .find(|d| {
                std::env::var(&d.credential_env_var)
                    .map(|v| !v.is_empty())
                    .unwrap_or(false)
            })
            .map(|d| d.key.as_str())
    }

    /// Resolve a descriptor and its credential into a ready-to-dispatch
    /// [`Provider`].
    ///
    /// Fails with [`ExtractError::UnknownProvider`] for an unregistered key
    /// and [`ExtractError::MissingCredential`] when the credential variable
    /// is unset or empty.
    pub fn connect(
        &self,
        key: &str,
        model_override: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Provider, ExtractError> {
        let mut descriptor = self.descriptor(key)?.clone();
        if let Some(model) = model_override {
            descriptor.model_name = model.to_string();
        }

        let credential = std::env::var(&descriptor.credential_env_var)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ExtractError::MissingCredential {
                provider: descriptor.key.clone(),
                env_var: descriptor.credential_env_var.clone(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractError::Internal(format!("HTTP client build failed: {e}")))?;

        debug!(
            "Connected provider '{}' (model {})",
            descriptor.key, descriptor.model_name
        );

        Ok(Provider {
            descriptor,
            credential,
            timeout_secs,
            client,
        })
    }
}

/// A connected backend: descriptor + resolved credential + HTTP client.
///
/// Cheap to clone and safe for concurrent read-only use — the inner
/// `reqwest::Client` is an `Arc` internally and the rest is immutable.
#[derive(Clone)]
pub struct Provider {
    descriptor: ProviderDescriptor,
    credential: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("descriptor", &self.descriptor)
            .field("credential", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Provider {
    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    pub fn model_name(&self) -> &str {
        &self.descriptor.model_name
    }

    /// Send one extraction request and return the model's raw textual reply.
    ///
    /// Exactly one outbound call; the transport-level timeout set at
    /// connect time bounds it. A timeout maps to
    /// [`ExtractError::RequestTimedOut`], any other transport failure to
    /// [`ExtractError::TransportError`]. Provider-level failures are
    /// classified per transport by the hosted-chat and native-client
    /// implementations.
    pub async fn dispatch(
        &self,
        prompt: &str,
        image: &PreparedImage,
    ) -> Result<String, ExtractError> {
        match &self.descriptor.transport {
            ProviderTransport::HostedChat { endpoint } => {
                hosted::dispatch(
                    &self.client,
                    endpoint,
                    &self.descriptor.key,
                    &self.descriptor.model_name,
                    &self.credential,
                    self.timeout_secs,
                    prompt,
                    image,
                )
                .await
            }
            ProviderTransport::NativeClient => {
                native::dispatch(
                    &self.client,
                    &self.descriptor.key,
                    &self.descriptor.model_name,
                    &self.credential,
                    self.timeout_secs,
                    prompt,
                    image,
                )
                .await
            }
        }
    }

    /// Translate a reqwest transport failure into the error taxonomy.
    pub(crate) fn transport_error(provider: &str, secs: u64, e: reqwest::Error) -> ExtractError {
        if e.is_timeout() {
            ExtractError::RequestTimedOut {
                provider: provider.to_string(),
                secs,
            }
        } else {
            ExtractError::TransportError {
                provider: provider.to_string(),
                detail: e.to_string(),
            }
        }
    }
}
