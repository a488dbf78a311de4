//! Configuration types for fact extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`],
//! built via its [`ExtractionConfigBuilder`]. Keeping every knob in one
//! struct makes it trivial to share configs across threads and to diff two
//! runs to understand why their outputs differ.
//!
//! The provider registry rides inside the config: it is an explicit value
//! the caller constructs (or defaults) at startup and passes into the
//! engine — never a process-wide mutable table.

use crate::error::ExtractError;
use crate::provider::ProviderRegistry;

/// Environment variable overriding provider auto-detection.
pub const PROVIDER_ENV_VAR: &str = "IMG2FACTS_PROVIDER";

/// Configuration for one extraction call.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use img2facts::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .provider("openrouter")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Provider registry key, e.g. "openrouter", "openai", "gemini".
    ///
    /// If None, the engine honours `IMG2FACTS_PROVIDER`, then falls back to
    /// the first registered provider whose credential variable is set.
    pub provider: Option<String>,

    /// Model name override. If None, uses the provider's default model.
    pub model: Option<String>,

    /// Custom extraction prompt. If None, uses the built-in default.
    pub prompt: Option<String>,

    /// Per-call timeout for the outbound provider request in seconds.
    /// Default: 60.
    ///
    /// This bounds the engine's only suspension point. The dispatcher does
    /// not retry; a caller that wants retries re-invokes with its own
    /// backoff.
    pub api_timeout_secs: u64,

    /// Maximum source file size in bytes. Default: 15 MiB.
    ///
    /// Checked against file metadata before decoding, so an oversized
    /// upload is rejected without allocating pixels or touching the
    /// network.
    pub max_image_bytes: u64,

    /// Maximum image dimension (width or height) in pixels. Default: 2048.
    ///
    /// Larger sources are downscaled preserving aspect ratio. 2048 px keeps
    /// the base64 payload within every supported provider's request limit
    /// while leaving small print legible to current vision models.
    pub max_dimension: u32,

    /// The provider catalogue. Default: [`ProviderRegistry::builtin()`].
    pub registry: ProviderRegistry,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            prompt: None,
            api_timeout_secs: 60,
            max_image_bytes: 15 * 1024 * 1024,
            max_dimension: 2048,
            registry: ProviderRegistry::builtin(),
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn provider(mut self, key: impl Into<String>) -> Self {
        self.config.provider = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_image_bytes(mut self, bytes: u64) -> Self {
        self.config.max_image_bytes = bytes;
        self
    }

    pub fn max_dimension(mut self, px: u32) -> Self {
        self.config.max_dimension = px;
        self
    }

    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.config.registry = registry;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_image_bytes == 0 {
            return Err(ExtractError::InvalidConfig(
                "Max image size must be non-zero".into(),
            ));
        }
        if c.max_dimension < 16 {
            return Err(ExtractError::InvalidConfig(format!(
                "Max dimension must be ≥ 16 px, got {}",
                c.max_dimension
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let c = ExtractionConfig::default();
        assert_eq!(c.api_timeout_secs, 60);
        assert_eq!(c.max_image_bytes, 15 * 1024 * 1024);
        assert_eq!(c.max_dimension, 2048);
        assert!(c.provider.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let c = ExtractionConfig::builder()
            .provider("gemini")
            .model("gemini-2.0-flash")
            .api_timeout_secs(30)
            .build()
            .unwrap();
        assert_eq!(c.provider.as_deref(), Some("gemini"));
        assert_eq!(c.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(c.api_timeout_secs, 30);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ExtractionConfig::builder()
            .api_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn tiny_max_dimension_is_rejected() {
        let err = ExtractionConfig::builder()
            .max_dimension(8)
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }
}
