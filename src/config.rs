use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level import pipeline configuration.
///
/// Loaded from an optional `import.toml` next to the process plus
/// `RECIPE_IMPORT_*` environment variables, environment taking precedence.
#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Understanding model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Hard cap on staged media size in bytes. Remote media reporting a
    /// larger size is rejected before any download starts.
    #[serde(default = "default_max_media_bytes")]
    pub max_media_bytes: u64,
    /// Directory for staged media; the system temp dir when unset.
    #[serde(default)]
    pub staging_dir: Option<std::path::PathBuf>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Configuration for the content-understanding model.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Model identifier (e.g. "gemini-2.5-flash")
    #[serde(default = "default_model")]
    pub model: String,
    /// API key; falls back to the GOOGLE_API_KEY environment variable
    pub api_key: Option<String>,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            max_media_bytes: default_max_media_bytes(),
            staging_dir: None,
            timeout: default_timeout(),
        }
    }
}

impl ImportConfig {
    /// Load configuration from `import.toml` (optional) and the
    /// `RECIPE_IMPORT_` environment prefix.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("import").required(false))
            .add_source(
                Environment::with_prefix("RECIPE_IMPORT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_max_media_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.max_media_bytes, 50 * 1024 * 1024);
        assert_eq!(config.timeout, 30);
        assert_eq!(config.model.model, "gemini-2.5-flash");
        assert!(config.model.api_key.is_none());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        // No import.toml in the test cwd; load must still succeed.
        let config = ImportConfig::load().expect("config should load");
        assert!(config.max_media_bytes > 0);
    }
}
