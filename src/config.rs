use crate::engine::{ImageVariant, OcrPass};
use crate::pipeline::PipelineOptions;
use crate::render::Footer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub translation: TranslationConfig,
    pub scheduler: SchedulerConfig,
    pub output: OutputConfig,
}

/// Recognition engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of an OpenAI-compatible speech API
    pub speech_url: String,
    pub speech_model: String,
    /// Full URL of the OCR recognition endpoint
    pub ocr_url: String,
    /// Environment variable holding the engine API key
    pub api_key_env: String,
    /// Preprocess variants tried per page
    pub variants: Vec<ImageVariant>,
    /// Engine profiles tried per variant
    pub profiles: Vec<String>,
}

/// Translation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    /// Full URL of a LibreTranslate-style /translate endpoint
    pub url: String,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on each recognition-engine call, in seconds.
    /// 0 disables the bound.
    pub recognition_timeout_secs: u64,
}

/// Output rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Footer attribution line; defaults to the versioned program name
    pub attribution: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speech_url: "https://api.groq.com/openai/v1".to_string(),
            speech_model: "whisper-large-v3-turbo".to_string(),
            ocr_url: "http://127.0.0.1:8089/recognize".to_string(),
            api_key_env: "CAPTIONQ_API_KEY".to_string(),
            variants: vec![
                ImageVariant::Original,
                ImageVariant::Document,
                ImageVariant::Magic,
            ],
            profiles: vec!["default".to_string()],
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000/translate".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            recognition_timeout_secs: 120,
        }
    }
}

impl EngineConfig {
    /// Read the engine API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }

    /// The OCR pass matrix: every variant crossed with every profile.
    pub fn ocr_passes(&self) -> Vec<OcrPass> {
        let mut passes = Vec::with_capacity(self.variants.len() * self.profiles.len());
        for variant in &self.variants {
            for profile in &self.profiles {
                passes.push(OcrPass::new(*variant, profile.clone()));
            }
        }
        passes
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CAPTIONQ_SPEECH_URL → engine.speech_url
    /// - CAPTIONQ_SPEECH_MODEL → engine.speech_model
    /// - CAPTIONQ_TRANSLATE_URL → translation.url
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("CAPTIONQ_SPEECH_URL")
            && !url.is_empty()
        {
            self.engine.speech_url = url;
        }

        if let Ok(model) = std::env::var("CAPTIONQ_SPEECH_MODEL")
            && !model.is_empty()
        {
            self.engine.speech_model = model;
        }

        if let Ok(url) = std::env::var("CAPTIONQ_TRANSLATE_URL")
            && !url.is_empty()
        {
            self.translation.url = url;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/captionq/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("captionq").join("config.toml"))
    }

    /// Derive pipeline options from this configuration.
    pub fn pipeline_options(&self) -> PipelineOptions {
        let footer = match &self.output.attribution {
            Some(attribution) => Footer::new(attribution.clone()),
            None => Footer::default(),
        };
        PipelineOptions {
            recognition_timeout: match self.scheduler.recognition_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            passes: self.engine.ocr_passes(),
            footer,
        }
    }
}
