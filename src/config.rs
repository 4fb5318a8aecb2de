//! Fixed run parameters and the translator configuration file.
//!
//! The constants are the defaults used by both binaries; the CLI only
//! exposes overrides for paths and the listing URL. Pacing and batch size
//! are not configurable from the command line.

use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Listing page that links to every question page.
pub const BASE_URL: &str = "https://www.familyfeudfriends.com/answers/";
/// Extracted questions.
pub const DATA_FILE: &str = "data.json";
/// Translated questions.
pub const TRANSLATED_FILE: &str = "dataRu.json";
/// Translator settings (DeepL key).
pub const CONFIG_FILE: &str = "config.yaml";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub const BATCH_SIZE: usize = 10;
pub const BATCH_DELAY: Duration = Duration::from_millis(500);
pub const ITEM_DELAY: Duration = Duration::from_millis(100);

pub const SOURCE_LANG: &str = "en";
pub const TARGET_LANG: &str = "ru";
pub const VARIANT_DELAY: Duration = Duration::from_millis(500);
pub const RECORD_DELAY: Duration = Duration::from_millis(1000);
pub const RETRY_ATTEMPTS: u32 = 5;
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);
pub const RETRY_MAX_DELAY: Duration = Duration::from_millis(60_000);

/// Contents of `config.yaml`.
///
/// ```yaml
/// deepl_auth_key: "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx:fx"
/// # deepl_api_url: "https://api-free.deepl.com"
/// source_lang: en
/// target_lang: ru
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub deepl_auth_key: Option<String>,
    /// Overrides the endpoint picked from the key type.
    pub deepl_api_url: Option<String>,
    pub source_lang: String,
    pub target_lang: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            deepl_auth_key: None,
            deepl_api_url: None,
            source_lang: SOURCE_LANG.to_string(),
            target_lang: TARGET_LANG.to_string(),
        }
    }
}

impl TranslatorConfig {
    /// Load the config file, or defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file not found; using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(Box::new(e)),
        };
        let config: Self = serde_yaml::from_str(&raw)?;
        info!(
            has_key = config.deepl_auth_key.is_some(),
            source_lang = %config.source_lang,
            target_lang = %config.target_lang,
            "Loaded translator configuration"
        );
        Ok(config)
    }

    /// Replace the file's key with one given on the command line or in the environment.
    pub fn with_auth_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key {
            self.deepl_auth_key = Some(key);
        }
        self
    }
}
