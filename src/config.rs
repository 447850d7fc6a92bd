//! TOML configuration parsing and validation.
//!
//! Every section has defaults, so an empty file (or [`Config::default`])
//! yields a working in-process setup with the model transport disabled.
//!
//! ```toml
//! [db]
//! path = "./data/carecache.sqlite"
//!
//! [cache]
//! base_locale = "en"
//! min_image_payload = 100
//! supported_locales = ["en", "de", "el", "pt", "pt-BR"]
//!
//! [cache.versions]
//! garment = "v2"
//! translation = "v1"
//!
//! [model]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! timeout_secs = 30
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use care_cache_core::fingerprint::DEFAULT_MIN_IMAGE_PAYLOAD;
use care_cache_core::locale::{LocalePolicy, DEFAULT_SUPPORTED_LOCALES};
use care_cache_core::models::{RecordKind, BASE_LOCALE};
use care_cache_core::store::Namespace;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/carecache.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_base_locale")]
    pub base_locale: String,
    #[serde(default = "default_min_image_payload")]
    pub min_image_payload: usize,
    #[serde(default = "default_supported_locales")]
    pub supported_locales: Vec<String>,
    #[serde(default)]
    pub versions: CacheVersions,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_locale: default_base_locale(),
            min_image_payload: default_min_image_payload(),
            supported_locales: default_supported_locales(),
            versions: CacheVersions::default(),
        }
    }
}

fn default_base_locale() -> String {
    BASE_LOCALE.to_string()
}
fn default_min_image_payload() -> usize {
    DEFAULT_MIN_IMAGE_PAYLOAD
}
fn default_supported_locales() -> Vec<String> {
    DEFAULT_SUPPORTED_LOCALES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl CacheConfig {
    pub fn locale_policy(&self) -> LocalePolicy {
        LocalePolicy::new(self.base_locale.clone(), self.supported_locales.clone())
    }
}

/// Current schema version of every cache namespace.
///
/// Bumping a version makes every entry written under the old one
/// unreachable without deleting it.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CacheVersions {
    #[serde(default = "default_version")]
    pub garment: String,
    #[serde(default = "default_version")]
    pub fabric: String,
    #[serde(default = "default_version")]
    pub laundry: String,
    #[serde(default = "default_version")]
    pub stain: String,
    #[serde(default = "default_version")]
    pub batch: String,
    /// Applies to batch labels, and to translated records together with
    /// the version of the record kind they were translated from.
    #[serde(default = "default_version")]
    pub translation: String,
}

impl Default for CacheVersions {
    fn default() -> Self {
        Self {
            garment: default_version(),
            fabric: default_version(),
            laundry: default_version(),
            stain: default_version(),
            batch: default_version(),
            translation: default_version(),
        }
    }
}

fn default_version() -> String {
    "v1".to_string()
}

impl CacheVersions {
    /// Version under which `namespace` is currently read and written.
    ///
    /// Translated records use `<translation>:<kind version>`, so bumping
    /// either one orphans the translations. Versions never contain `:`,
    /// which keeps the pair unambiguous.
    pub fn for_namespace(&self, namespace: Namespace) -> Cow<'_, str> {
        match namespace {
            Namespace::Record(kind) => Cow::Borrowed(self.for_kind(kind)),
            Namespace::Translation(kind) => {
                Cow::Owned(format!("{}:{}", self.translation, self.for_kind(kind)))
            }
            Namespace::Label => Cow::Borrowed(&self.translation),
        }
    }

    fn for_kind(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Garment => &self.garment,
            RecordKind::Fabric => &self.fabric,
            RecordKind::Laundry => &self.laundry,
            RecordKind::Stain => &self.stain,
            RecordKind::Batch => &self.batch,
        }
    }

    fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("garment", &self.garment),
            ("fabric", &self.fabric),
            ("laundry", &self.laundry),
            ("stain", &self.stain),
            ("batch", &self.batch),
            ("translation", &self.translation),
        ]
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl ModelConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Check a configuration for values the engine cannot work with.
pub fn validate(config: &Config) -> Result<()> {
    // Validate cache
    if config.cache.min_image_payload == 0 {
        anyhow::bail!("cache.min_image_payload must be > 0");
    }
    if config.cache.base_locale.trim().is_empty() {
        anyhow::bail!("cache.base_locale must not be empty");
    }
    for (namespace, version) in config.cache.versions.entries() {
        if version.trim().is_empty() {
            anyhow::bail!("cache.versions.{} must not be empty", namespace);
        }
        if version.contains(':') {
            anyhow::bail!(
                "cache.versions.{} must not contain ':' (got '{}')",
                namespace,
                version
            );
        }
    }

    // Validate model
    if config.model.timeout_secs == 0 {
        anyhow::bail!("model.timeout_secs must be > 0");
    }
    match config.model.provider.as_str() {
        "disabled" => {}
        "openai" => {
            if config.model.model.is_none() {
                anyhow::bail!(
                    "model.model must be specified when provider is '{}'",
                    config.model.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown model provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.cache.base_locale, "en");
        assert_eq!(config.cache.min_image_payload, 100);
        assert_eq!(config.cache.versions, CacheVersions::default());
        assert!(!config.model.is_enabled());
        assert_eq!(config.model.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_versions() {
        let config = parse("[cache.versions]\ngarment = \"v7\"\n").unwrap();
        let versions = &config.cache.versions;
        assert_eq!(versions.for_namespace(Namespace::Record(RecordKind::Garment)), "v7");
        assert_eq!(versions.for_namespace(Namespace::Record(RecordKind::Stain)), "v1");
        assert_eq!(versions.for_namespace(Namespace::Label), "v1");
        assert_eq!(
            versions.for_namespace(Namespace::Translation(RecordKind::Garment)),
            "v1:v7"
        );
        assert_eq!(
            versions.for_namespace(Namespace::Translation(RecordKind::Fabric)),
            "v1:v1"
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse("[cache.versions]\nfabric = \"v1:beta\"\n").is_err());
        assert!(parse("[cache.versions]\nfabric = \"\"\n").is_err());
        assert!(parse("[cache]\nmin_image_payload = 0\n").is_err());
        assert!(parse("[model]\nprovider = \"openai\"\n").is_err());
        assert!(parse("[model]\nprovider = \"carrier-pigeon\"\n").is_err());
        assert!(parse("[model]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[db]\npath = \"/tmp/care.sqlite\"\n\n[model]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\ntimeout_secs = 5"
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.db.path, PathBuf::from("/tmp/care.sqlite"));
        assert_eq!(config.model.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.model.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_example_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/carecache.example.toml");
        let config = load_config(&path).unwrap();
        assert!(config.model.is_enabled());
        assert_eq!(
            config.cache.locale_policy().resolve("pt_br"),
            "pt-BR".to_string()
        );
    }
}
