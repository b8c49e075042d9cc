//! Server configuration and feature manifest for the JAAT relay.
//!
//! This crate defines the process-wide, read-only inputs of the server:
//!
//! - [`ServerConfig`] — Credential, model, listener and asset settings read from the environment
//! - [`FeatureDescriptor`] and [`FeatureKind`] — Capabilities advertised to the front end
//! - [`FeatureRegistry`] — Typed feature list loaded once from a JSON manifest
//!
//! # Loading from the environment
//!
//! ```rust,ignore
//! use jaat_config::ServerConfig;
//!
//! let config = ServerConfig::from_env()?;
//! println!("listening on {}", config.addr());
//! ```
//!
//! # Feature manifest
//!
//! ```rust
//! use jaat_config::FeatureRegistry;
//!
//! let registry = FeatureRegistry::from_json(r#"{
//!     "version": 1,
//!     "features": [
//!         { "id": "mode1-coder", "name": "Coder", "type": "mode", "number": "1" }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(registry.modes().count(), 1);
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_ASSET_ROOT: &str = "public";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON configuration.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment variable held a value that could not be used.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// The feature manifest lists the same id twice.
    #[error("Duplicate feature id in manifest: '{0}'")]
    DuplicateFeature(String),
}

impl ConfigError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Creates an invalid value error.
    pub fn invalid(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue { key: key.into(), value: value.into() }
    }
}

// ============================================================================
// Server configuration
// ============================================================================

/// Process-wide settings, read once at startup and never mutated.
///
/// A missing API key is not an error: the chat endpoint answers with a
/// fixed fallback message instead of calling the completion API.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Credential for the completion API (`OPENAI_API_KEY`).
    pub api_key: Option<String>,
    /// Completion model identifier (`DEFAULT_MODEL`).
    pub model: String,
    /// Alternative OpenAI-compatible endpoint (`OPENAI_API_BASE`).
    pub api_base: Option<String>,
    /// Bind address (`HOST`).
    pub host: String,
    /// Listening port (`PORT`).
    pub port: u16,
    /// Primary static asset root (`ASSET_ROOT`).
    pub asset_root: PathBuf,
    /// Secondary static asset root (`ASSET_FALLBACK_ROOT`).
    pub asset_fallback_root: PathBuf,
    /// JSON feature manifest (`FEATURES_MANIFEST`).
    pub features_manifest: Option<PathBuf>,
    /// Upper bound on a single completion call (`UPSTREAM_TIMEOUT_SECS`).
    pub upstream_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let asset_root = PathBuf::from(DEFAULT_ASSET_ROOT);
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            asset_fallback_root: parent_or_cwd(&asset_root),
            asset_root,
            features_manifest: None,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::invalid("PORT", raw))?,
            None => defaults.port,
        };

        let upstream_timeout = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::invalid("UPSTREAM_TIMEOUT_SECS", raw)),
            },
            None => defaults.upstream_timeout,
        };

        let asset_root = var("ASSET_ROOT").map(PathBuf::from).unwrap_or(defaults.asset_root);
        let asset_fallback_root = var("ASSET_FALLBACK_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| parent_or_cwd(&asset_root));

        Ok(Self {
            api_key: var("OPENAI_API_KEY"),
            model: var("DEFAULT_MODEL").unwrap_or(defaults.model),
            api_base: var("OPENAI_API_BASE"),
            host: var("HOST").unwrap_or(defaults.host),
            port,
            asset_root,
            asset_fallback_root,
            features_manifest: var("FEATURES_MANIFEST").map(PathBuf::from),
            upstream_timeout,
        })
    }

    /// Returns `true` if a completion API credential is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the `host:port` socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the asset roots in lookup priority order.
    pub fn asset_roots(&self) -> Vec<PathBuf> {
        vec![self.asset_root.clone(), self.asset_fallback_root.clone()]
    }
}

fn parent_or_cwd(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ============================================================================
// Feature manifest
// ============================================================================

/// Whether a descriptor names a standalone feature or an assistant mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    #[default]
    Feature,
    Mode,
}

/// A capability or mode shown to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<bool>,
    #[serde(rename = "type", default)]
    pub kind: FeatureKind,
    /// Display number for modes (e.g. "3" for the third mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

impl FeatureDescriptor {
    fn builtin(id: &str, name: &str, description: &str, icon: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: Some(description.into()),
            icon: Some(icon.into()),
            premium: Some(false),
            kind: FeatureKind::Feature,
            number: None,
        }
    }
}

/// Versioned on-disk manifest. A bare JSON array of descriptors is accepted too.
#[derive(Deserialize)]
struct VersionedManifest {
    #[allow(dead_code)]
    version: u32,
    features: Vec<FeatureDescriptor>,
}

/// Picks the manifest shape from the first token so a bad descriptor reports
/// its own field error instead of a generic shape mismatch.
fn parse_manifest(json: &str) -> Result<Vec<FeatureDescriptor>, ConfigError> {
    match json.trim_start().starts_with('[') {
        true => Ok(serde_json::from_str(json)?),
        false => Ok(serde_json::from_str::<VersionedManifest>(json)?.features),
    }
}

/// Feature descriptors loaded once at startup.
///
/// Listing never touches the filesystem, so repeated calls return the same
/// descriptors in the same order.
#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    features: Vec<FeatureDescriptor>,
}

impl FeatureRegistry {
    /// Returns the compiled-in feature list.
    pub fn builtin() -> Self {
        Self {
            features: vec![
                FeatureDescriptor::builtin(
                    "neural-machine-translation",
                    "Neural Machine Translation",
                    "Advanced AI-powered translation with neural networks for higher accuracy",
                    "fas fa-language",
                ),
                FeatureDescriptor::builtin(
                    "advanced-mental-health-chatbot",
                    "Mental Health Support",
                    "Specialized AI chatbot for mental health support and resources",
                    "fas fa-heart",
                ),
                FeatureDescriptor::builtin(
                    "social-media-content-creation",
                    "Social Media Content Creation",
                    "Generate and schedule content for various social media platforms",
                    "fas fa-share-alt",
                ),
            ],
        }
    }

    /// Builds a registry from descriptors, rejecting duplicate ids.
    pub fn new(features: Vec<FeatureDescriptor>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        if let Some(dup) = features.iter().find(|f| !seen.insert(f.id.as_str())) {
            return Err(ConfigError::DuplicateFeature(dup.id.clone()));
        }
        Ok(Self { features })
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::new(parse_manifest(json)?)
    }

    /// Loads a manifest from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Loads the manifest if a path is given, otherwise the compiled-in list.
    pub fn load(manifest: Option<&Path>) -> Result<Self, ConfigError> {
        match manifest {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Returns all descriptors in manifest order.
    pub fn list(&self) -> &[FeatureDescriptor] {
        &self.features
    }

    /// Returns the descriptors of kind [`FeatureKind::Mode`].
    pub fn modes(&self) -> impl Iterator<Item = &FeatureDescriptor> {
        self.features.iter().filter(|f| f.kind == FeatureKind::Mode)
    }
}
