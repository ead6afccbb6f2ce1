use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ctcae_core::collections::collection;
use ctcae_core::service::EmbeddingModel;
use ctcae_search::build::IndexTarget;
use ctcae_search::query::MAX_K;

use crate::candidates::SelectionPolicy;
use crate::error::ConfigError;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

/// Longest accepted per-request deadline.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    pub config_version: u32,
    pub term_collection: String,
    pub grade_collection: String,
    pub top_n_terms: usize,
    pub top_n_grades: usize,
    /// Score gap under which the runner-up term is also considered.
    pub near_tie_margin: f32,
    /// Term candidates scoring below this are discarded.
    pub min_similarity: f32,
    pub request_timeout_secs: u64,
    pub embedding: EmbeddingSettings,
    pub completion: CompletionSettings,
    pub region: String,
    pub embed_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_id: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            term_collection: collection::TERMS.to_string(),
            grade_collection: collection::GRADES.to_string(),
            top_n_terms: 5,
            top_n_grades: 5,
            near_tie_margin: 0.02,
            min_similarity: 0.30,
            request_timeout_secs: 30,
            embedding: EmbeddingSettings::default(),
            completion: CompletionSettings::default(),
            region: "us-east-1".to_string(),
            embed_concurrency: 8,
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_id: "amazon.titan-embed-text-v2:0".to_string(),
            dimension: 1024,
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model_id: "us.anthropic.claude-sonnet-4-20250514-v1:0".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
        }
    }
}

/// `<platform config dir>/ctcae-matcher/config.json`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join("ctcae-matcher").join("config.json"))
}

impl MatcherConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        // Parse as raw JSON so we can run migrations before deserializing.
        let json: serde_json::Value = serde_json::from_str(&contents)?;
        let on_disk_version = json
            .get("config_version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let migrated = migrate(json, on_disk_version)?;
        let config: MatcherConfig = serde_json::from_value(migrated)?;
        tracing::info!(path = %path.display(), version = config.config_version, "config loaded");
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        // Always write the current version, regardless of what was loaded.
        let mut stamped = self.clone();
        stamped.config_version = CURRENT_VERSION;
        let json = serde_json::to_string_pretty(&stamped)?;

        // Write to a temp file then rename for atomicity
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json.as_bytes())?;
        std::fs::rename(&tmp_path, path)?;

        tracing::info!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CTCAE_EMBEDDING_MODEL") {
            self.embedding.model_id = v;
        }
        if let Some(v) = lookup("CTCAE_COMPLETION_MODEL") {
            self.completion.model_id = v;
        }
        if let Some(v) = lookup("AWS_REGION") {
            self.region = v;
        }
        if let Some(v) = parse_override(&lookup, "CTCAE_TOP_N_TERMS")? {
            self.top_n_terms = v;
        }
        if let Some(v) = parse_override(&lookup, "CTCAE_TOP_N_GRADES")? {
            self.top_n_grades = v;
        }
        if let Some(v) = parse_override(&lookup, "CTCAE_NEAR_TIE_MARGIN")? {
            self.near_tie_margin = v;
        }
        if let Some(v) = parse_override(&lookup, "CTCAE_MIN_SIMILARITY")? {
            self.min_similarity = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, n) in [
            ("top_n_terms", self.top_n_terms),
            ("top_n_grades", self.top_n_grades),
        ] {
            if n == 0 || n > MAX_K {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be between 1 and {MAX_K}, got {n}"),
                });
            }
        }
        if self.near_tie_margin.is_nan() || self.near_tie_margin < 0.0 {
            return Err(ConfigError::Invalid {
                field: "near_tie_margin",
                reason: format!("must be non-negative, got {}", self.near_tie_margin),
            });
        }
        if !(-1.0..=1.0).contains(&self.min_similarity) {
            return Err(ConfigError::Invalid {
                field: "min_similarity",
                reason: format!("must be within [-1, 1], got {}", self.min_similarity),
            });
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: format!(
                    "must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}, got {}",
                    self.request_timeout_secs
                ),
            });
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid {
                field: "embedding.dimension",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.term_collection == self.grade_collection {
            return Err(ConfigError::Invalid {
                field: "grade_collection",
                reason: "must differ from term_collection".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn embedding_model(&self) -> EmbeddingModel {
        EmbeddingModel::new(&self.embedding.model_id, self.embedding.dimension)
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            min_similarity: self.min_similarity,
            near_tie_margin: self.near_tie_margin,
        }
    }

    pub fn index_target(&self) -> IndexTarget {
        IndexTarget {
            term_collection: self.term_collection.clone(),
            grade_collection: self.grade_collection.clone(),
        }
    }
}

fn parse_override<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidOverride { var, value }),
    }
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> Result<serde_json::Value, ConfigError> {
    if from_version > CURRENT_VERSION {
        return Err(ConfigError::UnsupportedVersion {
            found: from_version,
            supported: CURRENT_VERSION,
        });
    }

    // v0 → v1: `similarity_threshold` renamed to `min_similarity`.
    if from_version < 1 {
        let obj = json.as_object_mut().ok_or(ConfigError::NotAnObject)?;
        if let Some(threshold) = obj.remove("similarity_threshold") {
            obj.entry("min_similarity").or_insert(threshold);
        }
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (renamed similarity_threshold)");
    }

    Ok(json)
}
