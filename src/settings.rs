//! Settings infrastructure for the kousei language server.
//!
//! Settings arrive through two channels: an optional `kousei.toml` discovered
//! by walking up from the workspace root, and the `initializationOptions`
//! payload of the `initialize` request. The client payload wins field by
//! field. Everything is optional; missing or malformed input degrades to
//! defaults rather than failing initialization.

use std::path::{Path, PathBuf};

use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_charset() -> String {
    "UTF-8".to_string()
}

fn default_min_japanese_ratio() -> f64 {
    0.1
}

/// Minimum severity gate: 1=Error, 2=Warning, 3=Info, 4=Hint.
fn default_warning_min_severity() -> i64 {
    2
}

fn default_comma_limit_max() -> i64 {
    3
}

fn default_streak_max() -> i64 {
    1
}

/// Root settings structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Morphological tokenizer configuration.
    #[serde(alias = "mecab")]
    pub tokenizer: TokenizerSettings,
    /// Analysis and rule configuration.
    pub analysis: AnalysisSettings,
}

/// Tokenizer backend configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenizerSettings {
    /// Dictionary directory for the morphological backend.
    pub dicdir: Option<PathBuf>,
    /// Character encoding of the dictionary ("UTF-8", "EUC-JP", ...).
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl Default for TokenizerSettings {
    fn default() -> Self {
        Self {
            dicdir: None,
            charset: default_charset(),
        }
    }
}

/// Analysis configuration shared by the whole pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisSettings {
    /// Enable dependency parsing through the external backend.
    #[serde(alias = "enableCaboCha")]
    pub enable_dependency_parse: bool,
    /// Enable the grammar diagnostic engine.
    pub grammar_check: bool,
    /// Minimum ratio of Japanese characters required to run analysis.
    pub min_japanese_ratio: f64,
    /// Diagnostics below this severity are suppressed entirely.
    pub warning_min_severity: i64,
    /// Per-rule toggles and thresholds.
    pub rules: RuleSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            enable_dependency_parse: true,
            grammar_check: true,
            min_japanese_ratio: default_min_japanese_ratio(),
            warning_min_severity: default_warning_min_severity(),
            rules: RuleSettings::default(),
        }
    }
}

/// Per-rule enable flags and numeric thresholds.
///
/// A threshold of zero or below disables its rule even when the flag is on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleSettings {
    pub comma_limit: bool,
    pub adversative_ga: bool,
    pub duplicate_particle_surface: bool,
    pub adjacent_particles: bool,
    pub conjunction_repeat: bool,
    pub ra_dropping: bool,
    pub comma_limit_max: i64,
    pub adversative_ga_max: i64,
    pub duplicate_particle_surface_max_repeat: i64,
    pub adjacent_particles_max_repeat: i64,
    pub conjunction_repeat_max: i64,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            comma_limit: default_true(),
            adversative_ga: default_true(),
            duplicate_particle_surface: default_true(),
            adjacent_particles: default_true(),
            conjunction_repeat: default_true(),
            ra_dropping: default_true(),
            comma_limit_max: default_comma_limit_max(),
            adversative_ga_max: default_streak_max(),
            duplicate_particle_surface_max_repeat: default_streak_max(),
            adjacent_particles_max_repeat: default_streak_max(),
            conjunction_repeat_max: default_streak_max(),
        }
    }
}

/// Load settings from a kousei.toml file.
///
/// Returns `None` if the file doesn't exist or can't be parsed.
pub fn load_settings_file(path: &Path) -> Option<serde_json::Value> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<toml::Value>(&content) {
        Ok(value) => serde_json::to_value(value).ok(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse kousei.toml");
            None
        }
    }
}

/// Discover kousei.toml by walking up the directory tree from `start_dir`.
///
/// Returns the parsed file as a JSON value plus the directory that holds it.
pub fn discover_settings_file(start_dir: &Path) -> Option<(serde_json::Value, PathBuf)> {
    let mut dir = Some(start_dir);
    while let Some(current) = dir {
        let candidate = current.join("kousei.toml");
        if candidate.is_file() {
            if let Some(value) = load_settings_file(&candidate) {
                return Some((value, current.to_path_buf()));
            }
        }
        dir = current.parent();
    }
    None
}

/// Deep-merge `overlay` into `base`: objects merge key by key, everything
/// else is replaced by the overlay value.
fn merge_values(base: serde_json::Value, overlay: serde_json::Value) -> serde_json::Value {
    match (base, overlay) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => value,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Resolve effective settings from a workspace root and the client's
/// `initializationOptions` payload. Client options override the file.
pub fn resolve_settings(
    workspace_root: Option<&Path>,
    initialization_options: Option<serde_json::Value>,
) -> Settings {
    let file_value = workspace_root
        .and_then(discover_settings_file)
        .map(|(value, dir)| {
            tracing::debug!(dir = %dir.display(), "loaded workspace kousei.toml");
            value
        });

    let merged = match (file_value, initialization_options) {
        (Some(base), Some(overlay)) => merge_values(base, overlay),
        (Some(base), None) => base,
        (None, Some(overlay)) => overlay,
        (None, None) => return Settings::default(),
    };

    match serde_json::from_value(merged) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, "invalid settings payload, using defaults");
            Settings::default()
        }
    }
}
