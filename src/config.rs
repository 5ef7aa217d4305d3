use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub gesture: GestureSettings,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// How filter changes reach the people source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Fetch the whole collection once and filter in memory
    #[default]
    Local,
    /// Issue a filtered fetch for every filter change
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub filter_mode: FilterMode,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project_id: String::new(),
            database: default_database(),
            collection: default_collection(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            filter_mode: FilterMode::default(),
        }
    }
}

fn default_endpoint() -> String { "https://firestore.googleapis.com/v1".to_string() }
fn default_database() -> String { "(default)".to_string() }
fn default_collection() -> String { "people".to_string() }
fn default_timeout_secs() -> u64 { 30 }

/// Swipe gesture tuning
///
/// Distances are in the renderer's horizontal units, angles in degrees.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[validate(schema(function = "validate_gesture"))]
pub struct GestureSettings {
    #[serde(default = "default_commit_threshold")]
    #[validate(range(min = 1.0))]
    pub commit_threshold: f64,
    #[serde(default = "default_max_rotation")]
    #[validate(range(min = 0.0))]
    pub max_rotation_degrees: f64,
    #[serde(default = "default_rotation_divisor")]
    #[validate(range(min = 1.0))]
    pub rotation_divisor: f64,
    #[serde(default = "default_fly_off_distance")]
    #[validate(range(min = 1.0))]
    pub fly_off_distance: f64,
    #[serde(default = "default_fade_distance")]
    #[validate(range(min = 1.0))]
    pub fade_distance: f64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_animation_duration_ms")]
    pub animation_duration_ms: u64,
    #[serde(default = "default_frame_interval_ms")]
    #[validate(range(min = 1))]
    pub frame_interval_ms: u64,
}

impl GestureSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            commit_threshold: default_commit_threshold(),
            max_rotation_degrees: default_max_rotation(),
            rotation_divisor: default_rotation_divisor(),
            fly_off_distance: default_fly_off_distance(),
            fade_distance: default_fade_distance(),
            settle_delay_ms: default_settle_delay_ms(),
            animation_duration_ms: default_animation_duration_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

fn default_commit_threshold() -> f64 { 200.0 }
fn default_max_rotation() -> f64 { 15.0 }
fn default_rotation_divisor() -> f64 { 400.0 }
fn default_fly_off_distance() -> f64 { 2000.0 }
fn default_fade_distance() -> f64 { 1000.0 }
fn default_settle_delay_ms() -> u64 { 100 }
fn default_animation_duration_ms() -> u64 { 250 }
fn default_frame_interval_ms() -> u64 { 16 }

fn validate_gesture(settings: &GestureSettings) -> Result<(), ValidationError> {
    // Range checks let NaN through
    let distances = [
        settings.commit_threshold,
        settings.max_rotation_degrees,
        settings.rotation_divisor,
        settings.fly_off_distance,
        settings.fade_distance,
    ];
    if distances.iter().any(|value| !value.is_finite()) {
        return Err(ValidationError::new("non_finite_gesture_value"));
    }

    // A fly-off that stops short of the threshold would look like a cancel
    if settings.fly_off_distance <= settings.commit_threshold {
        return Err(ValidationError::new("fly_off_within_threshold"));
    }
    Ok(())
}

/// Selectable filter tags
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSettings {
    #[serde(default = "default_domains")]
    pub domains: Vec<String>,
    #[serde(default = "default_interests")]
    pub interests: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            domains: default_domains(),
            interests: default_interests(),
        }
    }
}

fn default_domains() -> Vec<String> {
    ["Tech", "Design", "Business", "Marketing"].map(String::from).to_vec()
}

fn default_interests() -> Vec<String> {
    ["Coding", "Photography", "UI/UX", "Startups", "Branding"].map(String::from).to_vec()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with DECK_), including a `.env` file
    pub fn load() -> Result<Self, SettingsError> {
        dotenv::dotenv().ok();

        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., DECK__GESTURE__COMMIT_THRESHOLD -> gesture.commit_threshold
            .add_source(env_source())
            .build()?;

        Self::finish(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        Self::finish(settings)
    }

    /// Load configuration from an in-memory TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Self::finish(settings)
    }

    fn finish(config: Config) -> Result<Self, SettingsError> {
        let settings: Settings = config.try_deserialize()?;
        settings.gesture.validate()?;
        Ok(settings)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("DECK")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
