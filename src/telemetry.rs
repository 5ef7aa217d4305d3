use crate::config::LoggingSettings;
use tracing_subscriber::EnvFilter;

/// Output format of the fmt subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
    /// Plain single-line text
    Full,
}

impl LogFormat {
    /// Unknown names fall back to plain text
    pub fn from_setting(format: &str) -> Self {
        match format.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Full,
        }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set. Returns an error if a
/// subscriber is already installed, which callers may ignore.
pub fn init_logging(
    settings: &LoggingSettings,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match LogFormat::from_setting(&settings.format) {
        LogFormat::Json => subscriber.json().try_init(),
        LogFormat::Pretty => subscriber.pretty().try_init(),
        LogFormat::Compact => subscriber.compact().try_init(),
        LogFormat::Full => subscriber.try_init(),
    }
}
