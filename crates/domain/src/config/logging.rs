use serde::{Deserialize, Serialize};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Base level for every target (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Extra per-target directives, e.g. "ferrous_dsync_jobs=debug"
    #[serde(default)]
    pub directives: Vec<String>,

    /// JSON lines instead of human-readable output (default: false)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directives: Vec::new(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn is_known_level(&self) -> bool {
        LEVELS.contains(&self.level.to_ascii_lowercase().as_str())
    }

    /// Level and directives joined in `EnvFilter` syntax.
    pub fn filter(&self) -> String {
        std::iter::once(self.level.to_ascii_lowercase())
            .chain(self.directives.iter().map(|d| d.trim().to_string()))
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
