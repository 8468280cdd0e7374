use serde::{Deserialize, Serialize};

/// Key store database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file (default: "./ferrous-dsync.db")
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Maximum connections in the key store pool (default: 4)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}?mode=rwc", self.path)
        }
    }
}

fn default_db_path() -> String {
    "./ferrous-dsync.db".to_string()
}

fn default_max_connections() -> u32 {
    4
}
