use serde::{Deserialize, Deserializer};
use tracing::Level;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LogsConfig {
    #[serde(deserialize_with = "level_deserialize")]
    pub level: Level,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

pub(crate) fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn level_deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_level(&s).ok_or_else(|| {
        serde::de::Error::custom(format!("Unsupported log level: {}", s))
    })
}
