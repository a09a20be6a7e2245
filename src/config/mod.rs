use anyhow::{Context, anyhow};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

mod admin_config;
mod logs_config;
mod server_config;
mod session_config;
mod storage_config;

pub use admin_config::AdminConfig;
pub use logs_config::LogsConfig;
pub use server_config::ServerConfig;
pub use session_config::SessionConfig;
pub use storage_config::StorageConfig;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
    pub session: SessionConfig,
    pub logs: LogsConfig,
}

pub(crate) fn root_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn parse_config_path() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args();
    args.next();
    while let Some(arg) = args.next() {
        if arg == "-c" || arg == "--config" {
            return match args.next() {
                Some(path) => Ok(Some(PathBuf::from(path))),
                None => Err(anyhow!(
                    "Error: Please specify path string for -c argument."
                )),
            };
        }
    }
    Ok(None)
}

fn parse_env<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("Error: Invalid value '{value}' for environment variable {key}"))
}

impl Config {
    /// Reads a TOML configuration file. Missing sections fall back to defaults.
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.is_file() {
            return Err(anyhow!(
                "Error: Configuration file not found or invalid.\n\
            Please make sure that the configuration file exists and is a valid TOML file.\n\
            Expected file path: {:?}",
                path
            ));
        }
        let content = std::fs::read_to_string(path).with_context(|| {
            "Error: Failed to read configuration file.\n\
            Please check the file path and permissions, and make sure the file is accessible"
        })?;
        toml::from_str(&content).with_context(|| {
            "Error: Failed to parse configuration file.\n\
            Please check the file syntax is valid TOML syntax"
        })
    }

    /// Overrides fields from environment-style variables provided by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Some(data_file) = lookup("DATA_FILE") {
            self.storage.data_file = data_file;
        }
        if let Some(api_key) = lookup("ADMIN_KEY") {
            self.admin.api_key = api_key;
        }
        if let Some(username) = lookup("ADMIN_USER") {
            self.admin.username = username;
        }
        if let Some(password) = lookup("ADMIN_PASS") {
            self.admin.password = password;
        }
        if let Some(timeout) = lookup("SESSION_IDLE_TIMEOUT") {
            self.session.idle_timeout_secs = parse_env("SESSION_IDLE_TIMEOUT", &timeout)?;
        }
        if let Some(secure) = lookup("SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = parse_env("SESSION_SECURE_COOKIE", &secure)?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logs.level = logs_config::parse_level(&level).ok_or_else(|| {
                anyhow!("Error: Unsupported log level '{level}' in environment variable LOG_LEVEL")
            })?;
        }
        Ok(())
    }
}

/// Builds the effective configuration: defaults, then the `-c` file, then the environment.
pub fn load() -> anyhow::Result<Config> {
    // a missing .env is the common case
    let _ = dotenvy::dotenv();
    let mut config = match parse_config_path()? {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.session.idle_timeout_secs, 1800);
        assert!(config.session.secure_cookie);
        assert_eq!(config.logs.level, tracing::Level::INFO);
        assert!(config.admin.uses_default_secrets());
    }

    #[test]
    fn env_overrides_defaults() {
        let vars = HashMap::from([
            ("PORT", "8080"),
            ("ADMIN_KEY", "k3y"),
            ("ADMIN_USER", "root"),
            ("ADMIN_PASS", "hunter2"),
            ("SESSION_SECURE_COOKIE", "false"),
            ("LOG_LEVEL", "Debug"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|key| vars.get(key).map(|it| it.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.admin.api_key, "k3y");
        assert_eq!(config.admin.username, "root");
        assert_eq!(config.admin.password, "hunter2");
        assert!(!config.session.secure_cookie);
        assert_eq!(config.logs.level, tracing::Level::DEBUG);
        assert!(!config.admin.uses_default_secrets());
    }

    #[test]
    fn invalid_env_value_is_rejected() {
        let mut config = Config::default();
        assert!(
            config
                .apply_env(|key| (key == "PORT").then(|| "ten".to_string()))
                .is_err()
        );
        assert!(
            config
                .apply_env(|key| (key == "LOG_LEVEL").then(|| "loud".to_string()))
                .is_err()
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[admin]\napi_key = \"from-file\"\n\n[logs]\nlevel = \"warn\""
        )
        .unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.admin.api_key, "from-file");
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.logs.level, tracing::Level::WARN);
    }
}
