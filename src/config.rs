use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Global configuration for the dashboard server
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admin identity and session settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Database and upload directory locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Image upload limits
    #[serde(default)]
    pub uploads: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// HTTP port (default: 9500)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Email of the single admin identity (required)
    pub admin_email: Option<String>,

    /// Password of the single admin identity (required)
    pub admin_password: Option<String>,

    /// Required at startup and must not be the placeholder value. Sessions
    /// are held server-side as opaque ids, so the value is currently only
    /// checked for presence.
    pub session_secret: Option<String>,

    /// Set the Secure attribute on the session cookie
    #[serde(default)]
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory holding uploaded thumbnail images
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Maximum image width/height in pixels (default: 1024)
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u32,

    /// Maximum upload size in bytes (default: 1 MiB)
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind_address(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            upload_dir: default_upload_dir(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_image_size: default_max_image_size(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

fn default_port() -> u16 {
    9500
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/homelinks.sqlite")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./data/uploads")
}

fn default_max_image_size() -> u32 {
    1024
}

fn default_max_image_bytes() -> usize {
    1024 * 1024
}

/// Session secret value that must be replaced before the server will start
const PLACEHOLDER_SECRET: &str = "change-me";

impl Config {
    /// Load configuration from an optional TOML file, then apply environment
    /// variable overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => Config::default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Environment variables take precedence over the config file
    fn apply_env(&mut self) {
        if let Some(port) = env_parse::<u16>("PORT") {
            self.server.port = port;
        }
        if let Ok(bind) = std::env::var("BIND") {
            self.server.bind = bind;
        }
        if let Ok(email) = std::env::var("ADMIN_EMAIL") {
            self.auth.admin_email = Some(email);
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }
        if let Ok(secret) = std::env::var("SESSION_SECRET") {
            self.auth.session_secret = Some(secret);
        }
        if let Ok(secure) = std::env::var("COOKIE_SECURE") {
            self.auth.cookie_secure = secure == "true";
        }
        if let Ok(db_path) = std::env::var("DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }
        if let Ok(upload_dir) = std::env::var("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(upload_dir);
        }
        if let Some(size) = env_parse::<u32>("MAX_IMAGE_SIZE") {
            self.uploads.max_image_size = size;
        }
        if let Some(bytes) = env_parse::<usize>("MAX_IMAGE_BYTES") {
            self.uploads.max_image_bytes = bytes;
        }
    }

    /// Validate that the admin identity is fully configured. The server
    /// refuses to start without it.
    pub fn validate(&self) -> Result<()> {
        if self.auth.admin_email.as_deref().unwrap_or("").is_empty() {
            bail!("Auth is required. Set ADMIN_EMAIL, ADMIN_PASSWORD, and SESSION_SECRET.");
        }
        if self.auth.admin_password.as_deref().unwrap_or("").is_empty() {
            bail!("Auth is required. Set ADMIN_EMAIL, ADMIN_PASSWORD, and SESSION_SECRET.");
        }
        match self.auth.session_secret.as_deref() {
            None | Some("") | Some(PLACEHOLDER_SECRET) => {
                bail!("SESSION_SECRET must be set to a non-default value");
            }
            Some(_) => {}
        }
        if self.uploads.max_image_size == 0 {
            bail!("max_image_size must be greater than zero");
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
