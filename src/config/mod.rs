use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Application configuration structure
///
/// Built once at startup and shared read-only through `AppState`.
/// Sources, lowest to highest precedence:
/// - built-in defaults
/// - `config.yaml` in the working directory
/// - `APP_`-prefixed variables, `__` separating sections (`APP_UPLOAD__DEST_DIR`)
/// - the bare `PORT` and `DEST_FILE` variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub debug: bool,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded files are written to. Reported paths are this
    /// value followed by the stored file name.
    pub dest_dir: String,
    /// Largest accepted file, in bytes.
    pub max_file_size: u64,
    /// Case-sensitive file name suffixes accepted for upload, without the dot.
    pub allowed_extensions: Vec<String>,
    /// URL prefix the destination directory is served under.
    pub public_path: String,
}

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "image-upload-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                debug: true,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            upload: UploadConfig {
                dest_dir: "uploads/".to_string(),
                max_file_size: DEFAULT_MAX_FILE_SIZE,
                allowed_extensions: ["jpg", "jpeg", "png", "gif"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                public_path: "/uploads".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Layered configuration sources, without extracting.
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file("config.yaml"))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
            .merge(Env::raw().only(&["DEST_FILE"]).map(|_| "upload.dest_dir".into()))
    }

    pub fn load() -> Result<Self> {
        info!("Loading application configuration...");

        let config: AppConfig = Self::figment().extract()?;
        config.validate()?;

        info!("Configuration loaded successfully");
        info!(
            "name: {:?}, version: {}, debug: {}",
            config.app.name, config.app.version, config.app.debug
        );
        info!("Listen: {}:{}", config.server.host, config.server.port);
        info!("Upload directory: {}", config.upload.dest_dir);
        info!("Max file size: {} bytes", config.upload.max_file_size);

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let upload = &self.upload;
        if upload.dest_dir.is_empty() {
            bail!("upload.dest_dir must not be empty");
        }
        if upload.max_file_size == 0 {
            bail!("upload.max_file_size must be greater than zero");
        }
        if upload.allowed_extensions.is_empty() {
            bail!("upload.allowed_extensions must list at least one extension");
        }
        if !upload.public_path.starts_with('/') || upload.public_path.trim_end_matches('/').is_empty() {
            bail!(
                "upload.public_path must be an absolute, non-root URL path (got {:?})",
                upload.public_path
            );
        }
        Ok(())
    }
}
