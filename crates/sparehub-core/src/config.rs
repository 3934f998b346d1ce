//! Configuration module
//!
//! Settings are read from the process environment (optionally seeded from a `.env`
//! file) into [`Config`]. Unparseable numeric values fall back to their defaults;
//! structural problems are reported by [`Config::validate`].

use std::env;
use std::path::PathBuf;

use crate::models::PersistMode;

const DEFAULT_PORT: u16 = 3002;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 10;
const MAX_IMPORT_ROWS: usize = 5000;
const DEFAULT_ALLOWED_EXTENSIONS: &str = "xlsx,xls,csv";
const DEFAULT_TEMPLATE_DIR: &str = "./templates";

/// HTTP server and database pool settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub log_format: String,
}

/// Bulk ingestion settings
#[derive(Clone, Debug)]
pub struct IngestionConfig {
    pub max_upload_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub max_import_rows: usize,
    pub default_persist_mode: PersistMode,
    /// Directory for spooled uploads; `None` uses the system temp dir.
    pub upload_tmp_dir: Option<PathBuf>,
    pub template_dir: PathBuf,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            allowed_extensions: split_list(DEFAULT_ALLOWED_EXTENSIONS),
            max_import_rows: MAX_IMPORT_ROWS,
            default_persist_mode: PersistMode::Isolated,
            upload_tmp_dir: None,
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ingestion: IngestionConfig,
    pub database_url: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn new(config: AppConfig) -> Self {
        Config(Box::new(config))
    }

    fn inner(&self) -> &AppConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().server.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = AppConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().server.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().server.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().server.db_timeout_seconds
    }

    pub fn environment(&self) -> &str {
        &self.inner().server.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().server.log_format
    }

    pub fn ingestion(&self) -> &IngestionConfig {
        &self.inner().ingestion
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().ingestion.max_upload_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().ingestion.allowed_extensions
    }

    pub fn max_import_rows(&self) -> usize {
        self.inner().ingestion.max_import_rows
    }

    pub fn default_persist_mode(&self) -> PersistMode {
        self.inner().ingestion.default_persist_mode
    }

    pub fn template_dir(&self) -> &std::path::Path {
        &self.inner().ingestion.template_dir
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server = ServerConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase(),
        };

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let default_persist_mode = match env::var("DEFAULT_PERSIST_MODE") {
            Ok(raw) => raw
                .parse::<PersistMode>()
                .map_err(|e| anyhow::anyhow!("DEFAULT_PERSIST_MODE: {}", e))?,
            Err(_) => PersistMode::Isolated,
        };

        let ingestion = IngestionConfig {
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            allowed_extensions: split_list(
                &env::var("ALLOWED_UPLOAD_EXTENSIONS")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_EXTENSIONS.to_string()),
            ),
            max_import_rows: env::var("MAX_IMPORT_ROWS")
                .unwrap_or_else(|_| MAX_IMPORT_ROWS.to_string())
                .parse()
                .unwrap_or(MAX_IMPORT_ROWS),
            default_persist_mode,
            upload_tmp_dir: env::var("UPLOAD_TMP_DIR").ok().map(PathBuf::from),
            template_dir: env::var("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TEMPLATE_DIR)),
        };

        Ok(AppConfig {
            server,
            ingestion,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        let env = self.server.environment.to_lowercase();
        let is_production = env == "production" || env == "prod";
        if is_production && self.server.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.server.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be greater than 0"));
        }

        if self.server.db_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("DB_TIMEOUT_SECONDS must be greater than 0"));
        }

        if self.ingestion.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.ingestion.max_import_rows == 0 {
            return Err(anyhow::anyhow!("MAX_IMPORT_ROWS must be greater than 0"));
        }

        const SUPPORTED: [&str; 3] = ["xlsx", "xls", "csv"];
        if self.ingestion.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_UPLOAD_EXTENSIONS must list at least one extension"
            ));
        }
        if let Some(ext) = self
            .ingestion
            .allowed_extensions
            .iter()
            .find(|ext| !SUPPORTED.contains(&ext.as_str()))
        {
            return Err(anyhow::anyhow!(
                "ALLOWED_UPLOAD_EXTENSIONS contains unsupported extension '{}' (supported: {})",
                ext,
                SUPPORTED.join(", ")
            ));
        }

        if !matches!(self.server.log_format.as_str(), "text" | "json") {
            return Err(anyhow::anyhow!("LOG_FORMAT must be 'text' or 'json'"));
        }

        Ok(())
    }
}
