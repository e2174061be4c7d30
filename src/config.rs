use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub invoice: InvoiceConfig,

    pub smtp: SmtpConfig,

    pub storage: StorageConfig,

    pub maintenance: MaintenanceConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/marketbook.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Upper bound for JSON request bodies in bytes.
    pub max_body_bytes: usize,

    /// Upper bound for uploaded images in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            max_body_bytes: 1024 * 1024,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Lifetime of ordinary bearer tokens.
    pub session_ttl_hours: i64,

    /// Lifetime of elevated admin grants.
    pub admin_grant_ttl_hours: i64,

    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            session_ttl_hours: 7 * 24,
            admin_grant_ttl_hours: 24,
            min_password_length: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackend {
    /// HTTP conversion API (PDFShift compatible)
    Remote,
    /// Headless Chromium on the host
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceConfig {
    /// Issuer brand printed in the invoice header.
    pub brand_name: String,

    pub currency_symbol: String,

    /// Due date offset from the moment of generation.
    pub due_days: i64,

    pub backend: RenderBackend,

    pub pdfshift_url: String,

    pub pdfshift_api_key: String,

    pub chromium_path: String,

    pub render_timeout_seconds: u64,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            brand_name: "Marketbook&solution".to_string(),
            currency_symbol: "₦".to_string(),
            due_days: 30,
            backend: RenderBackend::Remote,
            pdfshift_url: "https://api.pdfshift.io/v3/convert/pdf".to_string(),
            pdfshift_api_key: String::new(),
            chromium_path: "chromium".to_string(),
            render_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,

    pub port: u16,

    pub username: String,

    pub password: String,

    /// Sender address, e.g. `Marketbook <billing@example.com>`
    pub from_address: String,

    pub timeout_seconds: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_address: String::new(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub cloud_name: String,

    pub api_key: String,

    pub api_secret: String,

    pub upload_url: String,

    pub request_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            upload_url: "https://api.cloudinary.com/v1_1".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub enabled: bool,

    /// Cron expression (with seconds) for purging expired tokens.
    pub token_purge_cron: String,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token_purge_cron: "0 0 * * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "marketbook".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Deployment secrets come from the environment and win over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {port}"))?;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Some(key) = get("PDFSHIFT_API_KEY") {
            self.invoice.pdfshift_api_key = key;
        }
        if let Some(host) = get("SMTP_HOST") {
            self.smtp.host = host;
        }
        if let Some(port) = get("SMTP_PORT") {
            self.smtp.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid SMTP_PORT value: {port}"))?;
        }
        if let Some(user) = get("SMTP_USER") {
            self.smtp.username = user;
        }
        if let Some(pass) = get("SMTP_PASS") {
            self.smtp.password = pass;
        }
        if let Some(from) = get("SMTP_FROM") {
            self.smtp.from_address = from;
        }
        if let Some(name) = get("CLOUDINARY_CLOUD_NAME") {
            self.storage.cloud_name = name;
        }
        if let Some(key) = get("CLOUDINARY_API_KEY") {
            self.storage.api_key = key;
        }
        if let Some(secret) = get("CLOUDINARY_API_SECRET") {
            self.storage.api_secret = secret;
        }

        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("marketbook").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".marketbook").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    /// Sender address, falling back to the SMTP login.
    #[must_use]
    pub fn sender_address(&self) -> &str {
        if self.smtp.from_address.is_empty() {
            &self.smtp.username
        } else {
            &self.smtp.from_address
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.invoice.backend == RenderBackend::Remote
            && self.invoice.pdfshift_api_key.trim().is_empty()
        {
            anyhow::bail!("PDFSHIFT_API_KEY must be set when the remote render backend is used");
        }

        if self.invoice.backend == RenderBackend::Local && self.invoice.chromium_path.is_empty() {
            anyhow::bail!("Chromium path cannot be empty when the local render backend is used");
        }

        if self.invoice.due_days < 0 {
            anyhow::bail!("Invoice due_days must be >= 0");
        }

        if self.security.session_ttl_hours <= 0 || self.security.admin_grant_ttl_hours <= 0 {
            anyhow::bail!("Token lifetimes must be > 0 hours");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("min_db_connections cannot exceed max_db_connections");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.invoice.currency_symbol, "₦");
        assert_eq!(config.invoice.due_days, 30);
        assert_eq!(config.invoice.backend, RenderBackend::Remote);
        assert_eq!(config.security.session_ttl_hours, 168);
        assert_eq!(config.security.admin_grant_ttl_hours, 24);
        assert_eq!(config.server.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[invoice]"));
        assert!(toml_str.contains("[smtp]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [invoice]
            backend = "local"
            due_days = 14
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.invoice.backend, RenderBackend::Local);
        assert_eq!(config.invoice.due_days, 14);

        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8080"),
            ("SMTP_USER", "billing@example.com"),
            ("PDFSHIFT_API_KEY", "sk_test"),
            ("CLOUDINARY_CLOUD_NAME", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.smtp.username, "billing@example.com");
        assert_eq!(config.sender_address(), "billing@example.com");
        assert_eq!(config.invoice.pdfshift_api_key, "sk_test");
        assert!(config.storage.cloud_name.is_empty());
    }

    #[test]
    fn test_invalid_port_override_fails() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|k| (k == "PORT").then(|| "abc".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_render_key() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.invoice.pdfshift_api_key = "key".to_string();
        assert!(config.validate().is_ok());

        config.invoice.pdfshift_api_key.clear();
        config.invoice.backend = RenderBackend::Local;
        assert!(config.validate().is_ok());
    }
}
