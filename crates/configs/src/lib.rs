use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

/// Where and what to read from the spreadsheet.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    #[serde(default = "default_spreadsheet_id")]
    pub spreadsheet_id: String,
    /// Sheet names, one per price category, in display order.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Name of the env var holding the service-account JSON.
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: default_spreadsheet_id(),
            categories: default_categories(),
            credentials_env: default_credentials_env(),
            api_base: default_api_base(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_ms: default_ttl_ms() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_snapshot_path")]
    pub path: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { enabled: true, path: default_snapshot_path() }
    }
}

/// Print page geometry in CSS pixels at 96 DPI.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_page_height")]
    pub page_height: u32,
    #[serde(default = "default_margin")]
    pub margin: u32,
    #[serde(default = "default_header_height")]
    pub header_height: u32,
    #[serde(default = "default_footer_height")]
    pub footer_height: u32,
    #[serde(default = "default_row_height")]
    pub row_height: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_height: default_page_height(),
            margin: default_margin(),
            header_height: default_header_height(),
            footer_height: default_footer_height(),
            row_height: default_row_height(),
        }
    }
}

/// Business details and assets shown on the printed pages.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Short name used in the document title.
    #[serde(default = "default_brand")]
    pub brand: String,
    #[serde(default = "default_business_name")]
    pub business_name: String,
    #[serde(default = "default_phones")]
    pub phones: Vec<String>,
    #[serde(default = "default_footer_note")]
    pub footer_note: String,
    #[serde(default = "default_logo_url")]
    pub logo_url: String,
    #[serde(default = "default_currency_suffix")]
    pub currency_suffix: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            brand: default_brand(),
            business_name: default_business_name(),
            phones: default_phones(),
            footer_note: default_footer_note(),
            logo_url: default_logo_url(),
            currency_suffix: default_currency_suffix(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_true() -> bool { true }
fn default_log_format() -> String { "compact".into() }
fn default_spreadsheet_id() -> String { "14StsbfQBd_b1Hk75bbRpzpfJ6lvvWdVkUz3_tO3xuYE".into() }
fn default_categories() -> Vec<String> {
    ["Маникюр", "Педикюр", "Услуги бровиста", "Подология"].iter().map(|s| s.to_string()).collect()
}
fn default_credentials_env() -> String { "GOOGLE_SHEETS_CREDENTIALS".into() }
fn default_api_base() -> String { "https://sheets.googleapis.com".into() }
fn default_connect_timeout() -> u64 { 10 }
fn default_ttl_ms() -> u64 { 1000 }
fn default_snapshot_path() -> String { "prices_json/prices.json".into() }
fn default_page_height() -> u32 { 1122 }
fn default_margin() -> u32 { 76 }
fn default_header_height() -> u32 { 150 }
fn default_footer_height() -> u32 { 80 }
fn default_row_height() -> u32 { 28 }
fn default_brand() -> String { "Манхэттен beauty bar".into() }
fn default_business_name() -> String { "Студия маникюра «Манхэттен beauty bar»".into() }
fn default_phones() -> Vec<String> { vec!["8 (985) 411-43-54".into(), "8 (926) 394-80-50".into()] }
fn default_footer_note() -> String {
    "Работа во внеурочные часы с 8.30-10.30 и с 20.30-22.30 оплачивается +50% к основному прайсу, по предварительной договорённости.".into()
}
fn default_logo_url() -> String { "/static/logo.png".into() }
fn default_currency_suffix() -> String { " р.".into() }
fn default_static_dir() -> String { "public".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` if present, otherwise defaults overlaid with env
    /// vars; then normalize and validate. A file that exists but does not
    /// parse is an error.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => Self::from_env(),
            Err(e) => return Err(e.context("failed to load config file")),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Defaults with the env var overrides used when no config file exists.
    pub fn from_env() -> Self {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            cfg.server.worker_threads = Some(w);
        }
        if let Some(ttl) = std::env::var("PRICES_CACHE_TTL_MS").ok().and_then(|v| v.parse::<u64>().ok()) {
            cfg.cache.ttl_ms = ttl;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.sheets.normalize_and_validate()?;
        if self.cache.ttl_ms == 0 {
            return Err(anyhow!("cache.ttl_ms must be > 0"));
        }
        self.layout.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl SheetsConfig {
    fn normalize_and_validate(&mut self) -> Result<()> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(anyhow!("sheets.spreadsheet_id is empty"));
        }
        self.categories = self.categories.iter().map(|c| c.trim().to_string()).collect();
        if self.categories.is_empty() {
            return Err(anyhow!("sheets.categories must list at least one sheet"));
        }
        if self.categories.iter().any(|c| c.is_empty()) {
            return Err(anyhow!("sheets.categories must not contain blank names"));
        }
        self.api_base = self.api_base.trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl LayoutConfig {
    fn validate(&self) -> Result<()> {
        if self.row_height == 0 {
            return Err(anyhow!("layout.row_height must be > 0"));
        }
        if self.page_height == 0 {
            return Err(anyhow!("layout.page_height must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let mut cfg = parse("").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.sheets.categories.len(), 4);
        assert_eq!(cfg.sheets.categories[0], "Маникюр");
        assert_eq!(cfg.cache.ttl(), Duration::from_secs(1));
        assert_eq!(cfg.layout.row_height, 28);
        assert!(cfg.snapshot.enabled);
    }

    #[test]
    fn sections_override_defaults() {
        let toml = r#"
            [server]
            host = ""
            port = 9000

            [sheets]
            categories = [" A ", "B"]
            api_base = "http://localhost:1234/"

            [cache]
            ttl_ms = 300000

            [snapshot]
            enabled = false
        "#;
        let mut cfg = parse(toml).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.sheets.categories, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(cfg.sheets.api_base, "http://localhost:1234");
        assert_eq!(cfg.cache.ttl_ms, 300_000);
        assert!(!cfg.snapshot.enabled);
    }

    #[test]
    fn rejects_empty_category_list() {
        let mut cfg = parse("[sheets]\ncategories = []\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_blank_category() {
        let mut cfg = parse("[sheets]\ncategories = [\"A\", \"  \"]\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_zero_ttl_and_row_height() {
        let mut cfg = parse("[cache]\nttl_ms = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
        let mut cfg = parse("[layout]\nrow_height = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn partial_server_section_keeps_other_defaults() {
        let cfg = parse("[server]\nport = 9000\n").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9000);
    }

    // only test touching CONFIG_PATH
    #[test]
    fn config_path_file_is_loaded_or_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9000\n[cache]\nttl_ms = 300000\n").unwrap();
        std::env::set_var("CONFIG_PATH", &path);
        let cfg = AppConfig::load_and_validate().unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.cache.ttl_ms, 300_000);

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[server\nport = \"x\"\n").unwrap();
        std::env::set_var("CONFIG_PATH", &broken);
        assert!(AppConfig::load_and_validate().is_err());

        std::env::set_var("CONFIG_PATH", dir.path().join("missing.toml"));
        let cfg = AppConfig::load_and_validate().unwrap();
        assert_eq!(cfg.sheets.categories.len(), 4);

        std::env::remove_var("CONFIG_PATH");
    }

    #[test]
    fn rejects_port_zero() {
        let mut cfg = parse("[server]\nhost = \"0.0.0.0\"\nport = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }
}
