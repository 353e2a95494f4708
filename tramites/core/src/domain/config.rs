// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Portal Configuration Types
//
// Defines the configuration schema for a request portal deployment:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Identity provider registration and scopes
// - SharePoint list, drive storage and mail settings
// - Submission rules (domain restriction, amount limit)
// - Network and observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::catalog::RequestType;
use super::document::Letterhead;
use super::identity::AccessPolicy;
use super::validation::ValidationRules;

pub const API_VERSION: &str = "tramites/v1";
pub const KIND: &str = "PortalConfig";

/// Top-level Kubernetes-style portal configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfigManifest {
    /// API version (must be "tramites/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "PortalConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: PortalConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Deployment name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Portal configuration specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PortalConfigSpec {
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub sharepoint: SharePointConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub options: PortalOptions,

    /// Accounts with the administrator role (case-insensitive)
    #[serde(default)]
    pub admins: Vec<String>,

    #[serde(default)]
    pub institution: InstitutionConfig,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    pub client_id: String,

    /// Client secret for application mode (supports "env:VAR_NAME" syntax).
    /// When absent the portal runs in delegated mode with browser-supplied tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    #[serde(default = "default_authority_host")]
    pub authority_host: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: None,
            scopes: default_scopes(),
            authority_host: default_authority_host(),
        }
    }
}

impl IdentityConfig {
    /// Resolve the client secret (supports "env:VAR_NAME" syntax)
    pub fn resolve_client_secret(&self) -> anyhow::Result<Option<String>> {
        match &self.client_secret {
            Some(secret) => resolve_secret(secret).map(Some),
            None => Ok(None),
        }
    }

    /// OAuth2 token endpoint for the tenant
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePointConfig {
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Skips site lookup when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,

    #[serde(default = "default_list_name")]
    pub list_name: String,
}

impl Default for SharePointConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            site_id: None,
            list_name: default_list_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Per-type folder overrides keyed by request type key
    #[serde(default)]
    pub folders: HashMap<String, String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            folders: HashMap::new(),
        }
    }
}

impl StorageConfig {
    pub fn folder_for(&self, request_type: RequestType) -> String {
        self.folders
            .get(request_type.key())
            .cloned()
            .unwrap_or_else(|| request_type.default_folder().to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Reviewing-body address notified of every submission
    #[serde(default = "default_reviewer_address")]
    pub reviewer_address: String,

    #[serde(default = "default_true")]
    pub send_confirmation: bool,

    /// Mailbox used as principal in application mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_mailbox: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            reviewer_address: default_reviewer_address(),
            send_confirmation: true,
            sender_mailbox: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AutomationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl AutomationConfig {
    /// Webhook URL when automation is enabled and configured
    pub fn active_url(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.webhook_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalOptions {
    #[serde(default = "default_true")]
    pub restrict_domain: bool,

    #[serde(default = "default_allowed_domain")]
    pub allowed_domain: String,

    /// Upper bound for requested amounts in MXN; 0 disables the check
    #[serde(default = "default_max_amount")]
    pub max_amount: f64,

    /// IANA time zone for calendar events
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for PortalOptions {
    fn default() -> Self {
        Self {
            restrict_domain: true,
            allowed_domain: default_allowed_domain(),
            max_amount: default_max_amount(),
            time_zone: default_time_zone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionConfig {
    #[serde(default = "default_institution_name")]
    pub name: String,

    /// Short name used in subjects, CSV file names and calendar categories
    #[serde(default = "default_short_name")]
    pub short_name: String,

    #[serde(default = "default_university")]
    pub university: String,

    #[serde(default = "default_city")]
    pub city: String,

    #[serde(default = "default_reviewing_body")]
    pub reviewing_body: String,
}

impl Default for InstitutionConfig {
    fn default() -> Self {
        Self {
            name: default_institution_name(),
            short_name: default_short_name(),
            university: default_university(),
            city: default_city(),
            reviewing_body: default_reviewing_body(),
        }
    }
}

impl InstitutionConfig {
    pub fn letterhead(&self) -> Letterhead {
        Letterhead {
            institution: self.name.clone(),
            university: self.university.clone(),
            city: self.city.clone(),
            addressee: self.reviewing_body.clone(),
        }
    }

    /// Default event location
    pub fn location(&self) -> String {
        format!("{} - {}, {}", self.short_name, self.university, self.city)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_graph_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Portal sessions unused for this long are dropped
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            session_idle_minutes: default_session_idle_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus listener port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_scopes() -> Vec<String> {
    ["User.Read", "Sites.ReadWrite.All", "Calendars.ReadWrite", "Mail.Send"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_site_url() -> String {
    "https://uvmx.sharepoint.com/sites/CtTramites2026".to_string()
}

fn default_list_name() -> String {
    "SolicitudesCITRO".to_string()
}

fn default_base_path() -> String {
    "PDFs_Solicitudes".to_string()
}

fn default_reviewer_address() -> String {
    "consejo.tecnico@uv.mx".to_string()
}

fn default_allowed_domain() -> String {
    "uv.mx".to_string()
}

fn default_max_amount() -> f64 {
    100_000.0
}

fn default_time_zone() -> String {
    "America/Mexico_City".to_string()
}

fn default_institution_name() -> String {
    "Centro de Investigaciones Tropicales (CITRO)".to_string()
}

fn default_short_name() -> String {
    "CITRO".to_string()
}

fn default_university() -> String {
    "Universidad Veracruzana".to_string()
}

fn default_city() -> String {
    "Xalapa, Ver.".to_string()
}

fn default_reviewing_body() -> String {
    "H. Consejo Técnico".to_string()
}

fn default_graph_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_idle_minutes() -> u64 {
    480
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9091
}

/// Resolve a secret value (supports "env:VAR_NAME" syntax)
pub fn resolve_secret(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name)
            .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name)),
        None => Ok(value.to_string()),
    }
}

impl Default for PortalConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "tramites-portal".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: PortalConfigSpec::default(),
        }
    }
}

impl PortalConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. TRAMITES_CONFIG_PATH environment variable
    /// 2. ./tramites-config.yaml (working directory)
    /// 3. ~/.tramites/config.yaml (user home)
    /// 4. /etc/tramites/config.yaml (system, Unix) or C:\ProgramData\Tramites\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("TRAMITES_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./tramites-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".tramites").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/tramites/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Tramites\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TRAMITES_RESTRICT_DOMAIN") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => {
                    tracing::info!("Environment override: TRAMITES_RESTRICT_DOMAIN=true");
                    self.spec.options.restrict_domain = true;
                }
                "false" | "0" | "no" | "off" => {
                    tracing::info!("Environment override: TRAMITES_RESTRICT_DOMAIN=false");
                    self.spec.options.restrict_domain = false;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for TRAMITES_RESTRICT_DOMAIN: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("TRAMITES_ADMIN_EMAIL") {
            let email = val.trim().to_string();
            if !email.is_empty()
                && !self.spec.admins.iter().any(|a| a.eq_ignore_ascii_case(&email))
            {
                tracing::info!("Environment override: TRAMITES_ADMIN_EMAIL={}", email);
                self.spec.admins.push(email);
            }
        }

        if let Ok(val) = std::env::var("TRAMITES_WEBHOOK_URL") {
            if !val.trim().is_empty() {
                tracing::info!("Environment override: TRAMITES_WEBHOOK_URL set, automation enabled");
                self.spec.automation.enabled = true;
                self.spec.automation.webhook_url = Some(val.trim().to_string());
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.trim().is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let spec = &self.spec;

        for (field, value) in [
            ("spec.sharepoint.site_url", &spec.sharepoint.site_url),
            ("spec.graph.base_url", &spec.graph.base_url),
            ("spec.identity.authority_host", &spec.identity.authority_host),
        ] {
            check_url(field, value)?;
        }

        if spec.sharepoint.list_name.trim().is_empty() {
            anyhow::bail!("spec.sharepoint.list_name cannot be empty");
        }

        if !looks_like_email(&spec.email.reviewer_address) {
            anyhow::bail!(
                "spec.email.reviewer_address is not a valid email: '{}'",
                spec.email.reviewer_address
            );
        }

        for admin in &spec.admins {
            if !looks_like_email(admin) {
                anyhow::bail!("Invalid admin email: '{}'", admin);
            }
        }

        if spec.automation.enabled {
            match spec.automation.webhook_url.as_deref() {
                Some(url) if !url.trim().is_empty() => check_url("spec.automation.webhook_url", url)?,
                _ => anyhow::bail!("spec.automation.webhook_url is required when automation is enabled"),
            }
        }

        if spec.options.restrict_domain && spec.options.allowed_domain.trim().is_empty() {
            anyhow::bail!("spec.options.allowed_domain cannot be empty when restrict_domain is on");
        }

        if spec.options.max_amount.is_nan() || spec.options.max_amount < 0.0 {
            anyhow::bail!("spec.options.max_amount must be >= 0");
        }

        if spec.identity.client_secret.is_some()
            && (spec.identity.tenant_id.is_empty() || spec.identity.client_id.is_empty())
        {
            anyhow::bail!("spec.identity.tenant_id and client_id are required with a client_secret");
        }

        if spec.graph.timeout_secs == 0 {
            anyhow::bail!("spec.graph.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            restrict_domain: self.spec.options.restrict_domain,
            allowed_domain: self.spec.options.allowed_domain.clone(),
            admins: self.spec.admins.clone(),
        }
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            access: self.access_policy(),
            max_amount: self.spec.options.max_amount,
        }
    }
}

fn check_url(field: &str, value: &str) -> anyhow::Result<()> {
    match url::Url::parse(value) {
        Ok(u) if u.scheme() == "https" || u.scheme() == "http" => Ok(()),
        Ok(u) => anyhow::bail!("{} must use http(s), got scheme '{}'", field, u.scheme()),
        Err(e) => anyhow::bail!("{} is not a valid URL ('{}'): {}", field, value, e),
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let config = PortalConfigManifest::default();
        assert_eq!(config.api_version, "tramites/v1");
        assert_eq!(config.kind, "PortalConfig");
        assert!(config.validate().is_ok());
        assert!(config.spec.options.restrict_domain);
        assert_eq!(config.spec.network.session_idle_minutes, 480);
    }

    #[test]
    fn test_yaml_minimal() {
        let yaml = r#"
apiVersion: tramites/v1
kind: PortalConfig
metadata:
  name: citro
spec:
  sharepoint:
    site_url: https://contoso.sharepoint.com/sites/Tramites
    list_name: Solicitudes
  storage:
    folders:
      apoyo_academico: Academico
  admins:
    - jefe@uv.mx
"#;
        let config = PortalConfigManifest::from_yaml_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.spec.sharepoint.list_name, "Solicitudes");
        assert_eq!(
            config.spec.storage.folder_for(RequestType::AcademicSupport),
            "Academico"
        );
        assert_eq!(
            config.spec.storage.folder_for(RequestType::FreeForm),
            "05_Solicitud_Libre"
        );
        assert_eq!(config.spec.graph.timeout_secs, 30);
    }

    #[test]
    fn test_validation() {
        let mut config = PortalConfigManifest::default();
        config.api_version = "v0".into();
        assert!(config.validate().is_err());

        let mut config = PortalConfigManifest::default();
        config.spec.admins.push("not-an-email".into());
        assert!(config.validate().is_err());

        let mut config = PortalConfigManifest::default();
        config.spec.automation.enabled = true;
        assert!(config.validate().is_err());
        config.spec.automation.webhook_url = Some("https://flow.example.com/hook".into());
        assert!(config.validate().is_ok());

        let mut config = PortalConfigManifest::default();
        config.spec.options.max_amount = -1.0;
        assert!(config.validate().is_err());

        let mut config = PortalConfigManifest::default();
        config.spec.sharepoint.site_url = "ftp://x".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_automation_active_url() {
        let mut automation = AutomationConfig {
            enabled: false,
            webhook_url: Some("https://flow.example.com".into()),
        };
        assert_eq!(automation.active_url(), None);
        automation.enabled = true;
        assert_eq!(automation.active_url(), Some("https://flow.example.com"));
    }

    #[test]
    fn test_resolve_secret() {
        assert_eq!(resolve_secret("plain").unwrap(), "plain");
        assert!(resolve_secret("env:TRAMITES_TEST_SECRET_THAT_DOES_NOT_EXIST").is_err());
    }

    #[test]
    fn test_token_endpoint() {
        let identity = IdentityConfig {
            tenant_id: "tenant-1".into(),
            ..Default::default()
        };
        assert_eq!(
            identity.token_endpoint(),
            "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = PortalConfigManifest::default();
        config.spec.admins.push("admin@uv.mx".into());
        config.to_yaml_file(&path).unwrap();

        let loaded = PortalConfigManifest::load_or_default(Some(path)).unwrap();
        assert!(loaded.spec.admins.iter().any(|a| a == "admin@uv.mx"));
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(PortalConfigManifest::load_or_default(Some(missing)).is_err());
    }
}
