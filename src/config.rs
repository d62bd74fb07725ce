use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The "AAD Guest RBAC Review" group emptied on every run.
pub const DEFAULT_GROUP_ID: &str = "c6f8666e-053a-4f09-a15c-6feee253af06";

/// Subscriptions that never go on the queue.
pub const DEFAULT_EXCLUDED_SUBSCRIPTIONS: [&str; 3] =
    ["Access to Azure Active Directory", "BITM", "Free Trial"];

/// Non-secret job settings, optionally read from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub group_id: String,
    pub excluded_subscriptions: Vec<String>,
    pub report_container: String,
    pub report_blob: String,
    pub subscriptions_api_version: String,
    pub endpoints: Endpoints,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            group_id: DEFAULT_GROUP_ID.to_string(),
            excluded_subscriptions: DEFAULT_EXCLUDED_SUBSCRIPTIONS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            report_container: "rbacreport".to_string(),
            report_blob: "rbac_report.csv".to_string(),
            subscriptions_api_version: "2020-01-01".to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

/// Base URLs of the identity, Graph and management services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub authority: String,
    pub graph: String,
    pub management: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authority: "https://login.microsoftonline.com".to_string(),
            graph: "https://graph.microsoft.com/v1.0".to_string(),
            management: "https://management.azure.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Strip trailing slashes so paths can be appended with `format!`.
    pub fn normalized(&self) -> Self {
        Self {
            authority: self.authority.trim_end_matches('/').to_string(),
            graph: self.graph.trim_end_matches('/').to_string(),
            management: self.management.trim_end_matches('/').to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    return Ok(Settings::default());
                }
                Self::from_file(&default_path)
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(settings)
    }

    fn config_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().context("Could not find config directory")?;
        path.push("azurerbac");
        path.push("config.toml");
        Ok(path)
    }
}

/// Secrets and connection strings, supplied through the environment.
#[derive(Clone)]
pub struct Credentials {
    pub tenant_id: String,
    pub management: crate::auth::ClientCredentials,
    pub graph: crate::auth::ClientCredentials,
    pub service_bus_connection_string: String,
    pub service_bus_queue: String,
    pub storage_connection_string: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("management", &self.management)
            .field("graph", &self.graph)
            .field("service_bus_connection_string", &"<redacted>")
            .field("service_bus_queue", &self.service_bus_queue)
            .field("storage_connection_string", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_job_constants() {
        let settings = Settings::default();
        assert_eq!(settings.group_id, DEFAULT_GROUP_ID);
        assert_eq!(settings.report_container, "rbacreport");
        assert_eq!(settings.report_blob, "rbac_report.csv");
        assert_eq!(settings.excluded_subscriptions.len(), 3);
        assert_eq!(settings.subscriptions_api_version, "2020-01-01");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let content = r#"
            group_id = "0000"

            [endpoints]
            graph = "http://localhost:8080/v1.0/"
        "#;
        let settings: Settings = toml::from_str(content).unwrap();
        assert_eq!(settings.group_id, "0000");
        assert_eq!(settings.report_blob, "rbac_report.csv");
        assert_eq!(settings.endpoints.authority, Endpoints::default().authority);
        assert_eq!(
            settings.endpoints.normalized().graph,
            "http://localhost:8080/v1.0"
        );
    }

    #[test]
    fn test_load_explicit_file() {
        let path = std::env::temp_dir().join(format!("azurerbac-test-{}.toml", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "excluded_subscriptions = [\"Sandbox\"]").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.excluded_subscriptions, vec!["Sandbox".to_string()]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_debug_redacts_connection_strings() {
        let credentials = Credentials {
            tenant_id: "tenant".to_string(),
            management: crate::auth::ClientCredentials::new("rest-id", "rest-secret"),
            graph: crate::auth::ClientCredentials::new("graph-id", "graph-secret"),
            service_bus_connection_string: "Endpoint=sb://ns/;SharedAccessKey=sb-key".to_string(),
            service_bus_queue: "subs".to_string(),
            storage_connection_string: "AccountName=a;AccountKey=storage-key".to_string(),
        };
        let printed = format!("{credentials:?}");
        assert!(printed.contains("subs"));
        for secret in ["sb-key", "storage-key", "rest-secret", "graph-secret"] {
            assert!(!printed.contains(secret), "{secret} leaked");
        }
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let path = Path::new("/nonexistent/azurerbac/config.toml");
        assert!(Settings::load(Some(path)).is_err());
    }
}
