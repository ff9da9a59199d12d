//! Configuration system for Orderport.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment.
//! Configuration is loaded from `~/.config/orderport/config.toml` and/or
//! `orderport.toml` in the workspace directory. The Shopify credentials are
//! additionally read from `SHOPIFY_STORE_HANDLE` and `SHOPIFY_ACCESS_TOKEN`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Name of the workspace-level configuration file.
pub const WORKSPACE_CONFIG_FILE: &str = "orderport.toml";

/// Environment variables holding the store credentials.
pub const STORE_HANDLE_ENV: &str = "SHOPIFY_STORE_HANDLE";
pub const ACCESS_TOKEN_ENV: &str = "SHOPIFY_ACCESS_TOKEN";

/// Top-level configuration for an import run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub shopify: ShopifyConfig,
    pub sources: SourcesConfig,
    pub orders: OrderDefaults,
    pub upload: UploadConfig,
}

/// Connection settings for the Shopify Admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopifyConfig {
    /// Store handle, the `{handle}` in `{handle}.myshopify.com`.
    pub store_handle: String,
    /// Admin API access token sent as `X-Shopify-Access-Token`.
    pub access_token: String,
    /// Admin API version segment of the endpoint path.
    pub api_version: String,
    /// Origin override for the Admin API (e.g. a local test server).
    /// Defaults to `https://{store_handle}.myshopify.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            store_handle: String::new(),
            access_token: String::new(),
            api_version: "2023-07".to_string(),
            base_url: None,
        }
    }
}

impl ShopifyConfig {
    /// The order-creation endpoint, `{base}/admin/api/{version}/orders.json`.
    pub fn orders_endpoint(&self) -> Result<Url, ConfigError> {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => format!("https://{}.myshopify.com", self.store_handle),
        };
        let base = Url::parse(&base).map_err(|e| ConfigError::InvalidValue {
            field: "shopify.base_url".into(),
            message: format!("'{base}': {e}"),
        })?;
        base.join(&format!("admin/api/{}/orders.json", self.api_version))
            .map_err(|e| ConfigError::InvalidValue {
                field: "shopify.api_version".into(),
                message: e.to_string(),
            })
    }
}

/// Where raw records are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub csv_enabled: bool,
    pub csv_path: PathBuf,
    pub api_enabled: bool,
    pub api_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            csv_enabled: true,
            csv_path: PathBuf::from("./orders.csv"),
            api_enabled: true,
            api_url: "https://example.com/api/orders".to_string(),
        }
    }
}

/// Values stamped onto every imported order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderDefaults {
    /// Tag marking the order as imported.
    pub tag: String,
    /// Prefix prepended to the record's note attributes.
    pub note_prefix: String,
    /// Placeholder unit price for every line item.
    pub line_item_price: f64,
    /// Placeholder price for the shipping line.
    pub shipping_price: f64,
}

impl Default for OrderDefaults {
    fn default() -> Self {
        Self {
            tag: "IMPORTED".to_string(),
            note_prefix: "IMPORTED ORDER".to_string(),
            line_item_price: 0.0,
            shipping_price: 0.0,
        }
    }
}

/// Upload pacing and data-quality policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Fixed delay after every upload attempt, in milliseconds.
    pub pacing_interval_ms: u64,
    /// Skip orders with unparsable line item quantities instead of sending
    /// them with a null quantity.
    pub reject_invalid_quantity: bool,
    /// Per-request timeout. Unset means requests may wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            pacing_interval_ms: 1000,
            reject_invalid_quantity: false,
            request_timeout_secs: None,
        }
    }
}

impl ImportConfig {
    /// Check everything needed before the first network request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shopify.store_handle.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("shopify.store_handle ({STORE_HANDLE_ENV})"),
            });
        }
        if !self
            .shopify
            .store_handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigError::InvalidValue {
                field: "shopify.store_handle".into(),
                message: format!(
                    "'{}' may only contain letters, digits, and '-'",
                    self.shopify.store_handle
                ),
            });
        }
        if self.shopify.access_token.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("shopify.access_token ({ACCESS_TOKEN_ENV})"),
            });
        }
        self.shopify.orders_endpoint()?;

        if self.sources.api_enabled {
            Url::parse(&self.sources.api_url).map_err(|e| ConfigError::InvalidValue {
                field: "sources.api_url".into(),
                message: format!("'{}': {e}", self.sources.api_url),
            })?;
        }
        Ok(())
    }

    /// A copy safe to print: the access token is masked.
    pub fn redacted(&self) -> ImportConfig {
        let mut config = self.clone();
        if !config.shopify.access_token.is_empty() {
            config.shopify.access_token = "********".to_string();
        }
        config
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. `SHOPIFY_STORE_HANDLE` / `SHOPIFY_ACCESS_TOKEN`
/// 2. Environment variables prefixed with `ORDERPORT_`
/// 3. The explicit config file, or `orderport.toml` in the workspace
/// 4. User config (`~/.config/orderport/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
) -> Result<ImportConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(ImportConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "orderport", "orderport") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Explicit file wins over the workspace file
    if let Some(file) = config_file {
        figment = figment.merge(Toml::file(file));
    } else if let Some(ws) = workspace {
        let ws_config = ws.join(WORKSPACE_CONFIG_FILE);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // ORDERPORT_UPLOAD__PACING_INTERVAL_MS, ORDERPORT_SOURCES__CSV_PATH, etc.
    figment = figment.merge(Env::prefixed("ORDERPORT_").split("__"));

    // SHOPIFY_STORE_HANDLE -> shopify.store_handle
    figment = figment.merge(
        Env::raw()
            .only(&[STORE_HANDLE_ENV, ACCESS_TOKEN_ENV])
            .map(|key| {
                key.as_str()
                    .to_ascii_lowercase()
                    .replacen("shopify_", "shopify.", 1)
                    .into()
            }),
    );

    figment.extract().map_err(Box::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ImportConfig {
        let mut config = ImportConfig::default();
        config.shopify.store_handle = "acme-store".into();
        config.shopify.access_token = "shpat_test".into();
        config
    }

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert_eq!(config.shopify.api_version, "2023-07");
        assert_eq!(config.sources.csv_path, PathBuf::from("./orders.csv"));
        assert_eq!(config.sources.api_url, "https://example.com/api/orders");
        assert_eq!(config.orders.tag, "IMPORTED");
        assert_eq!(config.orders.note_prefix, "IMPORTED ORDER");
        assert_eq!(config.orders.line_item_price, 0.0);
        assert_eq!(config.upload.pacing_interval_ms, 1000);
        assert!(!config.upload.reject_invalid_quantity);
        assert!(config.upload.request_timeout_secs.is_none());
    }

    #[test]
    fn test_orders_endpoint_from_handle() {
        let config = valid_config();
        assert_eq!(
            config.shopify.orders_endpoint().unwrap().as_str(),
            "https://acme-store.myshopify.com/admin/api/2023-07/orders.json"
        );
    }

    #[test]
    fn test_orders_endpoint_with_base_url() {
        let mut config = valid_config();
        config.shopify.base_url = Some("http://127.0.0.1:8080".into());
        config.shopify.api_version = "2024-01".into();
        assert_eq!(
            config.shopify.orders_endpoint().unwrap().as_str(),
            "http://127.0.0.1:8080/admin/api/2024-01/orders.json"
        );
    }

    #[test]
    fn test_validate_missing_store_handle() {
        let mut config = valid_config();
        config.shopify.store_handle.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field.contains("store_handle")));
    }

    #[test]
    fn test_validate_missing_access_token() {
        let mut config = valid_config();
        config.shopify.access_token = "   ".into();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field.contains("access_token")));
    }

    #[test]
    fn test_validate_rejects_bad_handle() {
        let mut config = valid_config();
        config.shopify.store_handle = "acme/../evil".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_api_url() {
        let mut config = valid_config();
        config.sources.api_url = "not a url".into();
        assert!(config.validate().is_err());

        config.sources.api_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_redacted_masks_token() {
        let config = valid_config();
        let redacted = config.redacted();
        assert_eq!(redacted.shopify.access_token, "********");
        assert_eq!(redacted.shopify.store_handle, "acme-store");
        assert_eq!(config.shopify.access_token, "shpat_test");
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(WORKSPACE_CONFIG_FILE),
            r#"
[shopify]
store_handle = "from-file"
access_token = "file-token"

[sources]
csv_path = "data/export.csv"
api_enabled = false

[orders]
tag = "LEGACY"

[upload]
pacing_interval_ms = 250
reject_invalid_quantity = true
"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.sources.csv_path, PathBuf::from("data/export.csv"));
        assert!(!config.sources.api_enabled);
        assert_eq!(config.orders.tag, "LEGACY");
        // Unset fields keep their defaults
        assert_eq!(config.orders.note_prefix, "IMPORTED ORDER");
        assert_eq!(config.upload.pacing_interval_ms, 250);
        assert!(config.upload.reject_invalid_quantity);
        assert_eq!(config.shopify.api_version, "2023-07");
    }

    #[test]
    fn test_explicit_config_file_overrides_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(WORKSPACE_CONFIG_FILE),
            "[orders]\ntag = \"WORKSPACE\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "[orders]\ntag = \"EXPLICIT\"\n").unwrap();

        let config = load_config(Some(dir.path()), Some(&explicit)).unwrap();
        assert_eq!(config.orders.tag, "EXPLICIT");
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = valid_config();
        let json = serde_json::to_string(&config).unwrap();
        let back: ImportConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.shopify.store_handle, "acme-store");
        assert_eq!(back.orders, config.orders);
        assert!(back.shopify.base_url.is_none());
    }
}
