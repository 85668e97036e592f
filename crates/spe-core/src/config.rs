//! Configuration for the SharePoint Embedded bridge.
//!
//! Settings come from a `spe-mcp.toml` file overlaid with environment
//! variables. The file is located with the following resolution order:
//!
//! 1. `SPE_MCP_CONFIG_PATH` environment override
//! 2. Current directory
//! 3. Parent directories (walk up to filesystem root)
//! 4. XDG config directory (`~/.config/spe-mcp/spe-mcp.toml`)
//!
//! A missing file is not an error: every Graph setting has a default and the
//! Azure AD credentials can be supplied entirely through the environment.
//!
//! # Example
//!
//! ```toml
//! [azure_ad]
//! tenant_id = "00000000-0000-0000-0000-000000000000"
//! client_id = "11111111-1111-1111-1111-111111111111"
//! client_secret = "..."
//!
//! [graph]
//! timeout_secs = 60
//! ```

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// File name searched for during resolution.
pub const CONFIG_FILE_NAME: &str = "spe-mcp.toml";

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SPE_MCP_CONFIG_PATH";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_GRAPH_BETA_ENDPOINT: &str = "https://graph.microsoft.com/beta";
pub const DEFAULT_GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 100;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error when reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error when a config file is malformed.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file not found.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// Neither an access token nor a complete client-secret triple is set.
    #[error(
        "Azure AD application credentials are missing. Please provide ClientId, ClientSecret, \
         and TenantId in the configuration."
    )]
    MissingCredentials,

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration from `spe-mcp.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Azure AD application used to authenticate against Microsoft Graph.
    pub azure_ad: AzureAdConfig,

    /// Microsoft Graph endpoints and request settings.
    pub graph: GraphConfig,
}

/// Azure AD application registration settings.
///
/// Either `access_token` or all of `tenant_id`, `client_id` and
/// `client_secret` must be provided.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureAdConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    /// Login authority, defaults to the Azure public cloud.
    pub authority_host: Option<String>,

    /// Pre-acquired bearer token. Skips the client-credential flow.
    pub access_token: Option<String>,
}

/// Where the bearer token for Graph requests comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A fixed token supplied by the operator.
    AccessToken(String),

    /// OAuth2 client-credentials flow.
    ClientSecret {
        authority_host: String,
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"<redacted>").finish(),
            Self::ClientSecret {
                authority_host,
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("authority_host", authority_host)
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

impl fmt::Debug for AzureAdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("AzureAdConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("authority_host", &self.authority_host)
            .field("access_token", &redact(&self.access_token))
            .finish()
    }
}

impl AzureAdConfig {
    /// Validates the credential settings and decides how tokens are obtained.
    ///
    /// A non-empty `access_token` wins over client-secret settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] when neither an access
    /// token nor all three of tenant id, client id and client secret are set.
    pub fn credential_source(&self) -> Result<CredentialSource, ConfigError> {
        if let Some(token) = non_blank(self.access_token.as_ref()) {
            return Ok(CredentialSource::AccessToken(token.to_string()));
        }

        match (
            non_blank(self.tenant_id.as_ref()),
            non_blank(self.client_id.as_ref()),
            non_blank(self.client_secret.as_ref()),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                Ok(CredentialSource::ClientSecret {
                    authority_host: non_blank(self.authority_host.as_ref())
                        .unwrap_or(DEFAULT_AUTHORITY_HOST)
                        .trim_end_matches('/')
                        .to_string(),
                    tenant_id: tenant_id.to_string(),
                    client_id: client_id.to_string(),
                    client_secret: client_secret.to_string(),
                })
            }
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// Microsoft Graph settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Base URL for drive operations.
    pub endpoint: String,

    /// Base URL for container operations, which are served from the beta
    /// surface.
    pub beta_endpoint: String,

    /// OAuth2 scope requested by the client-credential flow.
    pub scope: String,

    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GRAPH_ENDPOINT.to_string(),
            beta_endpoint: DEFAULT_GRAPH_BETA_ENDPOINT.to_string(),
            scope: DEFAULT_GRAPH_SCOPE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads and parses a config file from the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid TOML for this schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|_e| ConfigError::NotFound(path.to_path_buf()))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads config using the resolution algorithm, then applies the process
    /// environment on top.
    ///
    /// Returns the default configuration when no file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if a located file cannot be read or parsed.
    pub fn resolve() -> Result<Self, ConfigError> {
        let env_override = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let current = std::env::current_dir()?;

        let located = locate_from(&current, env_override).or_else(|| {
            xdg_config_path().filter(|path| path.exists())
        });

        let mut config = match located {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Self::load(path)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads an explicit file when given, otherwise resolves. The process
    /// environment is applied in both cases.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_or_resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let mut config = Self::load(path)?;
                config.apply_env(|key| std::env::var(key).ok());
                Ok(config)
            }
            None => Self::resolve(),
        }
    }

    /// Overlays environment values on top of the file settings.
    ///
    /// Blank values are ignored so an exported-but-empty variable does not
    /// erase a value from the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("AZURE_TENANT_ID") {
            self.azure_ad.tenant_id = Some(value);
        }
        if let Some(value) = get("AZURE_CLIENT_ID") {
            self.azure_ad.client_id = Some(value);
        }
        if let Some(value) = get("AZURE_CLIENT_SECRET") {
            self.azure_ad.client_secret = Some(value);
        }
        if let Some(value) = get("AZURE_AUTHORITY_HOST") {
            self.azure_ad.authority_host = Some(value);
        }
        if let Some(value) = get("GRAPH_ACCESS_TOKEN") {
            self.azure_ad.access_token = Some(value);
        }
        if let Some(value) = get("GRAPH_ENDPOINT") {
            self.graph.endpoint = value;
        }
        if let Some(value) = get("GRAPH_BETA_ENDPOINT") {
            self.graph.beta_endpoint = value;
        }
    }
}

/// Finds a config file starting at `start`.
///
/// An existing `env_override` path wins; otherwise `start` and each of its
/// ancestors is checked for [`CONFIG_FILE_NAME`].
pub fn locate_from(start: &Path, env_override: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = env_override
        && path.exists()
    {
        return Some(path);
    }

    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

fn xdg_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("spe-mcp").join(CONFIG_FILE_NAME))
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}
