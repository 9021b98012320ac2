// Server configuration, read once at startup from the environment (and an
// optional `.env` file) and then passed around as an immutable value.

use crate::error::ConfigError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SIDELOAD_NAMESPACE: &str = "media-bridge";
pub const DEFAULT_UPLOADS_PATH: &str = "wp-content/uploads";

/// How the media bytes reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UploadMode {
    /// Raw body with `Content-Disposition`.
    #[default]
    Binary,
    /// `multipart/form-data` with a single `file` field.
    Multipart,
    /// The server fetches the source URL itself.
    Sideload,
}

impl FromStr for UploadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" | "header" => Ok(UploadMode::Binary),
            "multipart" | "form" => Ok(UploadMode::Multipart),
            "sideload" => Ok(UploadMode::Sideload),
            other => Err(format!("unknown upload mode {other:?}")),
        }
    }
}

/// Username plus Application Password.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub secret: String,
}

impl BasicCredentials {
    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.secret));
        format!("Basic {}", token)
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct ServerConfig {
    base_url: String,
    basic: Option<BasicCredentials>,
    api_key: Option<String>,
    mode: UploadMode,
    sideload_namespace: String,
    uploads_path: String,
    timeout: Option<Duration>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("base_url", &self.base_url)
            .field("basic", &self.basic)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("mode", &self.mode)
            .field("sideload_namespace", &self.sideload_namespace)
            .field("uploads_path", &self.uploads_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ServerConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as missing.
    /// Which credentials are required depends on the declared upload mode.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = match get("WP_UPLOAD_MODE") {
            Some(raw) => raw.parse::<UploadMode>().map_err(|reason| ConfigError::Invalid {
                var: "WP_UPLOAD_MODE",
                reason,
            })?,
            None => UploadMode::default(),
        };

        let base_url = get("WP_URL").ok_or(ConfigError::Missing("WP_URL"))?;
        let parsed = url::Url::parse(&base_url).map_err(|e| ConfigError::Invalid {
            var: "WP_URL",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                var: "WP_URL",
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let basic = match (get("WP_USER"), get("WP_APP_PASSWORD")) {
            (Some(username), Some(secret)) => Some(BasicCredentials { username, secret }),
            (None, _) if mode != UploadMode::Sideload => {
                return Err(ConfigError::Missing("WP_USER"))
            }
            (_, None) if mode != UploadMode::Sideload => {
                return Err(ConfigError::Missing("WP_APP_PASSWORD"))
            }
            _ => None,
        };

        let api_key = get("WP_API_KEY");
        if mode == UploadMode::Sideload && api_key.is_none() {
            return Err(ConfigError::Missing("WP_API_KEY"));
        }

        let timeout = match get("WP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "WP_TIMEOUT_SECS",
                    reason: format!("expected whole seconds, got {raw:?}"),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(ServerConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            basic,
            api_key,
            mode,
            sideload_namespace: get("WP_SIDELOAD_NAMESPACE")
                .map(|ns| ns.trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SIDELOAD_NAMESPACE.into()),
            uploads_path: get("WP_UPLOADS_PATH")
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_UPLOADS_PATH.into()),
            timeout,
        })
    }

    /// Config with Basic credentials and defaults for everything else.
    pub fn new(base_url: &str, username: &str, secret: &str) -> Self {
        ServerConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            basic: Some(BasicCredentials {
                username: username.to_string(),
                secret: secret.to_string(),
            }),
            api_key: None,
            mode: UploadMode::default(),
            sideload_namespace: DEFAULT_SIDELOAD_NAMESPACE.into(),
            uploads_path: DEFAULT_UPLOADS_PATH.into(),
            timeout: None,
        }
    }

    pub fn with_mode(mut self, mode: UploadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn with_sideload_namespace(mut self, ns: &str) -> Self {
        self.sideload_namespace = ns.trim_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn basic(&self) -> Option<&BasicCredentials> {
        self.basic.as_ref()
    }

    /// Basic credentials, or a config error naming the missing variable.
    pub fn require_basic(&self) -> Result<&BasicCredentials, ConfigError> {
        self.basic.as_ref().ok_or(ConfigError::Missing("WP_USER"))
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn mode(&self) -> UploadMode {
        self.mode
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn media_endpoint(&self) -> String {
        format!("{}/wp-json/wp/v2/media", self.base_url)
    }

    pub fn users_me_endpoint(&self) -> String {
        format!("{}/wp-json/wp/v2/users/me", self.base_url)
    }

    pub fn sideload_endpoint(&self) -> String {
        format!("{}/wp-json/{}/v1/sideload", self.base_url, self.sideload_namespace)
    }

    pub fn xmlrpc_endpoint(&self) -> String {
        format!("{}/xmlrpc.php", self.base_url)
    }

    /// Public URL of a file stored under the uploads directory.
    pub fn public_upload_url(&self, relative: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.uploads_path,
            relative.trim_start_matches('/')
        )
    }
}
