//! Endpoint and authentication configuration for the platform clients.

/// Authentication mode applied to every outbound platform request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// No authentication (local development default).
    None,
    /// HTTP basic authentication.
    Basic { username: String, password: String },
}

impl AuthMode {
    /// Apply this mode to an outbound request.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            AuthMode::None => request,
            AuthMode::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        }
    }
}

/// Base URLs of the external platform services, loaded from environment
/// variables.
///
/// All fields have local-development defaults; in production, override
/// via environment variables.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// File download service base URL.
    pub download_url: String,
    /// Ingest/upload service base URL.
    pub upload_url: String,
    /// Policy validation service base URL.
    pub policy_url: String,
    /// Notification subscription service base URL.
    pub subscription_url: String,
    /// Authentication mode for all outbound calls.
    pub auth: AuthMode,
}

impl PlatformConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                  |
    /// |--------------------|--------------------------|
    /// | `DOWNLOAD_URL`     | `http://localhost:8081`  |
    /// | `UPLOAD_URL`       | `http://localhost:8066`  |
    /// | `POLICY_URL`       | `http://localhost:8181`  |
    /// | `SUBSCRIPTION_URL` | `http://localhost:8070`  |
    /// | `AUTH_TYPE`        | `none` (or `basic`)      |
    /// | `AUTH_USER`        | — (required for `basic`) |
    /// | `AUTH_PASSWORD`    | — (required for `basic`) |
    pub fn from_env() -> Self {
        let download_url = env_or("DOWNLOAD_URL", "http://localhost:8081");
        let upload_url = env_or("UPLOAD_URL", "http://localhost:8066");
        let policy_url = env_or("POLICY_URL", "http://localhost:8181");
        let subscription_url = env_or("SUBSCRIPTION_URL", "http://localhost:8070");

        let auth = match env_or("AUTH_TYPE", "none").as_str() {
            "none" => AuthMode::None,
            "basic" => AuthMode::Basic {
                username: std::env::var("AUTH_USER")
                    .expect("AUTH_USER must be set when AUTH_TYPE=basic"),
                password: std::env::var("AUTH_PASSWORD")
                    .expect("AUTH_PASSWORD must be set when AUTH_TYPE=basic"),
            },
            other => panic!("AUTH_TYPE must be `none` or `basic`, got `{other}`"),
        };

        Self {
            download_url,
            upload_url,
            policy_url,
            subscription_url,
            auth,
        }
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.into())
}
