/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8051`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Externally reachable `/receive` URL advertised when registering
    /// the event subscription at startup.
    pub receive_url: String,
    /// Whether to self-register the event subscription at startup.
    pub register_subscription: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                            |
    /// |-------------------------|------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                          |
    /// | `PORT`                  | `8051`                             |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`            |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                               |
    /// | `RECEIVE_URL`           | `http://localhost:8051/receive`    |
    /// | `REGISTER_SUBSCRIPTION` | `true`                             |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8051".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let receive_url = std::env::var("RECEIVE_URL")
            .unwrap_or_else(|_| "http://localhost:8051/receive".into());

        let register_subscription: bool = std::env::var("REGISTER_SUBSCRIPTION")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("REGISTER_SUBSCRIPTION must be `true` or `false`");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            receive_url,
            register_subscription,
        }
    }
}
