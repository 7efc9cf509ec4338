//! Runtime configuration for the conversion webhook
//!
//! Read from environment variables:
//! - `RMQ_CONVERT_TLS` - serve HTTPS with self-managed certificates ("true"/"1")
//! - `RMQ_CONVERT_SERVICE_NAME` - Service fronting the webhook
//! - `RMQ_CONVERT_NAMESPACE` - namespace of that Service and the TLS Secret
//! - `RMQ_CONVERT_TLS_SECRET` - Secret holding the generated certificates
//! - `RMQ_CONVERT_HTTP_PORT` / `RMQ_CONVERT_HTTPS_PORT` - listen ports

use tracing::warn;

pub const ENV_TLS: &str = "RMQ_CONVERT_TLS";
pub const ENV_SERVICE_NAME: &str = "RMQ_CONVERT_SERVICE_NAME";
pub const ENV_NAMESPACE: &str = "RMQ_CONVERT_NAMESPACE";
pub const ENV_TLS_SECRET: &str = "RMQ_CONVERT_TLS_SECRET";
pub const ENV_HTTP_PORT: &str = "RMQ_CONVERT_HTTP_PORT";
pub const ENV_HTTPS_PORT: &str = "RMQ_CONVERT_HTTPS_PORT";

/// Default port for plain HTTP (health probes, local testing)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default port for HTTPS (what the API server calls)
pub const DEFAULT_HTTPS_PORT: u16 = 8443;

pub const DEFAULT_SERVICE_NAME: &str = "rabbitmq-conversion-webhook";
pub const DEFAULT_NAMESPACE: &str = "rabbitmq-system";
pub const DEFAULT_TLS_SECRET_NAME: &str = "rabbitmq-conversion-webhook-tls";

/// Webhook server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub tls_enabled: bool,
    pub service_name: String,
    pub namespace: String,
    pub tls_secret_name: String,
    pub http_port: u16,
    pub https_port: u16,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            tls_enabled: false,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            tls_secret_name: DEFAULT_TLS_SECRET_NAME.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            https_port: DEFAULT_HTTPS_PORT,
        }
    }
}

impl WebhookConfig {
    /// Build configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            tls_enabled: lookup(ENV_TLS).map(|v| is_truthy(&v)).unwrap_or(false),
            service_name: lookup(ENV_SERVICE_NAME).unwrap_or(defaults.service_name),
            namespace: lookup(ENV_NAMESPACE).unwrap_or(defaults.namespace),
            tls_secret_name: lookup(ENV_TLS_SECRET).unwrap_or(defaults.tls_secret_name),
            http_port: parse_port(ENV_HTTP_PORT, lookup(ENV_HTTP_PORT), defaults.http_port),
            https_port: parse_port(ENV_HTTPS_PORT, lookup(ENV_HTTPS_PORT), defaults.https_port),
        }
    }

    /// Port the server binds, depending on TLS mode
    pub fn listen_port(&self) -> u16 {
        if self.tls_enabled {
            self.https_port
        } else {
            self.http_port
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value == "true" || value == "1"
}

fn parse_port(key: &str, value: Option<String>, default: u16) -> u16 {
    match value {
        None => default,
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(e) => {
                warn!(variable = key, value = %raw, error = %e, "Invalid port, using default");
                default
            }
        },
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
