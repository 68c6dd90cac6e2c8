use std::net::SocketAddr;

use eyre::Result;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::config::models::{LoggingConfig, ServerConfig, UpstreamConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Invalid upstream URL '{url}': {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration, reporting every problem at once
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_scheme(&config.public_scheme) {
            errors.push(e);
        }

        if let Err(mut upstream_errors) = Self::validate_upstream(&config.upstream) {
            errors.append(&mut upstream_errors);
        }

        if let Err(e) = Self::validate_logging(&config.logging) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_scheme(scheme: &str) -> ValidationResult<()> {
        match scheme {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::InvalidField {
                field: "public_scheme".to_string(),
                message: format!("'{other}' must be 'http' or 'https'"),
            }),
        }
    }

    fn validate_upstream(upstream: &UpstreamConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        match Url::parse(&upstream.base_url) {
            Ok(url) if !matches!(url.scheme(), "http" | "https") => {
                errors.push(ValidationError::InvalidUpstreamUrl {
                    url: upstream.base_url.clone(),
                    reason: "URL must start with http:// or https://".to_string(),
                });
            }
            Ok(url) if url.query().is_some() => {
                errors.push(ValidationError::InvalidUpstreamUrl {
                    url: upstream.base_url.clone(),
                    reason: "URL must not carry a query string".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidUpstreamUrl {
                url: upstream.base_url.clone(),
                reason: e.to_string(),
            }),
        }

        if upstream.timeout_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "upstream.timeout_secs".to_string(),
                message: "Timeout must be greater than 0".to_string(),
            });
        }

        if upstream.proxy_timeout_ms == 0 {
            errors.push(ValidationError::InvalidField {
                field: "upstream.proxy_timeout_ms".to_string(),
                message: "Timeout must be greater than 0".to_string(),
            });
        }

        if upstream.user_agent.trim().is_empty() {
            errors.push(ValidationError::InvalidField {
                field: "upstream.user_agent".to_string(),
                message: "User agent cannot be empty".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_logging(logging: &LoggingConfig) -> ValidationResult<()> {
        EnvFilter::try_new(&logging.level)
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: e.to_string(),
            })
    }

    /// Format multiple validation errors into a readable message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServerConfigValidator::validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_listen_address() {
        let config = ServerConfig::builder().listen_addr("localhost").build();
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid listen address 'localhost'"));
    }

    #[test]
    fn test_invalid_scheme() {
        let config = ServerConfig::builder().public_scheme("ftp").build();
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("public_scheme"));
    }

    #[test]
    fn test_upstream_url_must_be_http() {
        for url in ["ftp://provider/", "not a url", "http://provider/?key=1"] {
            let config = ServerConfig::builder().upstream_url(url).build();
            let err = ServerConfigValidator::validate(&config).unwrap_err();
            assert!(
                err.to_string().contains("Invalid upstream URL"),
                "{url}: {err}"
            );
        }
    }

    #[test]
    fn test_multiple_errors_are_aggregated() {
        let mut config = ServerConfig::builder()
            .listen_addr("nowhere")
            .upstream_url("ftp://provider/")
            .build();
        config.upstream.proxy_timeout_ms = 0;

        let message = ServerConfigValidator::validate(&config)
            .unwrap_err()
            .to_string();
        assert!(message.contains("Found 3 validation errors"));
        assert!(message.contains("upstream.proxy_timeout_ms"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = ServerConfig::default();
        config.logging.level = "storegate=loud".to_string();
        assert!(ServerConfigValidator::validate(&config).is_err());
    }
}
