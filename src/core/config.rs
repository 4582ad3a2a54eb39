//! Endpoint configuration for doi-publisher
//!
//! The configuration is built once by the caller and handed to the publisher.
//! Nothing in the publisher reads the process environment on its own.

use crate::core::error::PublishError;
use crate::security::token_manager::SecureTokenManager;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Production deposition API host
pub const PRODUCTION_BASE_URL: &str = "https://zenodo.org";

/// Sandbox deposition API host
pub const SANDBOX_BASE_URL: &str = "https://sandbox.zenodo.org";

/// Target instance of the deposition API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    pub fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox {
            Self::Sandbox
        } else {
            Self::Production
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_BASE_URL,
            Self::Sandbox => SANDBOX_BASE_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration load options
///
/// Not `Debug`: `env` holds the token in clear text.
#[derive(Clone, Default)]
pub struct ConfigLoadOptions {
    /// Use the sandbox instance instead of production
    pub sandbox: bool,

    /// Per-request timeout (none by default)
    pub timeout: Option<Duration>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options populated from the current process environment
    ///
    /// Variables whose name or value is not valid Unicode are ignored.
    pub fn from_process_env(sandbox: bool) -> Self {
        let env = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();

        Self {
            sandbox,
            timeout: None,
            env,
        }
    }
}

/// Immutable endpoint configuration: one base URL and one token
pub struct PublisherConfig {
    environment: Environment,
    token: SecretString,
    timeout: Option<Duration>,
}

impl PublisherConfig {
    pub fn new(environment: Environment, token: SecretString) -> Self {
        Self {
            environment,
            token,
            timeout: None,
        }
    }

    /// Sets a timeout applied to every request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build a configuration from explicit load options
    ///
    /// Fails with `ConfigurationError` when the token variable is absent or empty.
    pub fn load(options: ConfigLoadOptions) -> Result<Self, PublishError> {
        let manager = SecureTokenManager::new();
        let token = manager.get_token_from(&options.env).ok_or_else(|| {
            PublishError::ConfigurationError(format!(
                "{} environment variable is not set",
                manager.token_name()
            ))
        })?;

        Ok(Self {
            environment: Environment::from_sandbox_flag(options.sandbox),
            token,
            timeout: options.timeout,
        })
    }

    /// Build a configuration from the process environment
    pub fn from_env(sandbox: bool) -> Result<Self, PublishError> {
        Self::load(ConfigLoadOptions::from_process_env(sandbox))
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn base_url(&self) -> &'static str {
        self.environment.base_url()
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Token in its masked form, safe for logs
    pub fn masked_token(&self) -> String {
        SecureTokenManager::new().mask_token(self.token.expose_secret())
    }
}

impl fmt::Debug for PublisherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublisherConfig")
            .field("environment", &self.environment)
            .field("token", &self.masked_token())
            .field("timeout", &self.timeout)
            .finish()
    }
}
