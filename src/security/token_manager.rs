//! Secure token manager with memory-safe handling and masking capabilities
//!
//! This module provides token lookup for the deposition API, using the
//! `secrecy` crate to prevent accidental token exposure in logs or memory dumps.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;

/// Environment variable holding the deposition API bearer token
pub const TOKEN_ENV_VAR: &str = "ZENODO_TOKEN";

/// Secure token manager for deposition API authentication
///
/// # Examples
///
/// ```
/// use doi_publisher::security::SecureTokenManager;
/// use secrecy::ExposeSecret;
///
/// let manager = SecureTokenManager::new();
/// if let Some(token) = manager.get_token() {
///     println!("Token found: {}", manager.mask_token(token.expose_secret()));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SecureTokenManager {
    token_name: String,
}

impl Default for SecureTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureTokenManager {
    /// Creates a manager reading `ZENODO_TOKEN`
    pub fn new() -> Self {
        Self::with_token_name(TOKEN_ENV_VAR)
    }

    /// Creates a manager reading a different variable name
    pub fn with_token_name(token_name: impl Into<String>) -> Self {
        Self {
            token_name: token_name.into(),
        }
    }

    /// Retrieves the token from the process environment
    ///
    /// Returns `None` if the variable is not set or is empty.
    pub fn get_token(&self) -> Option<SecretString> {
        let token_value = env::var(&self.token_name).ok()?;
        Self::non_empty(token_value)
    }

    /// Retrieves the token from an explicit environment map
    ///
    /// # Examples
    ///
    /// ```
    /// use doi_publisher::security::SecureTokenManager;
    /// use std::collections::HashMap;
    ///
    /// let manager = SecureTokenManager::new();
    /// let env = HashMap::from([("ZENODO_TOKEN".to_string(), "abc".to_string())]);
    /// assert!(manager.get_token_from(&env).is_some());
    /// assert!(manager.get_token_from(&HashMap::new()).is_none());
    /// ```
    pub fn get_token_from(&self, env: &HashMap<String, String>) -> Option<SecretString> {
        let token_value = env.get(&self.token_name)?.clone();
        Self::non_empty(token_value)
    }

    /// Checks if the token is set in the process environment
    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification purposes.
    /// Tokens shorter than 10 characters are fully masked as "****".
    ///
    /// # Examples
    ///
    /// ```
    /// use doi_publisher::security::SecureTokenManager;
    ///
    /// let manager = SecureTokenManager::new();
    /// assert_eq!(manager.mask_token("abcdef123456"), "abc...456");
    /// assert_eq!(manager.mask_token("short"), "****");
    /// ```
    pub fn mask_token(&self, token: &str) -> String {
        if token.len() < 10 || !token.is_ascii() {
            return "****".to_string();
        }

        let prefix = &token[..3];
        let suffix = &token[token.len() - 3..];
        format!("{}...{}", prefix, suffix)
    }

    /// Replaces every occurrence of `token` in `text` with its masked form
    pub fn mask_token_in_string(&self, text: &str, token: &str) -> String {
        if token.is_empty() {
            return text.to_string();
        }

        match Regex::new(&regex::escape(token)) {
            Ok(regex) => {
                let masked_token = self.mask_token(token);
                regex.replace_all(text, masked_token.as_str()).to_string()
            }
            Err(_) => text.to_string(),
        }
    }

    /// Masks the configured token, if present in the process environment
    pub fn mask_tokens_in_string(&self, text: &str) -> String {
        match self.get_token() {
            Some(token) => self.mask_token_in_string(text, token.expose_secret()),
            None => text.to_string(),
        }
    }

    /// Gets the environment variable name this manager reads
    pub fn token_name(&self) -> &str {
        &self.token_name
    }

    fn non_empty(value: String) -> Option<SecretString> {
        if value.is_empty() {
            None
        } else {
            Some(SecretString::new(value.into()))
        }
    }
}
