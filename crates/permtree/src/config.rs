//! Engine configuration.
//!
//! Defaults reproduce the documented behavior; environment variables let a
//! host tune search and verification without code changes.
//!
//! Environment variables:
//! - `PERMTREE_AUTO_EXPAND` (bool): expand matched branches in search projections.
//! - `PERMTREE_TRIM_QUERY` (bool): trim surrounding whitespace from queries.
//! - `PERMTREE_VERIFY_INVARIANTS` (bool): re-check aggregates after each session operation.
//! - `PERMTREE_INITIAL_EXPANDED` (bool): expanded flag for trees built from a catalog.
//! - `PERMTREE_FLAT_SUBCATEGORY` (string): sub-category name used when a flat
//!   catalog category is normalized. Unset means "use the category name".

use std::env;
use std::fmt;

const ENV_AUTO_EXPAND: &str = "PERMTREE_AUTO_EXPAND";
const ENV_TRIM_QUERY: &str = "PERMTREE_TRIM_QUERY";
const ENV_VERIFY_INVARIANTS: &str = "PERMTREE_VERIFY_INVARIANTS";
const ENV_INITIAL_EXPANDED: &str = "PERMTREE_INITIAL_EXPANDED";
const ENV_FLAT_SUBCATEGORY: &str = "PERMTREE_FLAT_SUBCATEGORY";

/// Tunables for tree construction, search, and sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermTreeConfig {
    /// Mark matched categories and sub-categories expanded in projections.
    pub auto_expand_matches: bool,
    /// Trim the query before matching.
    pub trim_query: bool,
    /// Run [`crate::PermissionTree::check_invariants`] after every session operation.
    pub verify_invariants: bool,
    /// Expanded flag given to every node built from a catalog.
    pub initial_expanded: bool,
    /// Sub-category name for normalized flat categories.
    pub flat_subcategory_name: Option<String>,
}

impl Default for PermTreeConfig {
    fn default() -> Self {
        Self {
            auto_expand_matches: true,
            trim_query: true,
            verify_invariants: cfg!(debug_assertions),
            initial_expanded: false,
            flat_subcategory_name: None,
        }
    }
}

/// Configuration parse diagnostics.
#[derive(Debug, Clone)]
pub struct ConfigParse {
    pub config: PermTreeConfig,
    pub errors: Vec<ConfigError>,
}

/// A rejected configuration value. The default stays in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl PermTreeConfig {
    /// Parse config from environment variables.
    ///
    /// Invalid values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let parsed = Self::from_env_with_diagnostics();
        for error in &parsed.errors {
            tracing::warn!(field = error.field, value = %error.value, "{}", error.message);
        }
        parsed.config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config using a custom lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(mut get: F) -> ConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        let mut read_bool = |key: &str, field: &'static str, slot: &mut bool| {
            if let Some(value) = get(key) {
                match parse_bool(&value) {
                    Some(parsed) => *slot = parsed,
                    None => errors.push(ConfigError::new(
                        field,
                        value,
                        "expected bool (1/0/true/false/yes/no/on/off)",
                    )),
                }
            }
        };
        read_bool(
            ENV_AUTO_EXPAND,
            "auto_expand_matches",
            &mut config.auto_expand_matches,
        );
        read_bool(ENV_TRIM_QUERY, "trim_query", &mut config.trim_query);
        read_bool(
            ENV_VERIFY_INVARIANTS,
            "verify_invariants",
            &mut config.verify_invariants,
        );
        read_bool(
            ENV_INITIAL_EXPANDED,
            "initial_expanded",
            &mut config.initial_expanded,
        );

        if let Some(value) = get(ENV_FLAT_SUBCATEGORY) {
            if value.trim().is_empty() {
                errors.push(ConfigError::new(
                    "flat_subcategory_name",
                    value,
                    "expected a non-empty name",
                ));
            } else {
                config.flat_subcategory_name = Some(value);
            }
        }

        ConfigParse { config, errors }
    }

    /// Sub-category name for a flat category called `category`.
    #[must_use]
    pub fn flat_subcategory_for<'a>(&'a self, category: &'a str) -> &'a str {
        self.flat_subcategory_name.as_deref().unwrap_or(category)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
