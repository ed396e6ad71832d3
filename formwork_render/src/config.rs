// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration.
//!
//! [`FormworkConfig`] gathers the knobs the rest of the crate takes as
//! arguments. It deserializes from JSON with every field optional, or reads
//! the process environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `FORMWORK_ENV` | `environment` (`production`, `staging`, `development`, `local`) |
//! | `FORMWORK_UNKNOWN_EVENTS` | `unknown_events` (`log`, `reject`) |
//! | `FORMWORK_CACHE_PREFIX` | `cache_prefix` |

use formwork_manifest::environment::ENV_VAR;
use formwork_manifest::{DEFAULT_CACHE_PREFIX, Environment, Manifest, MemoryCache};
use formwork_router::{FallbackPolicy, UpdateRouter};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Variable naming the unknown-event policy.
pub const UNKNOWN_EVENTS_VAR: &str = "FORMWORK_UNKNOWN_EVENTS";

/// Variable naming the catalog cache prefix.
pub const CACHE_PREFIX_VAR: &str = "FORMWORK_CACHE_PREFIX";

/// Library configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormworkConfig {
    /// Selects whether component discovery is cached.
    pub environment: Environment,
    /// What to do with unrecognized builder events.
    pub unknown_events: FallbackPolicy,
    /// Prefix for catalog cache keys.
    pub cache_prefix: String,
}

impl Default for FormworkConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            unknown_events: FallbackPolicy::default(),
            cache_prefix: DEFAULT_CACHE_PREFIX.to_owned(),
        }
    }
}

impl FormworkConfig {
    /// Parse a JSON document; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read variables through `lookup`; unset variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(env) = lookup(ENV_VAR) {
            config.environment = env.parse()?;
        }
        if let Some(policy) = lookup(UNKNOWN_EVENTS_VAR) {
            config.unknown_events = serde_json::from_value(policy.trim().to_ascii_lowercase().into())?;
        }
        if let Some(prefix) = lookup(CACHE_PREFIX_VAR) {
            config.cache_prefix = prefix;
        }
        Ok(config)
    }

    /// A manifest with a fresh memory cache.
    pub fn manifest(&self) -> Manifest {
        let mut manifest = Manifest::with_cache(self.environment, MemoryCache::new());
        manifest.set_cache_prefix(self.cache_prefix.clone());
        manifest
    }

    /// A router applying the unknown-event policy.
    pub fn router(&self) -> UpdateRouter {
        UpdateRouter::with_policy(self.unknown_events)
    }
}
