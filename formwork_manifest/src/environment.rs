// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deployment environment, which decides whether discovery is cached.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable consulted by [`Environment::from_env`].
pub const ENV_VAR: &str = "FORMWORK_ENV";

/// Deployment environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Discovery results are memoized and written to the cache.
    #[default]
    Production,
    /// Discovery re-runs on every read.
    Development,
}

impl Environment {
    /// Read [`ENV_VAR`]; unset or unrecognized values mean production.
    pub fn from_env() -> Self {
        std::env::var(ENV_VAR)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Whether discovery results may be cached.
    pub const fn caches_discovery(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Error for unrecognized environment names.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment `{0}`")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "staging" => Ok(Self::Production),
            "development" | "local" => Ok(Self::Development),
            other => Err(UnknownEnvironment(other.to_owned())),
        }
    }
}
