//! Store configuration.
//!
//! Configuration is resolved once at process startup and then passed into services, so request
//! handling never reads process-wide environment variables. The `from_env_values` constructor
//! takes the raw values as arguments; binaries read the environment and hand them over.

use crate::constants::{ENV_STORE_KEY, ENV_STORE_URL};
use crate::error::ConfigError;
use clinic_types::NonEmptyText;
use std::path::{Path, PathBuf};

/// Connection settings for the hosted PostgREST-style store.
#[derive(Clone, Debug)]
pub struct PostgrestConfig {
    base_url: String,
    api_key: NonEmptyText,
}

impl PostgrestConfig {
    /// Validates that `base_url` is an absolute http(s) URL and `api_key` is non-blank.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ConfigError> {
        let url = reqwest::Url::parse(base_url.trim()).map_err(|e| ConfigError::Invalid {
            name: "store URL",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "store URL",
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        let api_key = NonEmptyText::new(api_key).map_err(|_| ConfigError::Invalid {
            name: "store API key",
            reason: "cannot be empty".into(),
        })?;

        Ok(Self {
            base_url: url.as_str().to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &NonEmptyText {
        &self.api_key
    }
}

#[derive(Clone, Debug)]
pub enum StoreBackend {
    Postgrest(PostgrestConfig),
    Memory { seed_file: Option<PathBuf> },
}

/// Which store to talk to, resolved at startup.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    backend: StoreBackend,
}

impl StoreConfig {
    pub fn new(backend: StoreBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &StoreBackend {
        &self.backend
    }

    /// Resolve the store configuration from optional raw values.
    ///
    /// `backend` defaults to `postgrest`, which requires both `url` and `key`. The `memory`
    /// backend optionally takes a seed file. Blank values count as unset.
    pub fn from_env_values(
        backend: Option<String>,
        url: Option<String>,
        key: Option<String>,
        seed_file: Option<String>,
    ) -> Result<Self, ConfigError> {
        fn present(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let backend = present(backend).unwrap_or_else(|| "postgrest".into());
        match backend.to_ascii_lowercase().as_str() {
            "postgrest" => {
                let url = present(url).ok_or(ConfigError::Missing(ENV_STORE_URL))?;
                let key = present(key).ok_or(ConfigError::Missing(ENV_STORE_KEY))?;
                let postgrest = PostgrestConfig::new(&url, &key)?;
                Ok(Self::new(StoreBackend::Postgrest(postgrest)))
            }
            "memory" => {
                let seed_file = present(seed_file).map(PathBuf::from);
                if let Some(path) = &seed_file {
                    ensure_file(path)?;
                }
                Ok(Self::new(StoreBackend::Memory { seed_file }))
            }
            other => Err(ConfigError::Invalid {
                name: "store backend",
                reason: format!("expected `postgrest` or `memory`, got `{other}`"),
            }),
        }
    }
}

fn ensure_file(path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name: "seed file",
            reason: format!("{} is not a file", path.display()),
        })
    }
}
