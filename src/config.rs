//! Configuration for the ensemble client.
//!
//! Settings come from the environment by default (the deployment model used
//! by the hosted agent project), with a builder for callers that
//! manage configuration themselves. Values are presence-checked
//! only; endpoint strings are passed through to the transport untouched.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EnsembleError, Result};

/// Environment variable holding the agent project endpoint.
pub const ENV_PROJECT_ENDPOINT: &str = "AGENT_PROJECT_ENDPOINT";
/// Fallback endpoint variable, kept for deployments that predate the project naming.
pub const ENV_ENDPOINT_FALLBACK: &str = "AGENT_ENDPOINT";
/// Environment variable holding the manager model deployment name.
pub const ENV_MODEL_DEPLOYMENT: &str = "AGENT_MODEL_DEPLOYMENT";
/// Environment variable holding the optional API key.
pub const ENV_API_KEY: &str = "AGENT_API_KEY";

const DEFAULT_MODEL_DEPLOYMENT: &str = "gpt-4o-mini";
const DEFAULT_MIN_AGENTS: usize = 2;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Endpoint of the hosted agent project (agent definitions, threads, runs).
    pub project_endpoint: String,

    /// Model deployment name used by the orchestration manager.
    pub model_deployment: String,

    /// Optional API key; when absent the transport sends no Authorization header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Minimum number of agents required before orchestration may start.
    pub min_agents: usize,

    /// Timeout applied to each delegated remote call.
    pub request_timeout: Duration,
}

impl EnsembleConfig {
    /// Create a configuration with defaults for everything but the endpoint.
    pub fn new(project_endpoint: impl Into<String>) -> Self {
        Self {
            project_endpoint: project_endpoint.into(),
            model_deployment: DEFAULT_MODEL_DEPLOYMENT.to_string(),
            api_key: None,
            min_agents: DEFAULT_MIN_AGENTS,
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// The endpoint is required (`AGENT_PROJECT_ENDPOINT`, falling back to
    /// `AGENT_ENDPOINT`); everything else has a default.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var(ENV_PROJECT_ENDPOINT)
            .or_else(|_| std::env::var(ENV_ENDPOINT_FALLBACK))
            .map_err(|_| EnsembleError::ConfigurationMissing(ENV_PROJECT_ENDPOINT))?;

        let mut config = Self::new(endpoint);
        if let Ok(model) = std::env::var(ENV_MODEL_DEPLOYMENT) {
            config.model_deployment = model;
        }
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        Ok(config)
    }

    /// Start building a configuration.
    pub fn builder(project_endpoint: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            config: Self::new(project_endpoint),
        }
    }
}

/// Builder for [`EnsembleConfig`].
pub struct ConfigBuilder {
    config: EnsembleConfig,
}

impl ConfigBuilder {
    pub fn model_deployment(mut self, model: impl Into<String>) -> Self {
        self.config.model_deployment = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn min_agents(mut self, min: usize) -> Self {
        self.config.min_agents = min;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> EnsembleConfig {
        self.config
    }
}
