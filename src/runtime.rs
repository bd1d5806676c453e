//! Seam for the external orchestration runtime.
//!
//! The turn-taking algorithm between agents lives entirely outside this
//! crate, in a hosted orchestration runtime. [`OrchestrationRuntime`] is the
//! boundary: it takes one task plus the member roster and the manager's
//! completion configuration, and produces one aggregated outcome. Tests
//! substitute scripted impls; [`HttpOrchestrationRuntime`] delegates over
//! HTTP.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentDefinition, AgentMessage};
use crate::config::EnsembleConfig;
use crate::error::{EnsembleError, Result};
use crate::orchestration::ManagerConfig;
use crate::trace::TraceContext;

/// Final product of a delegated orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationOutcome {
    /// Aggregated result text produced by the manager.
    pub final_text: String,
    /// Per-agent utterances emitted while the runtime coordinated the turn
    /// sequence, in arrival order.
    #[serde(default)]
    pub agent_messages: Vec<AgentMessage>,
    /// Conversation threads the hosting service assigned to each member
    /// (agent ID → thread ID). The service records these so the next
    /// invocation's cancel sweep knows where to look.
    #[serde(default)]
    pub thread_assignments: HashMap<String, String>,
}

/// The external multi-agent coordination runtime.
#[async_trait]
pub trait OrchestrationRuntime: Send + Sync {
    /// Delegate one whole task to the runtime and await its aggregated outcome.
    async fn run(
        &self,
        task: &str,
        members: &[AgentDefinition],
        manager: &ManagerConfig,
        trace: Option<&TraceContext>,
    ) -> Result<OrchestrationOutcome>;
}

#[derive(Debug, Serialize)]
struct OrchestrationRequest<'a> {
    task: &'a str,
    agents: Vec<&'a str>,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OrchestrationResponse {
    result: String,
    #[serde(default)]
    messages: Vec<AgentMessage>,
    #[serde(default)]
    threads: HashMap<String, String>,
}

/// HTTP implementation of [`OrchestrationRuntime`] against a hosted runtime
/// exposed by the same project endpoint as the agent service.
pub struct HttpOrchestrationRuntime {
    http: reqwest::Client,
    base: String,
    api_key: Option<String>,
}

impl HttpOrchestrationRuntime {
    pub fn from_config(config: &EnsembleConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| EnsembleError::remote("build http client", e))?;
        Ok(Self {
            http,
            base: config.project_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl OrchestrationRuntime for HttpOrchestrationRuntime {
    async fn run(
        &self,
        task: &str,
        members: &[AgentDefinition],
        manager: &ManagerConfig,
        trace: Option<&TraceContext>,
    ) -> Result<OrchestrationOutcome> {
        let url = format!("{}/orchestrations", self.base);
        let body = OrchestrationRequest {
            task,
            agents: members.iter().map(|m| m.id.as_str()).collect(),
            model: &manager.model_deployment,
            temperature: manager.temperature,
            max_tokens: manager.max_tokens,
        };

        let mut req = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(trace) = trace {
            for (name, value) in trace.headers() {
                req = req.header(name, value);
            }
        }

        let resp = req
            .send()
            .await
            .map_err(|e| EnsembleError::remote("orchestration run", e))?
            .error_for_status()
            .map_err(|e| EnsembleError::remote("orchestration run", e))?;
        let parsed = resp
            .json::<OrchestrationResponse>()
            .await
            .map_err(|e| EnsembleError::remote("orchestration run", e))?;

        Ok(OrchestrationOutcome {
            final_text: parsed.result,
            agent_messages: parsed.messages,
            thread_assignments: parsed.threads,
        })
    }
}
