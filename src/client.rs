//! Client seam for the hosted agent service.
//!
//! The service that stores agent definitions, threads, and runs is an opaque
//! collaborator; [`AgentsClient`] is the trait boundary this crate talks
//! through, and [`HttpAgentsClient`] is the stock HTTP implementation. Tests
//! substitute their own impls.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::agent::{AgentDefinition, RunInfo};
use crate::config::EnsembleConfig;
use crate::error::{EnsembleError, Result};

/// Operations the crate needs from the hosted agent service.
#[async_trait]
pub trait AgentsClient: Send + Sync {
    /// Fetch the definition of an agent by its opaque identifier.
    async fn get_agent(&self, agent_id: &str) -> Result<AgentDefinition>;

    /// List runs on a conversation thread.
    async fn list_runs(&self, thread_id: &str) -> Result<Vec<RunInfo>>;

    /// Cancel a run on a conversation thread.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<()>;

    /// Close the client. Further calls are not expected after this.
    async fn close(&self) -> Result<()>;
}

/// List envelope used by the runs endpoint.
#[derive(Debug, Deserialize)]
struct RunListResponse {
    data: Vec<RunInfo>,
}

/// HTTP implementation of [`AgentsClient`] against a hosted agent project.
pub struct HttpAgentsClient {
    http: reqwest::Client,
    base: String,
    api_key: Option<String>,
    closed: AtomicBool,
}

impl HttpAgentsClient {
    /// Build a client from configuration.
    pub fn from_config(config: &EnsembleConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| EnsembleError::remote("build http client", e))?;
        Ok(Self {
            http,
            base: config.project_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            closed: AtomicBool::new(false),
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EnsembleError::remote(operation, "client closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl AgentsClient for HttpAgentsClient {
    async fn get_agent(&self, agent_id: &str) -> Result<AgentDefinition> {
        self.ensure_open("get_agent")?;
        let url = format!("{}/agents/{}", self.base, agent_id);
        let resp = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| EnsembleError::remote("get_agent", e))?
            .error_for_status()
            .map_err(|e| EnsembleError::remote("get_agent", e))?;
        let def = resp
            .json::<AgentDefinition>()
            .await
            .map_err(|e| EnsembleError::remote("get_agent", e))?;
        Ok(def)
    }

    async fn list_runs(&self, thread_id: &str) -> Result<Vec<RunInfo>> {
        self.ensure_open("list_runs")?;
        let url = format!("{}/threads/{}/runs", self.base, thread_id);
        let resp = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| EnsembleError::remote("list_runs", e))?
            .error_for_status()
            .map_err(|e| EnsembleError::remote("list_runs", e))?;
        let list = resp
            .json::<RunListResponse>()
            .await
            .map_err(|e| EnsembleError::remote("list_runs", e))?;
        Ok(list.data)
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        self.ensure_open("cancel_run")?;
        let url = format!("{}/threads/{}/runs/{}/cancel", self.base, thread_id, run_id);
        self.authorize(self.http.post(&url))
            .send()
            .await
            .map_err(|e| EnsembleError::remote("cancel_run", e))?
            .error_for_status()
            .map_err(|e| EnsembleError::remote("cancel_run", e))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // The connection pool is torn down on drop; the flag makes reuse
        // after close an explicit error instead of a silent reconnect.
        self.closed.store(true, Ordering::SeqCst);
        debug!("agents client closed");
        Ok(())
    }
}
