//! Orchestration session lifecycle.
//!
//! [`OrchestrationService`] is the caller-owned object that drives the whole
//! session: resolve agent definitions, delegate tasks to the external
//! runtime, and tear remote state down again. It holds the only local state
//! in the crate — the agent handle map — and none of the conversation state,
//! which lives in the hosted service.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tower::{Service, ServiceExt};
use tracing::{error, info, instrument, warn};

use crate::agent::{AgentDefinition, AgentHandle};
use crate::client::AgentsClient;
use crate::config::EnsembleConfig;
use crate::error::{EnsembleError, Result};
use crate::orchestration::{ManagerConfig, Orchestration, TaskRequest};
use crate::runtime::OrchestrationRuntime;
use crate::streaming::{result_stream, ResultStream, SseEvent};
use crate::trace::TraceContext;

/// Snapshot of one initialized agent, for diagnostics surfaces.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub model: String,
    pub instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Session-level status report: where the service points and whether it is
/// ready to take work.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceStatus {
    pub initialized: bool,
    pub agent_count: usize,
    pub endpoint: String,
}

/// Caller-owned orchestration session.
///
/// Lifecycle: `new` → [`initialize`](Self::initialize) →
/// [`invoke`](Self::invoke)* → [`cleanup`](Self::cleanup). No global state is
/// involved; drop the value and the local handle map goes with it.
pub struct OrchestrationService {
    config: EnsembleConfig,
    client: Arc<dyn AgentsClient>,
    runtime: Arc<dyn OrchestrationRuntime>,
    agents: HashMap<String, AgentHandle>,
    member_order: Vec<String>,
    initialized: bool,
}

impl OrchestrationService {
    /// Create a service. Performs no remote calls.
    pub fn new(
        config: EnsembleConfig,
        client: Arc<dyn AgentsClient>,
        runtime: Arc<dyn OrchestrationRuntime>,
    ) -> Self {
        Self {
            config,
            client,
            runtime,
            agents: HashMap::new(),
            member_order: Vec::new(),
            initialized: false,
        }
    }

    /// Whether a successful `initialize` has happened since the last cleanup.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Resolve the given agent IDs into local handles.
    ///
    /// Fails with [`EnsembleError::MinimumAgentCountNotMet`] before touching
    /// the network when too few IDs are supplied. The per-agent fetch loop
    /// aborts on the first failure and clears any handles fetched so far, so
    /// a failed initialization never leaves partially usable state.
    #[instrument(skip(self), fields(count = agent_ids.len()))]
    pub async fn initialize(&mut self, agent_ids: &[String]) -> Result<()> {
        if agent_ids.len() < self.config.min_agents {
            return Err(EnsembleError::MinimumAgentCountNotMet {
                required: self.config.min_agents,
                actual: agent_ids.len(),
            });
        }

        self.agents.clear();
        self.member_order.clear();
        self.initialized = false;

        for agent_id in agent_ids {
            match self.client.get_agent(agent_id).await {
                Ok(definition) => {
                    info!(agent_id = %agent_id, name = %definition.name, "initialized agent");
                    self.agents
                        .insert(agent_id.clone(), AgentHandle::new(definition));
                    self.member_order.push(agent_id.clone());
                }
                Err(e) => {
                    error!(agent_id = %agent_id, error = %e, "failed to initialize agent");
                    self.agents.clear();
                    self.member_order.clear();
                    return Err(EnsembleError::AgentFetchFailed {
                        agent_id: agent_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.initialized = true;
        info!(agents = self.agents.len(), "orchestration service initialized");
        Ok(())
    }

    /// Submit one task and await the aggregated result text.
    ///
    /// The cancel sweep over member threads runs before every submission,
    /// including retries after a failed invocation, so a stale remote run
    /// never collides with the new one.
    #[instrument(skip(self, trace), fields(traceparent = tracing::field::Empty))]
    pub async fn invoke(&mut self, task: &str, trace: Option<TraceContext>) -> Result<String> {
        if !self.initialized || self.agents.is_empty() {
            return Err(EnsembleError::NotInitialized);
        }
        if let Some(trace) = &trace {
            trace.record_on(&tracing::Span::current());
        }

        info!(task = %task, "invoking orchestration");
        // precondition sweep: failures here are logged, never fatal
        let _ = self.cancel_sweep().await;

        let members = self.member_definitions();
        let manager = ManagerConfig::from(&self.config);
        let mut orchestration = Orchestration::builder(self.runtime.clone(), manager)
            .members(members)
            .on_agent_response(|message| {
                info!(agent = %message.agent, content = %message.content, "agent response");
            })
            .build();

        let mut request = TaskRequest::new(task);
        if let Some(trace) = trace {
            request = request.with_trace(trace);
        }

        let outcome = ServiceExt::ready(&mut orchestration)
            .await?
            .call(request)
            .await?;

        // Remember which threads the hosting service used so the next
        // invocation's sweep can cancel anything left running on them.
        for (agent_id, thread_id) in &outcome.thread_assignments {
            if let Some(handle) = self.agents.get_mut(agent_id) {
                handle.thread_id = Some(thread_id.clone());
            }
        }
        Ok(outcome.final_text)
    }

    /// Streaming variant of [`invoke`](Self::invoke).
    ///
    /// Yields exactly one SSE-framed chunk: the aggregated result on success,
    /// or an error-shaped chunk on failure. This is the only surface that
    /// converts a failure into a value instead of returning it.
    pub async fn invoke_stream(
        &mut self,
        task: &str,
        trace: Option<TraceContext>,
    ) -> ResultStream {
        let event = match self.invoke(task, trace).await {
            Ok(text) => SseEvent::result(text),
            Err(e) => {
                error!(error = %e, "orchestration failed, emitting error chunk");
                SseEvent::error(format!("Error during orchestration: {e}"))
            }
        };
        result_stream(event)
    }

    /// Cancel any active runs on the member threads.
    ///
    /// Best-effort: every failure is logged and skipped so one stuck thread
    /// never blocks the sweep over the others.
    pub async fn cleanup_active_runs(&self) {
        let _ = self.cancel_sweep().await;
    }

    /// Tear the session down.
    ///
    /// Runs the cancel sweep, closes the client, and always clears local
    /// state, even when remote steps fail. Step failures are collected and
    /// surfaced as [`EnsembleError::CleanupPartialFailure`]. Safe to call
    /// repeatedly and after a failed initialization.
    #[instrument(skip(self))]
    pub async fn cleanup(&mut self) -> Result<()> {
        let mut failures = self.cancel_sweep().await;

        if let Err(e) = self.client.close().await {
            warn!(error = %e, "failed to close agents client");
            failures.push(format!("close client: {e}"));
        }

        self.agents.clear();
        self.member_order.clear();
        self.initialized = false;

        if failures.is_empty() {
            info!("cleanup complete");
            Ok(())
        } else {
            Err(EnsembleError::CleanupPartialFailure { failures })
        }
    }

    /// Session-level status: readiness, member count, and the configured
    /// project endpoint.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            initialized: self.initialized,
            agent_count: self.agents.len(),
            endpoint: self.config.project_endpoint.clone(),
        }
    }

    /// Snapshot of the initialized agents, in initialization order.
    pub fn agent_info(&self) -> Vec<AgentInfo> {
        self.member_order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .map(|handle| AgentInfo {
                id: handle.definition.id.clone(),
                name: handle.definition.name.clone(),
                model: handle.definition.model.clone(),
                instructions: handle.definition.instructions.clone(),
                description: handle.definition.description.clone(),
            })
            .collect()
    }

    fn member_definitions(&self) -> Vec<AgentDefinition> {
        self.member_order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .map(|handle| handle.definition.clone())
            .collect()
    }

    /// Sweep member threads for active runs and cancel them, returning
    /// descriptions of the steps that failed.
    async fn cancel_sweep(&self) -> Vec<String> {
        let mut failures = Vec::new();
        for id in &self.member_order {
            let Some(handle) = self.agents.get(id) else {
                continue;
            };
            let Some(thread_id) = &handle.thread_id else {
                continue;
            };

            let runs = match self.client.list_runs(thread_id).await {
                Ok(runs) => runs,
                Err(e) => {
                    warn!(agent_id = %id, thread_id = %thread_id, error = %e, "failed to list runs");
                    failures.push(format!("list runs for thread {thread_id}: {e}"));
                    continue;
                }
            };

            for run in runs.iter().filter(|r| r.status.is_active()) {
                info!(run_id = %run.id, thread_id = %thread_id, "cancelling active run");
                if let Err(e) = self.client.cancel_run(thread_id, &run.id).await {
                    warn!(run_id = %run.id, error = %e, "failed to cancel run");
                    failures.push(format!("cancel run {}: {e}", run.id));
                }
            }
        }
        failures
    }
}
