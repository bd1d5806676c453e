//! Orchestration object: members + manager, delegated as one call.
//!
//! [`Orchestration`] is a Tower service built from the current agent roster
//! and the manager's completion configuration. Calling it submits the whole
//! task to the external runtime and replays any intermediate agent messages
//! through an optional callback. No coordination logic lives here.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tower::Service;
use tracing::{debug, info, instrument, Instrument};

use crate::agent::{AgentDefinition, AgentMessage};
use crate::config::EnsembleConfig;
use crate::error::EnsembleError;
use crate::runtime::{OrchestrationOutcome, OrchestrationRuntime};
use crate::trace::TraceContext;

/// Completion configuration handed to the external orchestration manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Model deployment the manager coordinates with.
    pub model_deployment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ManagerConfig {
    pub fn new(model_deployment: impl Into<String>) -> Self {
        Self {
            model_deployment: model_deployment.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl From<&EnsembleConfig> for ManagerConfig {
    fn from(config: &EnsembleConfig) -> Self {
        Self::new(config.model_deployment.clone())
    }
}

/// One task submission, optionally scoped under an external trace.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub task: String,
    pub trace: Option<TraceContext>,
}

impl TaskRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = Some(trace);
        self
    }
}

type AgentResponseCallback = Arc<dyn Fn(&AgentMessage) + Send + Sync>;

/// A pre-built orchestration over a fixed member roster.
#[derive(Clone)]
pub struct Orchestration {
    members: Vec<AgentDefinition>,
    manager: ManagerConfig,
    runtime: Arc<dyn OrchestrationRuntime>,
    on_agent_response: Option<AgentResponseCallback>,
}

impl Orchestration {
    /// Start building an orchestration over the given runtime and manager.
    pub fn builder(runtime: Arc<dyn OrchestrationRuntime>, manager: ManagerConfig) -> OrchestrationBuilder {
        OrchestrationBuilder {
            members: Vec::new(),
            manager,
            runtime,
            on_agent_response: None,
        }
    }

    pub fn members(&self) -> &[AgentDefinition] {
        &self.members
    }
}

/// Builder for [`Orchestration`].
pub struct OrchestrationBuilder {
    members: Vec<AgentDefinition>,
    manager: ManagerConfig,
    runtime: Arc<dyn OrchestrationRuntime>,
    on_agent_response: Option<AgentResponseCallback>,
}

impl OrchestrationBuilder {
    pub fn member(mut self, definition: AgentDefinition) -> Self {
        self.members.push(definition);
        self
    }

    pub fn members(mut self, definitions: Vec<AgentDefinition>) -> Self {
        self.members.extend(definitions);
        self
    }

    /// Observe each intermediate agent message as the runtime reports it.
    pub fn on_agent_response<F>(mut self, callback: F) -> Self
    where
        F: Fn(&AgentMessage) + Send + Sync + 'static,
    {
        self.on_agent_response = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> Orchestration {
        Orchestration {
            members: self.members,
            manager: self.manager,
            runtime: self.runtime,
            on_agent_response: self.on_agent_response,
        }
    }
}

impl Service<TaskRequest> for Orchestration {
    type Response = OrchestrationOutcome;
    type Error = EnsembleError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    #[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4(), traceparent = tracing::field::Empty))]
    fn call(&mut self, req: TaskRequest) -> Self::Future {
        let members = self.members.clone();
        let manager = self.manager.clone();
        let runtime = self.runtime.clone();
        let callback = self.on_agent_response.clone();

        if let Some(trace) = &req.trace {
            trace.record_on(&tracing::Span::current());
        }

        Box::pin(
            async move {
                debug!(members = members.len(), model = %manager.model_deployment, "delegating task to orchestration runtime");
                let outcome = runtime
                    .run(&req.task, &members, &manager, req.trace.as_ref())
                    .await?;

                if let Some(callback) = &callback {
                    for message in &outcome.agent_messages {
                        callback(message);
                    }
                }
                info!(
                    agent_messages = outcome.agent_messages.len(),
                    "orchestration completed"
                );
                Ok(outcome)
            }
            .instrument(tracing::Span::current()),
        )
    }
}
