//! Data model for remotely hosted agents.
//!
//! These types mirror what the hosted agent service returns; the crate caches
//! them locally between `initialize` and `cleanup` but owns no conversation
//! state of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Definition of an agent as returned by the hosted agent service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDefinition {
    /// Opaque identifier assigned by the hosting service.
    pub id: String,
    pub name: String,
    /// Model deployment backing this agent.
    pub model: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AgentDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model: model.into(),
            instructions: String::new(),
            description: None,
        }
    }
}

/// Locally cached handle for an initialized agent.
///
/// `thread_id` is the remote conversation thread the hosting service assigned
/// to this agent, once one exists; runs on that thread are what the
/// cancel-before-invoke sweep targets.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    pub definition: AgentDefinition,
    pub thread_id: Option<String>,
}

impl AgentHandle {
    pub fn new(definition: AgentDefinition) -> Self {
        Self {
            definition,
            thread_id: None,
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

/// Status of a remote run on an agent thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl RunStatus {
    /// Whether the run still occupies its thread and should be cancelled
    /// before a new orchestration starts.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::RequiresAction
        )
    }
}

/// A run as reported by the hosting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A single agent utterance surfaced by the orchestration runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentMessage {
    /// Name of the agent that produced the message.
    pub agent: String,
    pub content: String,
}
