//! # agent-ensemble
//!
//! Client-side lifecycle and delegation layer for hosted multi-agent
//! orchestration. Agents live in a remote agent project and are addressed by
//! opaque IDs; the multi-agent turn-taking algorithm lives in an external
//! orchestration runtime. This crate owns neither — it resolves agent
//! definitions, hands a task to the runtime, returns the aggregated result,
//! and cleans up remote runs afterwards.
//!
//! ## Core Concepts
//!
//! - **OrchestrationService**: caller-owned session object with an explicit
//!   `new → initialize → invoke* → cleanup` lifecycle
//! - **AgentsClient / OrchestrationRuntime**: trait seams over the hosted
//!   agent service and the external coordination runtime, so tests run
//!   against fakes and transports stay swappable
//! - **Orchestration**: a Tower service over a fixed member roster that
//!   delegates one task per call
//!
//! ## Getting Started
//!
//! Set `AGENT_PROJECT_ENDPOINT` (and optionally `AGENT_MODEL_DEPLOYMENT`,
//! `AGENT_API_KEY`) in the environment.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agent_ensemble::{
//!     EnsembleConfig, HttpAgentsClient, HttpOrchestrationRuntime, OrchestrationService,
//! };
//!
//! # async fn example() -> agent_ensemble::Result<()> {
//! let config = EnsembleConfig::from_env()?;
//! let client = Arc::new(HttpAgentsClient::from_config(&config)?);
//! let runtime = Arc::new(HttpOrchestrationRuntime::from_config(&config)?);
//!
//! let mut service = OrchestrationService::new(config, client, runtime);
//! service
//!     .initialize(&["asst_writer".to_string(), "asst_critic".to_string()])
//!     .await?;
//!
//! let answer = service.invoke("Draft a release announcement", None).await?;
//! println!("{answer}");
//!
//! service.cleanup().await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod orchestration;
pub mod runtime;
pub mod service;
pub mod streaming;
pub mod trace;

// Public re-exports for convenience
pub use agent::{AgentDefinition, AgentHandle, AgentMessage, RunInfo, RunStatus};
pub use client::{AgentsClient, HttpAgentsClient};
pub use config::{ConfigBuilder, EnsembleConfig};
pub use error::{EnsembleError, Result};
pub use orchestration::{ManagerConfig, Orchestration, OrchestrationBuilder, TaskRequest};
pub use runtime::{HttpOrchestrationRuntime, OrchestrationOutcome, OrchestrationRuntime};
pub use service::{AgentInfo, OrchestrationService, ServiceStatus};
pub use streaming::{EventKind, SseEvent};
pub use trace::TraceContext;

// Re-export Tower traits that users need to drive `Orchestration` directly
pub use tower::{Service, ServiceExt};
