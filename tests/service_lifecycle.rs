//! Integration tests for the orchestration session lifecycle, driven through
//! the public API against mock collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use agent_ensemble::{
    AgentDefinition, AgentsClient, EnsembleConfig, EnsembleError, ManagerConfig,
    OrchestrationOutcome, OrchestrationRuntime, OrchestrationService, Result, RunInfo, RunStatus,
    TraceContext,
};

/// Hosted agent service fake: a fixed catalog of agents plus per-thread runs.
#[derive(Default)]
struct FakeAgentService {
    missing_ids: Vec<String>,
    runs: Mutex<HashMap<String, Vec<RunInfo>>>,
    get_agent_calls: AtomicUsize,
    list_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl FakeAgentService {
    fn with_missing(ids: &[&str]) -> Self {
        Self {
            missing_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn add_run(&self, thread_id: &str, run_id: &str, status: RunStatus) {
        self.runs.lock().unwrap().entry(thread_id.to_string()).or_default().push(RunInfo {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status,
            created_at: None,
        });
    }
}

#[async_trait]
impl AgentsClient for FakeAgentService {
    async fn get_agent(&self, agent_id: &str) -> Result<AgentDefinition> {
        self.get_agent_calls.fetch_add(1, Ordering::SeqCst);
        if self.missing_ids.iter().any(|id| id == agent_id) {
            return Err(EnsembleError::remote("get_agent", "404 agent not found"));
        }
        Ok(AgentDefinition::new(
            agent_id,
            format!("agent-{agent_id}"),
            "gpt-4o-mini",
        ))
    }

    async fn list_runs(&self, thread_id: &str) -> Result<Vec<RunInfo>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .runs
            .lock()
            .unwrap()
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        let mut runs = self.runs.lock().unwrap();
        if let Some(thread_runs) = runs.get_mut(thread_id) {
            for run in thread_runs.iter_mut().filter(|r| r.id == run_id) {
                run.status = RunStatus::Cancelled;
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// External runtime fake: answers with a fixed text and assigns one thread
/// per member for the first `ok_calls` invocations, then fails every call.
struct FakeRuntime {
    ok_calls: usize,
    calls: AtomicUsize,
    seen_traceparents: Mutex<Vec<String>>,
}

impl FakeRuntime {
    fn with_ok_calls(ok_calls: usize) -> Self {
        Self {
            ok_calls,
            calls: AtomicUsize::new(0),
            seen_traceparents: Mutex::new(Vec::new()),
        }
    }

    fn ok() -> Self {
        Self::with_ok_calls(usize::MAX)
    }

    fn failing() -> Self {
        Self::with_ok_calls(0)
    }
}

#[async_trait]
impl OrchestrationRuntime for FakeRuntime {
    async fn run(
        &self,
        task: &str,
        members: &[AgentDefinition],
        _manager: &ManagerConfig,
        trace: Option<&TraceContext>,
    ) -> Result<OrchestrationOutcome> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(trace) = trace {
            self.seen_traceparents
                .lock()
                .unwrap()
                .push(trace.traceparent.clone());
        }
        if call >= self.ok_calls {
            return Err(EnsembleError::remote("orchestration run", "runtime exploded"));
        }
        Ok(OrchestrationOutcome {
            final_text: format!("answer to: {task}"),
            agent_messages: vec![],
            thread_assignments: members
                .iter()
                .map(|m| (m.id.clone(), format!("thread-{}", m.id)))
                .collect(),
        })
    }
}

fn config() -> EnsembleConfig {
    EnsembleConfig::builder("https://example.test/project")
        .model_deployment("gpt-4o-mini")
        .build()
}

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn empty_agent_list_fails_before_any_remote_fetch() {
    let client = Arc::new(FakeAgentService::default());
    let runtime = Arc::new(FakeRuntime::ok());
    let mut svc = OrchestrationService::new(config(), client.clone(), runtime);

    let err = svc.initialize(&[]).await.unwrap_err();
    assert!(matches!(err, EnsembleError::MinimumAgentCountNotMet { .. }));
    assert_eq!(client.get_agent_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn one_invalid_id_aborts_with_no_agents_retained() {
    let client = Arc::new(FakeAgentService::with_missing(&["asst_bad"]));
    let runtime = Arc::new(FakeRuntime::ok());
    let mut svc = OrchestrationService::new(config(), client.clone(), runtime);

    let err = svc
        .initialize(&ids(&["asst_good", "asst_bad"]))
        .await
        .unwrap_err();
    assert!(
        matches!(err, EnsembleError::AgentFetchFailed { ref agent_id, .. } if agent_id.as_str() == "asst_bad")
    );
    assert!(svc.agent_info().is_empty());
    assert!(!svc.is_initialized());

    // subsequent invocation must fail with the local state error, not reach
    // the runtime
    let err = svc.invoke("task", None).await.unwrap_err();
    assert!(matches!(err, EnsembleError::NotInitialized));
}

#[tokio::test]
async fn invoke_without_initialize_never_contacts_the_runtime() {
    let client = Arc::new(FakeAgentService::default());
    let runtime = Arc::new(FakeRuntime::ok());
    let mut svc = OrchestrationService::new(config(), client, runtime.clone());

    let err = svc.invoke("task", None).await.unwrap_err();
    assert!(matches!(err, EnsembleError::NotInitialized));
    assert_eq!(runtime.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn full_lifecycle_round_trip() {
    let client = Arc::new(FakeAgentService::default());
    let runtime = Arc::new(FakeRuntime::ok());
    let mut svc = OrchestrationService::new(config(), client.clone(), runtime);

    svc.initialize(&ids(&["asst_writer", "asst_critic"]))
        .await
        .unwrap();
    assert!(svc.is_initialized());

    let info = svc.agent_info();
    assert_eq!(info.len(), 2);
    assert_eq!(info[0].name, "agent-asst_writer");

    let answer = svc.invoke("draft the notes", None).await.unwrap();
    assert_eq!(answer, "answer to: draft the notes");

    svc.cleanup().await.unwrap();
    assert!(!svc.is_initialized());
    assert!(svc.agent_info().is_empty());
    assert_eq!(client.close_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sweep_cancels_stale_runs_before_the_next_invocation() {
    let client = Arc::new(FakeAgentService::default());
    let runtime = Arc::new(FakeRuntime::ok());
    let mut svc = OrchestrationService::new(config(), client.clone(), runtime);

    svc.initialize(&ids(&["a", "b"])).await.unwrap();

    // first invocation: no threads known yet, nothing to cancel
    svc.invoke("first", None).await.unwrap();
    assert_eq!(client.cancel_calls.load(Ordering::SeqCst), 0);

    // the hosting service now has threads for both members; leave one run
    // stuck in progress on agent a's thread
    client.add_run("thread-a", "run_stuck", RunStatus::InProgress);
    client.add_run("thread-a", "run_done", RunStatus::Completed);

    svc.invoke("second", None).await.unwrap();
    assert_eq!(client.cancel_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sweep_runs_again_after_a_failed_invocation() {
    let client = Arc::new(FakeAgentService::default());
    // one successful call to learn the member threads, then failures
    let runtime = Arc::new(FakeRuntime::with_ok_calls(1));
    let mut svc = OrchestrationService::new(config(), client.clone(), runtime);
    svc.initialize(&ids(&["a", "b"])).await.unwrap();
    svc.invoke("seed threads", None).await.unwrap();

    // every later invocation, failed or not, sweeps both known threads first
    let lists_before = client.list_calls.load(Ordering::SeqCst);
    let _ = svc.invoke("will fail", None).await.unwrap_err();
    assert_eq!(client.list_calls.load(Ordering::SeqCst), lists_before + 2);
    let _ = svc.invoke("will fail again", None).await.unwrap_err();
    assert_eq!(client.list_calls.load(Ordering::SeqCst), lists_before + 4);
}

#[tokio::test]
async fn cleanup_after_failed_initialization_is_safe() {
    let client = Arc::new(FakeAgentService::with_missing(&["asst_bad"]));
    let runtime = Arc::new(FakeRuntime::ok());
    let mut svc = OrchestrationService::new(config(), client, runtime);

    let _ = svc.initialize(&ids(&["asst_bad", "x"])).await.unwrap_err();
    svc.cleanup().await.unwrap();
    svc.cleanup().await.unwrap();
    assert!(!svc.is_initialized());
}

#[tokio::test]
async fn streaming_surface_wraps_success_and_failure() {
    let client = Arc::new(FakeAgentService::default());
    let mut svc = OrchestrationService::new(config(), client.clone(), Arc::new(FakeRuntime::ok()));
    svc.initialize(&ids(&["a", "b"])).await.unwrap();

    let chunks: Vec<String> = svc.invoke_stream("go", None).await.collect().await;
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].starts_with("data: "));
    assert!(chunks[0].contains("orchestration_result"));
    assert!(chunks[0].contains("answer to: go"));

    let mut failing =
        OrchestrationService::new(config(), client, Arc::new(FakeRuntime::failing()));
    failing.initialize(&ids(&["a", "b"])).await.unwrap();
    let chunks: Vec<String> = failing.invoke_stream("go", None).await.collect().await;
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].contains("\"type\":\"error\""));
    assert!(chunks[0].contains("runtime exploded"));
}

#[tokio::test]
async fn trace_context_reaches_the_runtime() {
    let client = Arc::new(FakeAgentService::default());
    let runtime = Arc::new(FakeRuntime::ok());
    let mut svc = OrchestrationService::new(config(), client, runtime.clone());
    svc.initialize(&ids(&["a", "b"])).await.unwrap();

    let carrier = HashMap::from([(
        "traceparent".to_string(),
        "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01".to_string(),
    )]);
    let trace = TraceContext::from_carrier(&carrier).unwrap();
    svc.invoke("traced task", Some(trace)).await.unwrap();

    let seen = runtime.seen_traceparents.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("00-0af76519"));
}
