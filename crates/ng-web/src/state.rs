//! Application State

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use ng_chat::{Orchestrator, OrchestratorConfig, SessionStore, SharedSession, TraceLog};
use ng_core::AgentConfig;
use ng_llm::{provider_from_config, SharedProvider};
use ng_tools::Dispatcher;

/// Application state shared across all handlers
pub struct AppState {
    pub config: AgentConfig,
    pub sessions: SessionStore,
    pub orchestrator: Arc<Orchestrator>,
    /// Same ring buffer the orchestrator writes to
    pub traces: TraceLog,
    pub provider_name: String,
    pub start_time: Instant,
}

impl AppState {
    /// Build state with the provider selected by `config`
    pub fn new(config: AgentConfig) -> anyhow::Result<Self> {
        let provider = provider_from_config(&config)?;
        Ok(Self::with_provider(config, provider))
    }

    pub fn with_provider(config: AgentConfig, provider: SharedProvider) -> Self {
        let traces = TraceLog::new(config.trace_capacity);
        let provider_name = provider.provider_type().to_string();
        let orchestrator = Orchestrator::new(
            OrchestratorConfig::from_agent_config(&config),
            provider,
            Dispatcher::new(config.viewer_base_url.clone()),
            traces.clone(),
        );
        info!(
            "State ready: provider {}, viewer base {}",
            provider_name, config.viewer_base_url
        );
        Self {
            sessions: SessionStore::new(&config),
            orchestrator: Arc::new(orchestrator),
            traces,
            provider_name,
            start_time: Instant::now(),
            config,
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Session handle for an optional id; blank ids use the default session
    pub async fn session(&self, id: Option<&str>) -> SharedSession {
        let id = SessionStore::normalize_id(id);
        self.sessions.get_or_create(&id).await
    }
}
