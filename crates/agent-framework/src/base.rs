use macro_core::{AgentReport, MacroResult};
use pit_repository::Repository;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Shared scaffolding for the five concrete agents: per-key try/catch data
/// loading that degrades to a data-quality flag instead of failing the
/// whole report, grounded in the teacher orchestrator's `Ok(...) => ...,
/// Err(e) => tracing::warn!(...)` fan-out for optional inputs; also owns
/// the post-run persistence call so every agent reports the same way.
pub struct BaseAgent {
    pub agent_id: String,
    pub agent_name: String,
    repository: Option<Arc<dyn Repository>>,
}

impl BaseAgent {
    pub fn new(agent_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self { agent_id: agent_id.into(), agent_name: agent_name.into(), repository: None }
    }

    pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Persists the finished report so downstream agents (cross-asset) and
    /// the trade workflow can read it back. A persistence failure is logged
    /// and swallowed — it must never fail the agent run that produced the
    /// signals in the first place.
    pub async fn persist(&self, report: &AgentReport) {
        let Some(repository) = &self.repository else { return };
        if let Err(err) = repository.upsert_agent_report(report).await {
            tracing::warn!(agent_id = %self.agent_id, error = %err, "failed to persist agent report");
        }
    }

    /// Unwraps a loader result, logging and flagging data-quality on failure
    /// rather than propagating. `key` identifies the series for the flag
    /// and the log line (e.g. `"usdbrl_daily"`).
    pub fn safe_load<T>(&self, key: &str, result: MacroResult<T>, flags: &mut BTreeSet<String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(agent_id = %self.agent_id, series = key, error = %err, "data source unavailable, degrading");
                flags.insert(format!("{key}_unavailable"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macro_core::MacroError;

    #[test]
    fn safe_load_ok_passes_through() {
        let base = BaseAgent::new("fx_agent", "FX Agent");
        let mut flags = BTreeSet::new();
        let value = base.safe_load("usdbrl_daily", Ok::<_, MacroError>(42), &mut flags);
        assert_eq!(value, Some(42));
        assert!(flags.is_empty());
    }

    #[test]
    fn safe_load_err_flags_and_degrades_to_none() {
        let base = BaseAgent::new("fx_agent", "FX Agent");
        let mut flags = BTreeSet::new();
        let value = base.safe_load("usdbrl_daily", Err(MacroError::RepositoryUnavailable("down".into())), &mut flags);
        assert_eq!(value, None);
        assert!(flags.contains("usdbrl_daily_unavailable"));
    }
}
