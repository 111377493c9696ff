use crate::agent::Agent;
use chrono::NaiveDate;
use macro_core::AgentReport;
use std::sync::Arc;
use std::time::Duration;

/// Locked execution order: cross-asset runs last because it consumes the
/// other four agents' composite signals.
pub const EXECUTION_ORDER: [&str; 5] = ["inflation_agent", "monetary_agent", "fiscal_agent", "fx_agent", "cross_asset_agent"];

/// Per-agent wall-clock budget before the registry gives up and emits a
/// stub report instead of blocking the whole pipeline run.
pub const AGENT_WALL_CLOCK_BUDGET_SECONDS: u64 = 30;

/// Holds the registered agents and runs them in the locked order, isolating
/// each agent's errors/timeouts/panics so one bad agent degrades to a stub
/// report rather than aborting the run. Not a singleton (redesigned away
/// from a process-global registry): the driver constructs one explicitly
/// and threads it through.
pub struct AgentRegistry {
    agents: Vec<Arc<dyn Agent>>,
    wall_clock_budget: Duration,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self { agents: Vec::new(), wall_clock_budget: Duration::from_secs(AGENT_WALL_CLOCK_BUDGET_SECONDS) }
    }

    pub fn with_wall_clock_budget(mut self, budget: Duration) -> Self {
        self.wall_clock_budget = budget;
        self
    }

    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        self.agents.push(agent);
    }

    pub fn unregister(&mut self, agent_id: &str) {
        self.agents.retain(|a| a.agent_id() != agent_id);
    }

    pub fn get(&self, agent_id: &str) -> Option<Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.agent_id() == agent_id).cloned()
    }

    /// Registered agent ids in the locked execution order (unregistered ids
    /// skipped); any registered agent whose id isn't one of the five named
    /// in `EXECUTION_ORDER` is appended afterward, alphabetically.
    pub fn list_ordered(&self) -> Vec<&str> {
        let mut ordered: Vec<&str> = EXECUTION_ORDER
            .iter()
            .filter(|id| self.agents.iter().any(|a| a.agent_id() == **id))
            .copied()
            .collect();

        let mut extra: Vec<&str> = self
            .agents
            .iter()
            .map(|a| a.agent_id())
            .filter(|id| !EXECUTION_ORDER.contains(id))
            .collect();
        extra.sort_unstable();
        ordered.extend(extra);
        ordered
    }

    pub fn clear(&mut self) {
        self.agents.clear();
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Runs one agent under a wall-clock budget with panic isolation.
    /// `tokio::spawn` gives panic isolation for free (a panicking task
    /// surfaces as `Err(JoinError)` to the caller instead of aborting the
    /// process); wrapping the `JoinHandle` in `timeout` adds the budget.
    async fn run_one(&self, agent_id: &str, as_of_date: NaiveDate, backtest: bool) -> AgentReport {
        let Some(agent) = self.get(agent_id) else {
            return AgentReport::stub(agent_id, as_of_date, "not_registered");
        };

        let handle = tokio::spawn(async move {
            if backtest { agent.backtest_run(as_of_date).await } else { agent.run(as_of_date).await }
        });

        match tokio::time::timeout(self.wall_clock_budget, handle).await {
            Ok(Ok(Ok(report))) => report,
            Ok(Ok(Err(err))) => {
                tracing::warn!(agent_id, error = %err, "agent run failed, emitting stub report");
                AgentReport::stub(agent_id, as_of_date, format!("error: {err}"))
            }
            Ok(Err(join_err)) => {
                tracing::warn!(agent_id, error = %join_err, "agent panicked, emitting stub report");
                AgentReport::stub(agent_id, as_of_date, "panic")
            }
            Err(_elapsed) => {
                tracing::warn!(agent_id, budget_secs = self.wall_clock_budget.as_secs(), "agent exceeded wall-clock budget");
                AgentReport::stub(agent_id, as_of_date, "timeout")
            }
        }
    }

    pub async fn run_all(&self, as_of_date: NaiveDate) -> Vec<AgentReport> {
        let mut reports = Vec::with_capacity(self.agents.len());
        for agent_id in self.list_ordered() {
            reports.push(self.run_one(agent_id, as_of_date, false).await);
        }
        reports
    }

    pub async fn run_all_backtest(&self, as_of_date: NaiveDate) -> Vec<AgentReport> {
        let mut reports = Vec::with_capacity(self.agents.len());
        for agent_id in self.list_ordered() {
            reports.push(self.run_one(agent_id, as_of_date, true).await);
        }
        reports
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use macro_core::{MacroError, MacroResult};

    struct AlwaysOkAgent;
    #[async_trait]
    impl Agent for AlwaysOkAgent {
        fn agent_id(&self) -> &str {
            "inflation_agent"
        }
        fn agent_name(&self) -> &str {
            "Inflation"
        }
        async fn run(&self, as_of_date: NaiveDate) -> MacroResult<AgentReport> {
            Ok(AgentReport::empty(self.agent_id(), as_of_date))
        }
    }

    struct AlwaysErrAgent;
    #[async_trait]
    impl Agent for AlwaysErrAgent {
        fn agent_id(&self) -> &str {
            "monetary_agent"
        }
        fn agent_name(&self) -> &str {
            "Monetary"
        }
        async fn run(&self, _as_of_date: NaiveDate) -> MacroResult<AgentReport> {
            Err(MacroError::RepositoryUnavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn run_all_follows_locked_order_and_isolates_errors() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(AlwaysErrAgent));
        registry.register(Arc::new(AlwaysOkAgent));

        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        assert_eq!(registry.list_ordered(), vec!["inflation_agent", "monetary_agent"]);

        let reports = registry.run_all(as_of).await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].agent_id, "inflation_agent");
        assert!(!reports[0].is_stub);
        assert_eq!(reports[1].agent_id, "monetary_agent");
        assert!(reports[1].is_stub);
    }

    #[tokio::test]
    async fn unregistered_agent_id_is_silently_absent_from_ordering() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(AlwaysOkAgent));
        assert_eq!(registry.list_ordered(), vec!["inflation_agent"]);
        registry.unregister("inflation_agent");
        assert!(registry.list_ordered().is_empty());
        assert!(registry.is_empty());
    }
}
