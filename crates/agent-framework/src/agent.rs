use async_trait::async_trait;
use chrono::NaiveDate;
use macro_core::{AgentReport, MacroResult};

/// Object-safe entry point shared by all five macro agents, mirroring the
/// teacher's per-engine analyzer traits (`TechnicalAnalyzer::analyze`,
/// etc.) collapsed onto a single `run`. Each concrete agent's own
/// `load_data`/`compute_features`/`run_models` steps use that agent's own
/// typed bundle and feature-map types (from `macro-features`), which vary
/// per agent and so cannot themselves be object-safe trait methods; they
/// are inherent methods on the concrete agent, called from its `run` impl.
#[async_trait]
pub trait Agent: Send + Sync {
    fn agent_id(&self) -> &str;
    fn agent_name(&self) -> &str;

    /// Runs the full load -> features -> models -> narrative pipeline for
    /// one `as_of_date` and returns the resulting report.
    async fn run(&self, as_of_date: NaiveDate) -> MacroResult<AgentReport>;

    /// Same pipeline, used by the backtest engine replaying historical
    /// `as_of_date`s through the point-in-time loader. Distinct from `run`
    /// only in naming/vocabulary parity with the spec; the point-in-time
    /// discipline in the loader is what actually prevents lookahead.
    async fn backtest_run(&self, as_of_date: NaiveDate) -> MacroResult<AgentReport> {
        self.run(as_of_date).await
    }

    /// Renders a short, human-readable narrative from a completed report.
    /// Agents may override; the default just lists each signal's direction
    /// and confidence.
    fn generate_narrative(&self, report: &AgentReport) -> String {
        if report.is_stub {
            return format!("{} produced no report for {}.", self.agent_name(), report.as_of_date);
        }
        if report.signals.is_empty() {
            return format!("{} found no actionable signal for {}.", self.agent_name(), report.as_of_date);
        }
        let mut lines = Vec::new();
        for signal in &report.signals {
            lines.push(format!(
                "{}: {:?} (confidence {:.2}, {:?})",
                signal.signal_id, signal.direction, signal.confidence, signal.strength
            ));
        }
        lines.join("\n")
    }
}
