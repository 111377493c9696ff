use crate::signal::AgentSignal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregated output of one agent for one `as_of_date`.
///
/// Invariant: when non-empty and the agent is a multi-signal agent, the
/// last entry of `signals` is the composite (its `signal_id` ends in
/// `_COMPOSITE`). Stub reports (timeout/error isolation) carry no signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    pub agent_id: String,
    pub as_of_date: NaiveDate,
    pub signals: Vec<AgentSignal>,
    pub narrative: Option<String>,
    pub diagnostics: BTreeMap<String, serde_json::Value>,
    pub data_quality_flags: BTreeSet<String>,
    pub is_stub: bool,
}

impl AgentReport {
    pub fn empty(agent_id: impl Into<String>, as_of_date: NaiveDate) -> Self {
        Self {
            agent_id: agent_id.into(),
            as_of_date,
            signals: Vec::new(),
            narrative: None,
            diagnostics: BTreeMap::new(),
            data_quality_flags: BTreeSet::new(),
            is_stub: false,
        }
    }

    /// A stub report produced by the registry when an agent errors or times out.
    pub fn stub(agent_id: impl Into<String>, as_of_date: NaiveDate, reason: impl Into<String>) -> Self {
        let mut diagnostics = BTreeMap::new();
        diagnostics.insert(
            "stub_reason".to_string(),
            serde_json::Value::String(reason.into()),
        );
        Self {
            agent_id: agent_id.into(),
            as_of_date,
            signals: Vec::new(),
            narrative: None,
            diagnostics,
            data_quality_flags: BTreeSet::new(),
            is_stub: true,
        }
    }

    /// The composite signal, if this report has one (always the last signal,
    /// by construction of `run_models`).
    pub fn composite(&self) -> Option<&AgentSignal> {
        self.signals.last().filter(|s| s.signal_id.ends_with("_COMPOSITE"))
    }
}
