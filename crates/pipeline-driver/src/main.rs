//! pipeline-driver: runs the daily macro-agent pipeline end to end.
//!
//! Usage:
//!   pipeline-driver                          # as_of = today (UTC), db = macro.db
//!   pipeline-driver --as-of 2026-02-21
//!   pipeline-driver --db /path/to/macro.db --as-of 2026-02-21
//!
//! Exit codes: 0 on success, including runs where one or more agents
//! degraded to a stub report. Non-zero only when the repository connection
//! itself cannot be established at startup.

use agent_framework::AgentRegistry;
use chrono::{NaiveDate, Utc};
use decision_journal::DecisionJournal;
use macro_agents::{CrossAssetAgent, FiscalAgent, FxAgent, InflationAgent, MonetaryAgent};
use macro_core::AgentReport;
use pit_repository::{MacroDb, PointInTimeLoader, Repository, SqliteRepository};
use std::process::ExitCode;
use std::sync::Arc;
use trade_workflow::{TradeWorkflowService, WorkflowConfig};

struct PipelineOutcome {
    reports: Vec<AgentReport>,
    proposals_generated: usize,
    proposals_expired: u64,
}

async fn connect(database_url: &str) -> anyhow::Result<MacroDb> {
    use anyhow::Context;
    MacroDb::new(database_url).await.context("failed to obtain a repository connection")
}

/// Wires the repository, loader, all five agents, the registry, and the
/// trade workflow/journal, then runs one pipeline pass for `as_of_date`.
/// Anything that fails after the repository connects (an agent stub, a
/// workflow or journal error) is logged and folded into the outcome rather
/// than propagated, matching the exit-code contract: only the connection
/// in `connect` above is allowed to fail the process.
async fn run_pipeline(db: MacroDb, as_of_date: NaiveDate) -> PipelineOutcome {
    let repository: Arc<dyn Repository> = Arc::new(SqliteRepository::new(db.clone()));
    let loader = Arc::new(PointInTimeLoader::new(repository.clone()));

    let mut registry = AgentRegistry::new();
    registry.register(Arc::new(InflationAgent::new(loader.clone(), repository.clone())));
    registry.register(Arc::new(MonetaryAgent::new(loader.clone(), repository.clone())));
    registry.register(Arc::new(FiscalAgent::new(loader.clone(), repository.clone())));
    registry.register(Arc::new(FxAgent::new(loader.clone(), repository.clone())));
    registry.register(Arc::new(CrossAssetAgent::new(loader.clone(), repository.clone())));

    let reports = registry.run_all(as_of_date).await;
    for report in &reports {
        if report.is_stub {
            tracing::warn!(agent_id = %report.agent_id, "agent produced a stub report");
        }
    }

    let journal = DecisionJournal::new(db.clone());
    let workflow = TradeWorkflowService::new(db, journal, WorkflowConfig::default());

    let proposals_generated = match workflow.generate_proposals_from_signals(&reports, as_of_date).await {
        Ok(proposals) => {
            tracing::info!(count = proposals.len(), "generated trade proposals");
            proposals.len()
        }
        Err(err) => {
            tracing::error!(error = %err, "trade proposal generation failed");
            0
        }
    };

    let proposals_expired = match workflow.expire_stale_proposals(Utc::now(), None).await {
        Ok(count) => count,
        Err(err) => {
            tracing::error!(error = %err, "proposal expiry sweep failed");
            0
        }
    };

    PipelineOutcome { reports, proposals_generated, proposals_expired }
}

fn parse_args() -> (String, NaiveDate) {
    let args: Vec<String> = std::env::args().collect();

    let db_path = args
        .iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "macro.db".to_string());

    let as_of_date = args
        .iter()
        .position(|a| a == "--as-of")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive());

    (db_path, as_of_date)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "pipeline_driver=info,macro_agents=info".into()),
        )
        .init();

    let (db_path, as_of_date) = parse_args();
    let database_url = format!("sqlite:{db_path}?mode=rwc");

    let db = match connect(&database_url).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    let outcome = run_pipeline(db, as_of_date).await;
    let stub_count = outcome.reports.iter().filter(|r| r.is_stub).count();
    tracing::info!(
        as_of = %as_of_date,
        agents_run = outcome.reports.len(),
        stubs = stub_count,
        proposals_generated = outcome.proposals_generated,
        proposals_expired = outcome.proposals_expired,
        "pipeline run complete"
    );

    ExitCode::SUCCESS
}
