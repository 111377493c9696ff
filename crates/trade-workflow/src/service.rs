use chrono::{DateTime, NaiveDate, Utc};
use decision_journal::{DecisionJournal, NewJournalEntry};
use macro_core::{
    AgentReport, AgentSignal, EntryType, MacroError, MacroResult, ProposalStatus, SignalDirection, TradeProposal,
    CONVICTION_MIN, FLIP_THRESHOLD, MAX_PROPOSALS_PER_DAY,
};
use pit_repository::MacroDb;
use serde_json::json;
use sqlx::Row;
use uuid::Uuid;

/// Per-strategy cap on the magnitude of `target_weight` a signal-driven
/// proposal may request; not locked by name in the source material but
/// required by the proposal invariant `|target_weight| <= per-strategy cap`.
pub const PER_STRATEGY_CAP: f64 = 0.10;

/// Maps an agent's composite to the instrument its trade expresses —
/// the core only reasons about directional macro signals, not a full
/// instrument universe, so each agent is wired to one representative
/// tradable proxy.
const INSTRUMENT_BY_AGENT: &[(&str, &str)] = &[
    ("fx_agent", "USDBRL"),
    ("fiscal_agent", "BR_SOVEREIGN_5Y"),
    ("monetary_agent", "BR_RATES_FRONT_END"),
    ("inflation_agent", "BR_INFLATION_LINKED_BOND"),
    ("cross_asset_agent", "BR_CROSS_ASSET_BASKET"),
];

fn instrument_for_agent(agent_id: &str) -> String {
    INSTRUMENT_BY_AGENT
        .iter()
        .find(|(id, _)| *id == agent_id)
        .map(|(_, instrument)| instrument.to_string())
        .unwrap_or_else(|| agent_id.to_uppercase())
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Proposals older than this are bulk-expired by `expire_stale_proposals`.
    /// The source material leaves the exact value unspecified and suggests
    /// 2 business days; this counts plain calendar days since no trading
    /// calendar is modeled elsewhere in this codebase.
    pub proposal_ttl_days: i64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self { proposal_ttl_days: 2 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProposalModification {
    pub target_weight: Option<f64>,
    pub direction: Option<SignalDirection>,
}

pub struct TradeWorkflowService {
    db: MacroDb,
    journal: DecisionJournal,
    config: WorkflowConfig,
}

impl TradeWorkflowService {
    pub fn new(db: MacroDb, journal: DecisionJournal, config: WorkflowConfig) -> Self {
        Self { db, journal, config }
    }

    /// Filters each report's composite by conviction and direction, detects
    /// flips against open positions, and inserts up to the day's remaining
    /// proposal slots (flips first, then by descending confidence).
    pub async fn generate_proposals_from_signals(&self, reports: &[AgentReport], as_of_date: NaiveDate) -> MacroResult<Vec<TradeProposal>> {
        let existing_pending = self.get_pending_proposals().await?.len();
        let slots = MAX_PROPOSALS_PER_DAY.saturating_sub(existing_pending);
        if slots == 0 {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<TradeProposal> = Vec::new();
        for report in reports {
            if report.as_of_date != as_of_date {
                continue;
            }
            let Some(composite) = report.composite() else { continue };
            if composite.is_no_signal() || composite.direction == SignalDirection::Neutral || composite.confidence < CONVICTION_MIN {
                continue;
            }

            let instrument_id = instrument_for_agent(&report.agent_id);
            let open_position = self.get_open_position(&instrument_id).await?;
            let is_flip = open_position
                .as_ref()
                .map(|(direction, _)| *direction != composite.direction && composite.confidence >= FLIP_THRESHOLD)
                .unwrap_or(false);

            let sign = match composite.direction {
                SignalDirection::Long => 1.0,
                SignalDirection::Short => -1.0,
                SignalDirection::Neutral => 0.0,
            };
            let target_weight = (sign * composite.confidence * PER_STRATEGY_CAP).clamp(-PER_STRATEGY_CAP, PER_STRATEGY_CAP);

            candidates.push(TradeProposal {
                proposal_id: Uuid::new_v4(),
                source_signal_id: Some(composite.signal_id.clone()),
                instrument_id,
                direction: composite.direction,
                target_weight,
                rationale: self.generate_trade_rationale(composite),
                status: ProposalStatus::Pending,
                conviction: composite.confidence,
                created_at: Utc::now(),
                decided_at: None,
                flip_of_instrument: if is_flip { open_position.map(|(_, instrument)| instrument) } else { None },
            });
        }

        candidates.sort_by(|a, b| {
            b.flip_of_instrument.is_some().cmp(&a.flip_of_instrument.is_some()).then(b.conviction.partial_cmp(&a.conviction).unwrap_or(std::cmp::Ordering::Equal))
        });
        candidates.truncate(slots);

        for proposal in &candidates {
            self.insert_proposal(proposal).await?;
        }

        Ok(candidates)
    }

    pub async fn get_pending_proposals(&self) -> MacroResult<Vec<TradeProposal>> {
        let rows = sqlx::query("SELECT * FROM trade_proposals WHERE status = 'PENDING' ORDER BY created_at ASC")
            .fetch_all(self.db.pool())
            .await
            .map_err(sqlx_err)?;
        rows.into_iter().map(row_to_proposal).collect()
    }

    pub async fn approve_proposal(&self, proposal_id: Uuid, approver: &str) -> MacroResult<Uuid> {
        let proposal = self.require_pending(proposal_id).await?;
        self.transition(&proposal, ProposalStatus::Approved).await?;
        self.journal
            .append(NewJournalEntry {
                parent_entry_id: None,
                proposal_id: Some(proposal_id),
                entry_type: EntryType::Approve,
                payload: json!({"proposal_id": proposal_id, "approver": approver, "instrument_id": proposal.instrument_id, "target_weight": proposal.target_weight}),
            })
            .await
    }

    pub async fn reject_proposal(&self, proposal_id: Uuid, reason: &str) -> MacroResult<Uuid> {
        let proposal = self.require_pending(proposal_id).await?;
        self.transition(&proposal, ProposalStatus::Rejected).await?;
        self.journal
            .append(NewJournalEntry {
                parent_entry_id: None,
                proposal_id: Some(proposal_id),
                entry_type: EntryType::Reject,
                payload: json!({"proposal_id": proposal_id, "reason": reason}),
            })
            .await
    }

    pub async fn modify_and_approve_proposal(&self, proposal_id: Uuid, modifications: ProposalModification, approver: &str) -> MacroResult<Uuid> {
        let proposal = self.require_pending(proposal_id).await?;
        let mut modified = proposal.clone();
        if let Some(weight) = modifications.target_weight {
            modified.target_weight = weight.clamp(-PER_STRATEGY_CAP, PER_STRATEGY_CAP);
        }
        if let Some(direction) = modifications.direction {
            modified.direction = direction;
        }
        self.transition(&modified, ProposalStatus::ModifiedApproved).await?;
        self.journal
            .append(NewJournalEntry {
                parent_entry_id: None,
                proposal_id: Some(proposal_id),
                entry_type: EntryType::Modify,
                payload: json!({"proposal_id": proposal_id, "approver": approver, "original": proposal_payload(&proposal), "modified": proposal_payload(&modified)}),
            })
            .await
    }

    pub async fn open_discretionary_trade(&self, instrument: &str, direction: SignalDirection, size: f64, manager_thesis: &str) -> MacroResult<Uuid> {
        if manager_thesis.trim().is_empty() {
            return Err(MacroError::InvariantViolation("manager_thesis must not be empty or whitespace-only".to_string()));
        }

        let proposal = TradeProposal {
            proposal_id: Uuid::new_v4(),
            source_signal_id: None,
            instrument_id: instrument.to_string(),
            direction,
            target_weight: size.clamp(-PER_STRATEGY_CAP, PER_STRATEGY_CAP),
            rationale: manager_thesis.to_string(),
            status: ProposalStatus::Approved,
            conviction: 1.0,
            created_at: Utc::now(),
            decided_at: Some(Utc::now()),
            flip_of_instrument: None,
        };
        self.insert_proposal(&proposal).await?;
        self.open_position(&proposal).await?;

        self.journal
            .append(NewJournalEntry {
                parent_entry_id: None,
                proposal_id: Some(proposal.proposal_id),
                entry_type: EntryType::OpenDiscretionary,
                payload: json!({"proposal_id": proposal.proposal_id, "instrument_id": instrument, "direction": format!("{:?}", direction).to_uppercase(), "size": size, "manager_thesis": manager_thesis}),
            })
            .await
    }

    pub async fn close_position(&self, position_id: &str, rationale: &str) -> MacroResult<Uuid> {
        let row = sqlx::query("SELECT source_proposal_id FROM open_positions WHERE instrument_id = ?")
            .bind(position_id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(sqlx_err)?;
        let source_proposal_id: Option<String> = match &row {
            Some(r) => r.try_get("source_proposal_id").map_err(sqlx_err)?,
            None => None,
        };
        let proposal_id = source_proposal_id.map(|s| Uuid::parse_str(&s)).transpose().map_err(|e| MacroError::InvariantViolation(e.to_string()))?;

        sqlx::query("DELETE FROM open_positions WHERE instrument_id = ?").bind(position_id).execute(self.db.pool()).await.map_err(sqlx_err)?;

        self.journal
            .append(NewJournalEntry {
                parent_entry_id: None,
                proposal_id,
                entry_type: EntryType::Close,
                payload: json!({"instrument_id": position_id, "rationale": rationale}),
            })
            .await
    }

    /// Bulk-marks stale PENDING proposals as EXPIRED. No journal entry is
    /// written for expiry, per spec.
    pub async fn expire_stale_proposals(&self, as_of: DateTime<Utc>, ttl_days: Option<i64>) -> MacroResult<u64> {
        let ttl = ttl_days.unwrap_or(self.config.proposal_ttl_days);
        let cutoff = as_of - chrono::Duration::days(ttl);
        let result = sqlx::query("UPDATE trade_proposals SET status = 'EXPIRED' WHERE status = 'PENDING' AND created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(self.db.pool())
            .await
            .map_err(sqlx_err)?;
        Ok(result.rows_affected())
    }

    fn generate_trade_rationale(&self, signal: &AgentSignal) -> String {
        format!(
            "{} fired {:?} at confidence {:.2} (value {:.4}, horizon {}d)",
            signal.signal_id, signal.direction, signal.confidence, signal.value, signal.horizon_days
        )
    }

    #[allow(dead_code)]
    fn estimate_portfolio_impact(&self, proposal: &TradeProposal) -> serde_json::Value {
        json!({
            "proposal_id": proposal.proposal_id,
            "target_weight": proposal.target_weight,
            "estimated_turnover": proposal.target_weight.abs(),
        })
    }

    async fn require_pending(&self, proposal_id: Uuid) -> MacroResult<TradeProposal> {
        let row = sqlx::query("SELECT * FROM trade_proposals WHERE proposal_id = ?")
            .bind(proposal_id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(sqlx_err)?;
        let Some(row) = row else { return Err(MacroError::InvariantViolation(format!("proposal {proposal_id} not found"))) };
        let proposal = row_to_proposal(row)?;
        if proposal.status != ProposalStatus::Pending {
            return Err(MacroError::InvariantViolation(format!("proposal {proposal_id} already decided ({:?})", proposal.status)));
        }
        Ok(proposal)
    }

    async fn transition(&self, proposal: &TradeProposal, status: ProposalStatus) -> MacroResult<()> {
        sqlx::query("UPDATE trade_proposals SET status = ?, direction = ?, target_weight = ?, decided_at = ? WHERE proposal_id = ?")
            .bind(status_as_str(status))
            .bind(direction_as_str(proposal.direction))
            .bind(proposal.target_weight)
            .bind(Utc::now().to_rfc3339())
            .bind(proposal.proposal_id.to_string())
            .execute(self.db.pool())
            .await
            .map_err(sqlx_err)?;
        Ok(())
    }

    async fn insert_proposal(&self, proposal: &TradeProposal) -> MacroResult<()> {
        sqlx::query(
            "INSERT INTO trade_proposals (proposal_id, source_signal_id, instrument_id, direction, target_weight, rationale, status, conviction, created_at, decided_at, flip_of_instrument)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(proposal.proposal_id.to_string())
        .bind(&proposal.source_signal_id)
        .bind(&proposal.instrument_id)
        .bind(direction_as_str(proposal.direction))
        .bind(proposal.target_weight)
        .bind(&proposal.rationale)
        .bind(status_as_str(proposal.status))
        .bind(proposal.conviction)
        .bind(proposal.created_at.to_rfc3339())
        .bind(proposal.decided_at.map(|d| d.to_rfc3339()))
        .bind(&proposal.flip_of_instrument)
        .execute(self.db.pool())
        .await
        .map_err(sqlx_err)?;
        Ok(())
    }

    async fn open_position(&self, proposal: &TradeProposal) -> MacroResult<()> {
        sqlx::query(
            "INSERT INTO open_positions (instrument_id, direction, target_weight, opened_at, source_proposal_id)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(instrument_id) DO UPDATE SET direction = excluded.direction, target_weight = excluded.target_weight, opened_at = excluded.opened_at, source_proposal_id = excluded.source_proposal_id",
        )
        .bind(&proposal.instrument_id)
        .bind(direction_as_str(proposal.direction))
        .bind(proposal.target_weight)
        .bind(Utc::now().to_rfc3339())
        .bind(proposal.proposal_id.to_string())
        .execute(self.db.pool())
        .await
        .map_err(sqlx_err)?;
        Ok(())
    }

    async fn get_open_position(&self, instrument_id: &str) -> MacroResult<Option<(SignalDirection, String)>> {
        let row = sqlx::query("SELECT direction FROM open_positions WHERE instrument_id = ?")
            .bind(instrument_id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(sqlx_err)?;
        let Some(row) = row else { return Ok(None) };
        let direction: String = row.try_get("direction").map_err(sqlx_err)?;
        Ok(Some((parse_direction(&direction)?, instrument_id.to_string())))
    }
}

fn proposal_payload(proposal: &TradeProposal) -> serde_json::Value {
    json!({
        "direction": format!("{:?}", proposal.direction).to_uppercase(),
        "target_weight": proposal.target_weight,
        "status": format!("{:?}", proposal.status).to_uppercase(),
    })
}

fn status_as_str(status: ProposalStatus) -> &'static str {
    match status {
        ProposalStatus::Pending => "PENDING",
        ProposalStatus::Approved => "APPROVED",
        ProposalStatus::Rejected => "REJECTED",
        ProposalStatus::ModifiedApproved => "MODIFIED_APPROVED",
        ProposalStatus::Expired => "EXPIRED",
    }
}

fn parse_status(s: &str) -> MacroResult<ProposalStatus> {
    match s {
        "PENDING" => Ok(ProposalStatus::Pending),
        "APPROVED" => Ok(ProposalStatus::Approved),
        "REJECTED" => Ok(ProposalStatus::Rejected),
        "MODIFIED_APPROVED" => Ok(ProposalStatus::ModifiedApproved),
        "EXPIRED" => Ok(ProposalStatus::Expired),
        other => Err(MacroError::InvariantViolation(format!("unknown proposal status '{other}'"))),
    }
}

fn direction_as_str(direction: SignalDirection) -> &'static str {
    match direction {
        SignalDirection::Long => "LONG",
        SignalDirection::Short => "SHORT",
        SignalDirection::Neutral => "NEUTRAL",
    }
}

fn parse_direction(s: &str) -> MacroResult<SignalDirection> {
    match s {
        "LONG" => Ok(SignalDirection::Long),
        "SHORT" => Ok(SignalDirection::Short),
        "NEUTRAL" => Ok(SignalDirection::Neutral),
        other => Err(MacroError::InvariantViolation(format!("unknown direction '{other}'"))),
    }
}

fn row_to_proposal(row: sqlx::sqlite::SqliteRow) -> MacroResult<TradeProposal> {
    let proposal_id: String = row.try_get("proposal_id").map_err(sqlx_err)?;
    let source_signal_id: Option<String> = row.try_get("source_signal_id").map_err(sqlx_err)?;
    let instrument_id: String = row.try_get("instrument_id").map_err(sqlx_err)?;
    let direction: String = row.try_get("direction").map_err(sqlx_err)?;
    let target_weight: f64 = row.try_get("target_weight").map_err(sqlx_err)?;
    let rationale: String = row.try_get("rationale").map_err(sqlx_err)?;
    let status: String = row.try_get("status").map_err(sqlx_err)?;
    let conviction: f64 = row.try_get("conviction").map_err(sqlx_err)?;
    let created_at: String = row.try_get("created_at").map_err(sqlx_err)?;
    let decided_at: Option<String> = row.try_get("decided_at").map_err(sqlx_err)?;
    let flip_of_instrument: Option<String> = row.try_get("flip_of_instrument").map_err(sqlx_err)?;

    Ok(TradeProposal {
        proposal_id: Uuid::parse_str(&proposal_id).map_err(|e| MacroError::InvariantViolation(e.to_string()))?,
        source_signal_id,
        instrument_id,
        direction: parse_direction(&direction)?,
        target_weight,
        rationale,
        status: parse_status(&status)?,
        conviction,
        created_at: DateTime::parse_from_rfc3339(&created_at).map_err(|e| MacroError::InvariantViolation(e.to_string()))?.with_timezone(&Utc),
        decided_at: decided_at
            .map(|d| DateTime::parse_from_rfc3339(&d).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| MacroError::InvariantViolation(e.to_string()))?,
        flip_of_instrument,
    })
}

fn sqlx_err(e: sqlx::Error) -> MacroError {
    MacroError::RepositoryUnavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    async fn setup() -> TradeWorkflowService {
        let db = MacroDb::new("sqlite::memory:").await.unwrap();
        let journal = DecisionJournal::new(db.clone());
        TradeWorkflowService::new(db, journal, WorkflowConfig::default())
    }

    fn composite_report(agent_id: &str, direction: SignalDirection, confidence: f64) -> AgentReport {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let composite = AgentSignal::directional(format!("{}_COMPOSITE", agent_id.to_uppercase()), agent_id, as_of, direction, confidence, confidence, 90, BTreeMap::new());
        let mut report = AgentReport::empty(agent_id, as_of);
        report.signals = vec![composite];
        report
    }

    #[tokio::test]
    async fn low_conviction_composite_generates_no_proposal() {
        let service = setup().await;
        let reports = vec![composite_report("fx_agent", SignalDirection::Long, 0.40)];
        let proposals = service.generate_proposals_from_signals(&reports, NaiveDate::from_ymd_opt(2026, 2, 21).unwrap()).await.unwrap();
        assert!(proposals.is_empty());
    }

    #[tokio::test]
    async fn high_conviction_composite_generates_proposal() {
        let service = setup().await;
        let reports = vec![composite_report("fx_agent", SignalDirection::Short, 0.70)];
        let proposals = service.generate_proposals_from_signals(&reports, NaiveDate::from_ymd_opt(2026, 2, 21).unwrap()).await.unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].direction, SignalDirection::Short);
        assert!(proposals[0].conviction >= CONVICTION_MIN);
    }

    #[tokio::test]
    async fn approve_then_reapprove_fails() {
        let service = setup().await;
        let reports = vec![composite_report("fx_agent", SignalDirection::Long, 0.70)];
        let proposals = service.generate_proposals_from_signals(&reports, NaiveDate::from_ymd_opt(2026, 2, 21).unwrap()).await.unwrap();
        let id = proposals[0].proposal_id;

        service.approve_proposal(id, "alice").await.unwrap();
        let err = service.approve_proposal(id, "alice").await.unwrap_err();
        assert!(matches!(err, MacroError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn open_discretionary_trade_rejects_blank_thesis() {
        let service = setup().await;
        let err = service.open_discretionary_trade("USDBRL", SignalDirection::Long, 0.05, "   ").await.unwrap_err();
        assert!(matches!(err, MacroError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn open_discretionary_trade_with_thesis_creates_open_position() {
        let service = setup().await;
        let entry_id = service.open_discretionary_trade("USDBRL", SignalDirection::Long, 0.05, "manual override on CB signal").await.unwrap();
        let entries = service.journal.find_by_type(EntryType::OpenDiscretionary).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_id, entry_id);
    }
}
