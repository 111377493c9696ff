use crate::signal::SignalDirection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Locked conviction floor a proposal must meet at creation (`CONVICTION_MIN`).
pub const CONVICTION_MIN: f64 = 0.55;

/// Locked cap on pending proposals per day (`MAX_PROPOSALS_PER_DAY`).
pub const MAX_PROPOSALS_PER_DAY: usize = 5;

/// Locked confidence required to flip an existing open position (`FLIP_THRESHOLD`).
pub const FLIP_THRESHOLD: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
    ModifiedApproved,
    Expired,
}

/// Generated from a signal that passes conviction filtering, or opened
/// directly as a discretionary trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeProposal {
    pub proposal_id: Uuid,
    pub source_signal_id: Option<String>,
    pub instrument_id: String,
    pub direction: SignalDirection,
    pub target_weight: f64,
    pub rationale: String,
    pub status: ProposalStatus,
    pub conviction: f64,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    /// Set when this proposal is prioritized as a flip against an open position.
    pub flip_of_instrument: Option<String>,
}

impl TradeProposal {
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, ProposalStatus::Pending)
    }
}
