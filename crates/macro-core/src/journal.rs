use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Approve,
    Reject,
    Modify,
    OpenDiscretionary,
    Close,
    Outcome,
}

/// Append-only decision record. `content_hash` is the SHA-256 of the
/// canonical-JSON encoding of `payload` alone (not this envelope); computed
/// by the journal service at append time via [`crate::canonical::canonical_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: Uuid,
    pub parent_entry_id: Option<Uuid>,
    pub proposal_id: Option<Uuid>,
    pub entry_type: EntryType,
    pub payload: serde_json::Value,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub is_locked: bool,
}
