use chrono::{DateTime, Utc};
use macro_core::{canonical_json, EntryType, JournalEntry, MacroError, MacroResult};
use pit_repository::MacroDb;
use sha2::{Digest, Sha256};
use sqlx::Row;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Input to `append`: everything about a decision except the fields the
/// journal itself is responsible for (`entry_id`, `content_hash`,
/// `created_at`, `is_locked`).
pub struct NewJournalEntry {
    pub parent_entry_id: Option<Uuid>,
    pub proposal_id: Option<Uuid>,
    pub entry_type: EntryType,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct DecisionStats {
    pub total_entries: usize,
    pub by_type: BTreeMap<String, usize>,
}

/// Append-only decision log backed by the `journal_entries` table. No
/// method here issues an UPDATE against that table — the only writes are
/// inserts, matching the "no update path exists" invariant structurally
/// rather than by convention.
pub struct DecisionJournal {
    db: MacroDb,
}

impl DecisionJournal {
    pub fn new(db: MacroDb) -> Self {
        Self { db }
    }

    /// Canonicalizes the payload, hashes it, locks it, and inserts it.
    /// Returns the new entry's id.
    pub async fn append(&self, input: NewJournalEntry) -> MacroResult<Uuid> {
        let entry_id = Uuid::new_v4();
        let canonical = canonical_json(&input.payload);
        let content_hash = hex::encode(Sha256::digest(canonical.as_bytes()));
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO journal_entries (entry_id, parent_entry_id, proposal_id, entry_type, payload_json, content_hash, created_at, is_locked)
             VALUES (?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(entry_id.to_string())
        .bind(input.parent_entry_id.map(|id| id.to_string()))
        .bind(input.proposal_id.map(|id| id.to_string()))
        .bind(entry_type_as_str(input.entry_type))
        .bind(input.payload.to_string())
        .bind(&content_hash)
        .bind(created_at.to_rfc3339())
        .execute(self.db.pool())
        .await
        .map_err(|e| MacroError::JournalWriteConflict(e.to_string()))?;

        Ok(entry_id)
    }

    /// Appends a new OUTCOME entry chained to `entry_id` via
    /// `parent_entry_id`. The original entry is never touched.
    pub async fn add_outcome(&self, entry_id: Uuid, outcome_payload: serde_json::Value) -> MacroResult<Uuid> {
        let parent = self.find_by_id(entry_id).await?.ok_or_else(|| MacroError::InvariantViolation(format!("journal entry {entry_id} not found")))?;
        self.append(NewJournalEntry {
            parent_entry_id: Some(entry_id),
            proposal_id: parent.proposal_id,
            entry_type: EntryType::Outcome,
            payload: outcome_payload,
        })
        .await
    }

    pub async fn find_by_id(&self, entry_id: Uuid) -> MacroResult<Option<JournalEntry>> {
        let row = sqlx::query("SELECT * FROM journal_entries WHERE entry_id = ?")
            .bind(entry_id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(sqlx_err)?;
        row.map(row_to_entry).transpose()
    }

    pub async fn find_by_proposal(&self, proposal_id: Uuid) -> MacroResult<Vec<JournalEntry>> {
        let rows = sqlx::query("SELECT * FROM journal_entries WHERE proposal_id = ? ORDER BY created_at ASC")
            .bind(proposal_id.to_string())
            .fetch_all(self.db.pool())
            .await
            .map_err(sqlx_err)?;
        rows.into_iter().map(row_to_entry).collect()
    }

    pub async fn find_by_type(&self, entry_type: EntryType) -> MacroResult<Vec<JournalEntry>> {
        let rows = sqlx::query("SELECT * FROM journal_entries WHERE entry_type = ? ORDER BY created_at ASC")
            .bind(entry_type_as_str(entry_type))
            .fetch_all(self.db.pool())
            .await
            .map_err(sqlx_err)?;
        rows.into_iter().map(row_to_entry).collect()
    }

    pub async fn stats_decision_analysis(&self) -> MacroResult<DecisionStats> {
        let rows = sqlx::query("SELECT entry_type, COUNT(*) as n FROM journal_entries GROUP BY entry_type")
            .fetch_all(self.db.pool())
            .await
            .map_err(sqlx_err)?;

        let mut by_type = BTreeMap::new();
        let mut total_entries = 0usize;
        for row in rows {
            let entry_type: String = row.try_get("entry_type").map_err(sqlx_err)?;
            let n: i64 = row.try_get("n").map_err(sqlx_err)?;
            total_entries += n as usize;
            by_type.insert(entry_type, n as usize);
        }

        Ok(DecisionStats { total_entries, by_type })
    }
}

fn entry_type_as_str(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::Approve => "APPROVE",
        EntryType::Reject => "REJECT",
        EntryType::Modify => "MODIFY",
        EntryType::OpenDiscretionary => "OPEN_DISCRETIONARY",
        EntryType::Close => "CLOSE",
        EntryType::Outcome => "OUTCOME",
    }
}

fn parse_entry_type(s: &str) -> MacroResult<EntryType> {
    match s {
        "APPROVE" => Ok(EntryType::Approve),
        "REJECT" => Ok(EntryType::Reject),
        "MODIFY" => Ok(EntryType::Modify),
        "OPEN_DISCRETIONARY" => Ok(EntryType::OpenDiscretionary),
        "CLOSE" => Ok(EntryType::Close),
        "OUTCOME" => Ok(EntryType::Outcome),
        other => Err(MacroError::InvariantViolation(format!("unknown entry_type '{other}'"))),
    }
}

fn row_to_entry(row: sqlx::sqlite::SqliteRow) -> MacroResult<JournalEntry> {
    let entry_id: String = row.try_get("entry_id").map_err(sqlx_err)?;
    let parent_entry_id: Option<String> = row.try_get("parent_entry_id").map_err(sqlx_err)?;
    let proposal_id: Option<String> = row.try_get("proposal_id").map_err(sqlx_err)?;
    let entry_type: String = row.try_get("entry_type").map_err(sqlx_err)?;
    let payload_json: String = row.try_get("payload_json").map_err(sqlx_err)?;
    let content_hash: String = row.try_get("content_hash").map_err(sqlx_err)?;
    let created_at: String = row.try_get("created_at").map_err(sqlx_err)?;
    let is_locked: i64 = row.try_get("is_locked").map_err(sqlx_err)?;

    Ok(JournalEntry {
        entry_id: Uuid::parse_str(&entry_id).map_err(parse_err)?,
        parent_entry_id: parent_entry_id.map(|s| Uuid::parse_str(&s)).transpose().map_err(parse_err)?,
        proposal_id: proposal_id.map(|s| Uuid::parse_str(&s)).transpose().map_err(parse_err)?,
        entry_type: parse_entry_type(&entry_type)?,
        payload: serde_json::from_str(&payload_json).map_err(|e| MacroError::InvariantViolation(e.to_string()))?,
        content_hash,
        created_at: DateTime::parse_from_rfc3339(&created_at).map_err(parse_err)?.with_timezone(&Utc),
        is_locked: is_locked != 0,
    })
}

fn sqlx_err(e: sqlx::Error) -> MacroError {
    MacroError::RepositoryUnavailable(e.to_string())
}

fn parse_err(e: impl std::fmt::Display) -> MacroError {
    MacroError::InvariantViolation(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup() -> DecisionJournal {
        let db = MacroDb::new("sqlite::memory:").await.unwrap();
        DecisionJournal::new(db)
    }

    #[tokio::test]
    async fn append_locks_and_hashes_payload() {
        let journal = setup().await;
        let payload = json!({"b": 1, "a": 2});
        let entry_id = journal
            .append(NewJournalEntry { parent_entry_id: None, proposal_id: None, entry_type: EntryType::Approve, payload: payload.clone() })
            .await
            .unwrap();

        let entry = journal.find_by_id(entry_id).await.unwrap().unwrap();
        assert!(entry.is_locked);
        assert_eq!(entry.content_hash.len(), 64);
        assert_eq!(entry.content_hash, hex::encode(Sha256::digest(canonical_json(&payload).as_bytes())));
    }

    #[tokio::test]
    async fn add_outcome_chains_without_mutating_original() {
        let journal = setup().await;
        let entry_id = journal
            .append(NewJournalEntry { parent_entry_id: None, proposal_id: None, entry_type: EntryType::Approve, payload: json!({"x": 1}) })
            .await
            .unwrap();

        let outcome_id = journal.add_outcome(entry_id, json!({"realized_pnl": 42.0})).await.unwrap();

        let original = journal.find_by_id(entry_id).await.unwrap().unwrap();
        let outcome = journal.find_by_id(outcome_id).await.unwrap().unwrap();
        assert_eq!(original.payload, json!({"x": 1}));
        assert_eq!(outcome.parent_entry_id, Some(entry_id));
        assert_eq!(outcome.entry_type, EntryType::Outcome);
    }

    #[tokio::test]
    async fn find_by_type_filters_correctly() {
        let journal = setup().await;
        journal.append(NewJournalEntry { parent_entry_id: None, proposal_id: None, entry_type: EntryType::Approve, payload: json!({}) }).await.unwrap();
        journal.append(NewJournalEntry { parent_entry_id: None, proposal_id: None, entry_type: EntryType::Reject, payload: json!({}) }).await.unwrap();

        let approvals = journal.find_by_type(EntryType::Approve).await.unwrap();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].entry_type, EntryType::Approve);
    }

    #[tokio::test]
    async fn stats_counts_by_type() {
        let journal = setup().await;
        journal.append(NewJournalEntry { parent_entry_id: None, proposal_id: None, entry_type: EntryType::Approve, payload: json!({}) }).await.unwrap();
        journal.append(NewJournalEntry { parent_entry_id: None, proposal_id: None, entry_type: EntryType::Approve, payload: json!({}) }).await.unwrap();
        journal.append(NewJournalEntry { parent_entry_id: None, proposal_id: None, entry_type: EntryType::Reject, payload: json!({}) }).await.unwrap();

        let stats = journal.stats_decision_analysis().await.unwrap();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.by_type.get("APPROVE").copied(), Some(2));
        assert_eq!(stats.by_type.get("REJECT").copied(), Some(1));
    }
}
