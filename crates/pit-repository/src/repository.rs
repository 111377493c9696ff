use crate::db::MacroDb;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use macro_core::{AgentReport, CurvePoint, CurveType, FiscalRecord, FlowRecord, MacroError, MacroResult, MarketBar, Observation};
use sqlx::Row;

/// Typed queries backing the point-in-time loader (§6.1). Implementations
/// are free to back this with any storage; `SqliteRepository` is the one
/// shipped here. All methods are read-only except `upsert_agent_report`,
/// whose natural key is `(agent_id, as_of_date)` with replace-on-conflict.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn query_macro_observations(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of_time: DateTime<Utc>,
    ) -> MacroResult<Vec<Observation>>;

    async fn query_market_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of_time: DateTime<Utc>,
    ) -> MacroResult<Vec<MarketBar>>;

    async fn query_flow_observations(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of_time: DateTime<Utc>,
    ) -> MacroResult<Vec<FlowRecord>>;

    async fn query_fiscal_observations(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of_time: DateTime<Utc>,
    ) -> MacroResult<Vec<FiscalRecord>>;

    async fn query_curve_points(&self, curve_id: &str, curve_date: NaiveDate) -> MacroResult<Vec<CurvePoint>>;

    async fn query_curve_history(
        &self,
        curve_id: &str,
        tenor_days: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> MacroResult<Vec<(NaiveDate, f64)>>;

    async fn upsert_agent_report(&self, report: &AgentReport) -> MacroResult<()>;

    /// Reads back a previously persisted report for `(agent_id, as_of_date)`,
    /// `None` if that agent hasn't run yet for this date. Used by the
    /// cross-asset agent to consume the other four agents' composites.
    async fn query_agent_report(&self, agent_id: &str, as_of_date: NaiveDate) -> MacroResult<Option<AgentReport>>;
}

pub struct SqliteRepository {
    db: MacroDb,
}

impl SqliteRepository {
    pub fn new(db: MacroDb) -> Self {
        Self { db }
    }

    /// Among rows sharing `(key, observation_date)`, keep only the one with
    /// the maximal `revision_number` whose `release_time <= as_of_time` —
    /// the vintage visible at that moment. Rows with no qualifying revision
    /// are dropped, never surfaced as an error.
    fn select_vintage<T: Clone>(
        rows: Vec<(NaiveDate, u32, DateTime<Utc>, T)>,
        as_of_time: DateTime<Utc>,
    ) -> Vec<(NaiveDate, T)> {
        use std::collections::BTreeMap;
        let mut best: BTreeMap<NaiveDate, (u32, T)> = BTreeMap::new();
        for (obs_date, revision, release_time, value) in rows {
            if release_time > as_of_time {
                continue;
            }
            match best.get(&obs_date) {
                Some((existing_rev, _)) if *existing_rev >= revision => {}
                _ => {
                    best.insert(obs_date, (revision, value));
                }
            }
        }
        best.into_iter().map(|(d, (_, v))| (d, v)).collect()
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn query_macro_observations(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of_time: DateTime<Utc>,
    ) -> MacroResult<Vec<Observation>> {
        let rows = sqlx::query(
            "SELECT observation_date, value, release_time, revision_number, source
             FROM macro_observations
             WHERE series_id = ? AND observation_date BETWEEN ? AND ?",
        )
        .bind(series_id)
        .bind(start_date.to_string())
        .bind(end_date.to_string())
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;

        let mut raw = Vec::with_capacity(rows.len());
        for row in rows {
            let obs_date: String = row.try_get("observation_date").map_err(sqlx_err)?;
            let obs_date = NaiveDate::parse_from_str(&obs_date, "%Y-%m-%d").map_err(parse_err)?;
            let release_time: String = row.try_get("release_time").map_err(sqlx_err)?;
            let release_time = DateTime::parse_from_rfc3339(&release_time)
                .map_err(parse_err)?
                .with_timezone(&Utc);
            let revision: i64 = row.try_get("revision_number").map_err(sqlx_err)?;
            let value: Option<f64> = row.try_get("value").map_err(sqlx_err)?;
            let source: String = row.try_get("source").map_err(sqlx_err)?;
            raw.push((obs_date, revision as u32, release_time, (value, source)));
        }

        let vintages = Self::select_vintage(raw, as_of_time);
        Ok(vintages
            .into_iter()
            .map(|(observation_date, (value, source))| Observation {
                series_id: series_id.to_string(),
                observation_date,
                value,
                release_time: as_of_time,
                revision_number: 0,
                source,
            })
            .collect())
    }

    async fn query_market_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of_time: DateTime<Utc>,
    ) -> MacroResult<Vec<MarketBar>> {
        let rows = sqlx::query(
            "SELECT observation_date, open, high, low, close, adjusted_close, volume, release_time, revision_number
             FROM market_bars
             WHERE ticker = ? AND observation_date BETWEEN ? AND ?",
        )
        .bind(ticker)
        .bind(start_date.to_string())
        .bind(end_date.to_string())
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;

        let mut raw = Vec::with_capacity(rows.len());
        for row in rows {
            let obs_date: String = row.try_get("observation_date").map_err(sqlx_err)?;
            let obs_date = NaiveDate::parse_from_str(&obs_date, "%Y-%m-%d").map_err(parse_err)?;
            let release_time: String = row.try_get("release_time").map_err(sqlx_err)?;
            let release_time = DateTime::parse_from_rfc3339(&release_time)
                .map_err(parse_err)?
                .with_timezone(&Utc);
            let revision: i64 = row.try_get("revision_number").map_err(sqlx_err)?;
            let bar = (
                row.try_get::<f64, _>("open").map_err(sqlx_err)?,
                row.try_get::<f64, _>("high").map_err(sqlx_err)?,
                row.try_get::<f64, _>("low").map_err(sqlx_err)?,
                row.try_get::<f64, _>("close").map_err(sqlx_err)?,
                row.try_get::<f64, _>("adjusted_close").map_err(sqlx_err)?,
                row.try_get::<f64, _>("volume").map_err(sqlx_err)?,
            );
            raw.push((obs_date, revision as u32, release_time, bar));
        }

        let vintages = Self::select_vintage(raw, as_of_time);
        Ok(vintages
            .into_iter()
            .map(|(observation_date, (open, high, low, close, adjusted_close, volume))| MarketBar {
                ticker: ticker.to_string(),
                observation_date,
                open,
                high,
                low,
                close,
                adjusted_close,
                volume,
                release_time: as_of_time,
                revision_number: 0,
            })
            .collect())
    }

    async fn query_flow_observations(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of_time: DateTime<Utc>,
    ) -> MacroResult<Vec<FlowRecord>> {
        let rows = sqlx::query(
            "SELECT flow_type, observation_date, value, release_time, revision_number, source
             FROM flow_observations
             WHERE series_id = ? AND observation_date BETWEEN ? AND ?",
        )
        .bind(series_id)
        .bind(start_date.to_string())
        .bind(end_date.to_string())
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;

        let mut raw = Vec::with_capacity(rows.len());
        for row in rows {
            let obs_date: String = row.try_get("observation_date").map_err(sqlx_err)?;
            let obs_date = NaiveDate::parse_from_str(&obs_date, "%Y-%m-%d").map_err(parse_err)?;
            let release_time: String = row.try_get("release_time").map_err(sqlx_err)?;
            let release_time = DateTime::parse_from_rfc3339(&release_time)
                .map_err(parse_err)?
                .with_timezone(&Utc);
            let revision: i64 = row.try_get("revision_number").map_err(sqlx_err)?;
            let value: Option<f64> = row.try_get("value").map_err(sqlx_err)?;
            let flow_type: String = row.try_get("flow_type").map_err(sqlx_err)?;
            let source: String = row.try_get("source").map_err(sqlx_err)?;
            raw.push((obs_date, revision as u32, release_time, (value, flow_type, source)));
        }

        let vintages = Self::select_vintage(raw, as_of_time);
        Ok(vintages
            .into_iter()
            .map(|(observation_date, (value, flow_type, source))| FlowRecord {
                series_id: series_id.to_string(),
                flow_type,
                observation_date,
                value,
                release_time: as_of_time,
                revision_number: 0,
                source,
            })
            .collect())
    }

    async fn query_fiscal_observations(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of_time: DateTime<Utc>,
    ) -> MacroResult<Vec<FiscalRecord>> {
        let rows = sqlx::query(
            "SELECT fiscal_metric, observation_date, value, release_time, revision_number, source
             FROM fiscal_observations
             WHERE series_id = ? AND observation_date BETWEEN ? AND ?",
        )
        .bind(series_id)
        .bind(start_date.to_string())
        .bind(end_date.to_string())
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;

        let mut raw = Vec::with_capacity(rows.len());
        for row in rows {
            let obs_date: String = row.try_get("observation_date").map_err(sqlx_err)?;
            let obs_date = NaiveDate::parse_from_str(&obs_date, "%Y-%m-%d").map_err(parse_err)?;
            let release_time: String = row.try_get("release_time").map_err(sqlx_err)?;
            let release_time = DateTime::parse_from_rfc3339(&release_time)
                .map_err(parse_err)?
                .with_timezone(&Utc);
            let revision: i64 = row.try_get("revision_number").map_err(sqlx_err)?;
            let value: Option<f64> = row.try_get("value").map_err(sqlx_err)?;
            let fiscal_metric: String = row.try_get("fiscal_metric").map_err(sqlx_err)?;
            let source: String = row.try_get("source").map_err(sqlx_err)?;
            raw.push((obs_date, revision as u32, release_time, (value, fiscal_metric, source)));
        }

        let vintages = Self::select_vintage(raw, as_of_time);
        Ok(vintages
            .into_iter()
            .map(|(observation_date, (value, fiscal_metric, source))| FiscalRecord {
                series_id: series_id.to_string(),
                fiscal_metric,
                observation_date,
                value,
                release_time: as_of_time,
                revision_number: 0,
                source,
            })
            .collect())
    }

    async fn query_curve_points(&self, curve_id: &str, curve_date: NaiveDate) -> MacroResult<Vec<CurvePoint>> {
        let rows = sqlx::query(
            "SELECT tenor_days, tenor_label, rate, curve_type FROM curve_points WHERE curve_id = ? AND curve_date = ?",
        )
        .bind(curve_id)
        .bind(curve_date.to_string())
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let tenor_days: i64 = row.try_get("tenor_days").map_err(sqlx_err)?;
                let tenor_label: String = row.try_get("tenor_label").map_err(sqlx_err)?;
                let rate: f64 = row.try_get("rate").map_err(sqlx_err)?;
                let curve_type: String = row.try_get("curve_type").map_err(sqlx_err)?;
                Ok(CurvePoint {
                    curve_id: curve_id.to_string(),
                    curve_date,
                    tenor_days: tenor_days as u32,
                    tenor_label,
                    rate,
                    curve_type: parse_curve_type(&curve_type)?,
                })
            })
            .collect()
    }

    async fn query_curve_history(
        &self,
        curve_id: &str,
        tenor_days: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> MacroResult<Vec<(NaiveDate, f64)>> {
        let rows = sqlx::query(
            "SELECT curve_date, rate FROM curve_points
             WHERE curve_id = ? AND tenor_days = ? AND curve_date BETWEEN ? AND ?
             ORDER BY curve_date ASC",
        )
        .bind(curve_id)
        .bind(tenor_days as i64)
        .bind(start_date.to_string())
        .bind(end_date.to_string())
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let curve_date: String = row.try_get("curve_date").map_err(sqlx_err)?;
                let curve_date = NaiveDate::parse_from_str(&curve_date, "%Y-%m-%d").map_err(parse_err)?;
                let rate: f64 = row.try_get("rate").map_err(sqlx_err)?;
                Ok((curve_date, rate))
            })
            .collect()
    }

    async fn upsert_agent_report(&self, report: &AgentReport) -> MacroResult<()> {
        let report_json = serde_json::to_string(report).map_err(|e| MacroError::InvariantViolation(e.to_string()))?;
        sqlx::query(
            "INSERT INTO agent_reports (agent_id, as_of_date, report_json, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(agent_id, as_of_date) DO UPDATE SET report_json = excluded.report_json, updated_at = excluded.updated_at",
        )
        .bind(&report.agent_id)
        .bind(report.as_of_date.to_string())
        .bind(report_json)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await
        .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn query_agent_report(&self, agent_id: &str, as_of_date: NaiveDate) -> MacroResult<Option<AgentReport>> {
        let row = sqlx::query("SELECT report_json FROM agent_reports WHERE agent_id = ? AND as_of_date = ?")
            .bind(agent_id)
            .bind(as_of_date.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| MacroError::RepositoryUnavailable(e.to_string()))?;

        let Some(row) = row else { return Ok(None) };
        let report_json: String = row.try_get("report_json").map_err(sqlx_err)?;
        let report: AgentReport = serde_json::from_str(&report_json).map_err(|e| MacroError::InvariantViolation(e.to_string()))?;
        Ok(Some(report))
    }
}

fn parse_curve_type(s: &str) -> MacroResult<CurveType> {
    match s {
        "swap" => Ok(CurveType::Swap),
        "sovereign_nominal" => Ok(CurveType::SovereignNominal),
        "sovereign_real" => Ok(CurveType::SovereignReal),
        "breakeven" => Ok(CurveType::Breakeven),
        other => Err(MacroError::InvariantViolation(format!("unknown curve_type '{other}'"))),
    }
}

fn sqlx_err(e: sqlx::Error) -> MacroError {
    MacroError::RepositoryUnavailable(e.to_string())
}

fn parse_err(e: impl std::fmt::Display) -> MacroError {
    MacroError::RepositoryUnavailable(e.to_string())
}
