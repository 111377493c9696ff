use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One measurement of one series at one calendar date, as delivered by a
/// connector. Immutable once created; the loader selects a *vintage* from
/// among the revisions sharing `(series_id, observation_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub series_id: String,
    pub observation_date: NaiveDate,
    pub value: Option<f64>,
    pub release_time: DateTime<Utc>,
    pub revision_number: u32,
    pub source: String,
}

/// One OHLCV-and-volume row of a market data series for a trading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketBar {
    pub ticker: String,
    pub observation_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: f64,
    pub release_time: DateTime<Utc>,
    pub revision_number: u32,
}

/// Tag distinguishing flow-type series (FX flow, positioning, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub series_id: String,
    pub flow_type: String,
    pub observation_date: NaiveDate,
    pub value: Option<f64>,
    pub release_time: DateTime<Utc>,
    pub revision_number: u32,
    pub source: String,
}

/// A single-valued fiscal observation (primary balance, gross debt, etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalRecord {
    pub series_id: String,
    pub fiscal_metric: String,
    pub observation_date: NaiveDate,
    pub value: Option<f64>,
    pub release_time: DateTime<Utc>,
    pub revision_number: u32,
    pub source: String,
}

/// Tag for a term-structure curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    Swap,
    SovereignNominal,
    SovereignReal,
    Breakeven,
}

/// One point on a term-structure curve. `rate` is a decimal (`0.1350`, not `13.50`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub curve_id: String,
    pub curve_date: NaiveDate,
    pub tenor_days: u32,
    pub tenor_label: String,
    pub rate: f64,
    pub curve_type: CurveType,
}
