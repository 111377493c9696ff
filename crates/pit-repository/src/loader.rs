use crate::repository::Repository;
use chrono::{Days, NaiveDate, NaiveTime, TimeZone, Utc};
use macro_core::{AgentReport, CurvePoint, MacroResult, MarketBar};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Answers "what did we know about series X at moment T?" by delegating to
/// a `Repository` and censoring at `as_of_date` end-of-day. Replaying the
/// same call for the same `as_of_date` against an unchanged (append-only)
/// repository returns bit-identical results.
pub struct PointInTimeLoader {
    repository: Arc<dyn Repository>,
}

fn end_of_day(date: NaiveDate) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap()))
}

fn lookback_start(as_of_date: NaiveDate, lookback_days: u32) -> NaiveDate {
    as_of_date
        .checked_sub_days(Days::new(lookback_days as u64))
        .unwrap_or(as_of_date)
}

impl PointInTimeLoader {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Ordered series indexed by observation_date, censored at `as_of_date` end-of-day.
    pub async fn get_macro_series(
        &self,
        series_code: &str,
        as_of_date: NaiveDate,
        lookback_days: u32,
    ) -> MacroResult<BTreeMap<NaiveDate, Option<f64>>> {
        let start = lookback_start(as_of_date, lookback_days);
        let rows = self
            .repository
            .query_macro_observations(series_code, start, as_of_date, end_of_day(as_of_date))
            .await?;
        Ok(rows.into_iter().map(|o| (o.observation_date, o.value)).collect())
    }

    /// Frame with columns (open, high, low, close, adjusted_close, volume), censored
    /// at `as_of_date` end-of-session (same censoring rule as macro series).
    pub async fn get_market_data(
        &self,
        ticker: &str,
        as_of_date: NaiveDate,
        lookback_days: u32,
    ) -> MacroResult<Vec<MarketBar>> {
        let start = lookback_start(as_of_date, lookback_days);
        let mut bars = self
            .repository
            .query_market_bars(ticker, start, as_of_date, end_of_day(as_of_date))
            .await?;
        bars.sort_by_key(|b| b.observation_date);
        Ok(bars)
    }

    pub async fn get_flow_data(
        &self,
        series_code: &str,
        as_of_date: NaiveDate,
        lookback_days: u32,
    ) -> MacroResult<BTreeMap<NaiveDate, Option<f64>>> {
        let start = lookback_start(as_of_date, lookback_days);
        let rows = self
            .repository
            .query_flow_observations(series_code, start, as_of_date, end_of_day(as_of_date))
            .await?;
        Ok(rows.into_iter().map(|r| (r.observation_date, r.value)).collect())
    }

    pub async fn get_fiscal_data(
        &self,
        series_code: &str,
        as_of_date: NaiveDate,
        lookback_days: u32,
    ) -> MacroResult<BTreeMap<NaiveDate, Option<f64>>> {
        let start = lookback_start(as_of_date, lookback_days);
        let rows = self
            .repository
            .query_fiscal_observations(series_code, start, as_of_date, end_of_day(as_of_date))
            .await?;
        Ok(rows.into_iter().map(|r| (r.observation_date, r.value)).collect())
    }

    /// Mapping tenor_days -> rate for one curve snapshot.
    pub async fn get_curve(&self, curve_id: &str, as_of_date: NaiveDate) -> MacroResult<BTreeMap<u32, f64>> {
        let points: Vec<CurvePoint> = self.repository.query_curve_points(curve_id, as_of_date).await?;
        Ok(points.into_iter().map(|p| (p.tenor_days, p.rate)).collect())
    }

    pub async fn get_curve_history(
        &self,
        curve_id: &str,
        tenor_days: u32,
        as_of_date: NaiveDate,
        lookback_days: u32,
    ) -> MacroResult<BTreeMap<NaiveDate, f64>> {
        let start = lookback_start(as_of_date, lookback_days);
        let rows = self
            .repository
            .query_curve_history(curve_id, tenor_days, start, as_of_date)
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// Looks up another agent's already-persisted report for the same
    /// `as_of_date`. Used by agents, like cross-asset, that consume other
    /// agents' composites rather than raw series.
    pub async fn get_agent_report(&self, agent_id: &str, as_of_date: NaiveDate) -> MacroResult<Option<AgentReport>> {
        self.repository.query_agent_report(agent_id, as_of_date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_zero_returns_as_of_date_only() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        assert_eq!(lookback_start(as_of, 0), as_of);
    }

    #[test]
    fn lookback_window_is_inclusive_of_as_of_date() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let start = lookback_start(as_of, 10);
        assert_eq!(start, as_of - chrono::Duration::days(10));
    }
}
