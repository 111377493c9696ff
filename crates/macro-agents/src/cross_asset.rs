use agent_framework::{Agent, BaseAgent};
use async_trait::async_trait;
use chrono::NaiveDate;
use econ_models::{build_composite, CompositeChild};
use macro_core::{AgentReport, AgentSignal, MacroResult, SignalDirection};
use macro_features::{cross_asset, CrossAssetBundle, Regime};
use pit_repository::{PointInTimeLoader, Repository};
use std::collections::BTreeSet;
use std::sync::Arc;

const MOMENTUM_LOOKBACK_DAYS: u32 = 90;

/// The four upstream agents whose composites feed the cross-asset stance,
/// plus the regime classifier itself, all equally weighted — the spec
/// names no lock for this combination, unlike FX (BEER/carry/flow/CIP)
/// and fiscal (equal thirds).
const UPSTREAM_AGENTS: [&str; 4] = ["inflation_agent", "monetary_agent", "fiscal_agent", "fx_agent"];
const CHILD_WEIGHT: f64 = 0.2;

pub struct CrossAssetAgent {
    base: BaseAgent,
    loader: Arc<PointInTimeLoader>,
}

impl CrossAssetAgent {
    pub fn new(loader: Arc<PointInTimeLoader>, repository: Arc<dyn Repository>) -> Self {
        Self { base: BaseAgent::new("cross_asset_agent", "Cross-Asset").with_repository(repository), loader }
    }

    async fn load_data(&self, as_of_date: NaiveDate) -> (CrossAssetBundle, BTreeSet<String>) {
        let mut flags = BTreeSet::new();
        let mut bundle = CrossAssetBundle::default();

        if let Some(s) = self.base.safe_load(
            "BR_IBOVESPA_RETURNS",
            self.loader.get_market_data("IBOV", as_of_date, MOMENTUM_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.risk_asset_returns = returns_from_bars(s);
        }
        if let Some(s) = self.base.safe_load(
            "BR_COMMODITY_INDEX_RETURNS",
            self.loader.get_market_data("COMMODITY_INDEX", as_of_date, MOMENTUM_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.commodity_index_returns = returns_from_bars(s);
        }

        (bundle, flags)
    }

    async fn load_upstream_composites(&self, as_of_date: NaiveDate) -> (Vec<(String, AgentSignal)>, BTreeSet<String>) {
        let mut flags = BTreeSet::new();
        let mut composites = Vec::new();
        for agent_id in UPSTREAM_AGENTS {
            match self.loader.get_agent_report(agent_id, as_of_date).await {
                Ok(Some(report)) => match report.composite() {
                    Some(composite) => composites.push((agent_id.to_string(), composite.clone())),
                    None => {
                        flags.insert(format!("{agent_id}_composite_missing"));
                    }
                },
                Ok(None) => {
                    flags.insert(format!("{agent_id}_report_missing"));
                }
                Err(err) => {
                    tracing::warn!(agent_id, error = %err, "failed to read upstream agent report");
                    flags.insert(format!("{agent_id}_report_unavailable"));
                }
            }
        }
        (composites, flags)
    }
}

fn returns_from_bars(bars: Vec<macro_core::MarketBar>) -> std::collections::BTreeMap<NaiveDate, Option<f64>> {
    let mut out = std::collections::BTreeMap::new();
    for pair in bars.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let ret = if prev.adjusted_close != 0.0 { Some((curr.adjusted_close - prev.adjusted_close) / prev.adjusted_close) } else { None };
        out.insert(curr.observation_date, ret);
    }
    out
}

#[async_trait]
impl Agent for CrossAssetAgent {
    fn agent_id(&self) -> &str {
        "cross_asset_agent"
    }

    fn agent_name(&self) -> &str {
        "Cross-Asset"
    }

    async fn run(&self, as_of_date: NaiveDate) -> MacroResult<AgentReport> {
        let (bundle, mut data_quality_flags) = self.load_data(as_of_date).await;
        let features = cross_asset::compute(&bundle, as_of_date);

        let (upstream, upstream_flags) = self.load_upstream_composites(as_of_date).await;
        data_quality_flags.extend(upstream_flags);

        let regime_signal = regime_to_signal(features.regime, as_of_date);

        let mut children: Vec<CompositeChild> = upstream.iter().map(|(_, signal)| CompositeChild { signal, base_weight: CHILD_WEIGHT }).collect();
        children.push(CompositeChild { signal: &regime_signal, base_weight: CHILD_WEIGHT });

        // Renormalize so the composite always sees weights summing to 1.0
        // even when one or more upstream reports were unavailable.
        let weight_sum: f64 = children.iter().map(|c| c.base_weight).sum();
        let mut renormalized_children = Vec::with_capacity(children.len());
        for child in &children {
            renormalized_children.push(CompositeChild { signal: child.signal, base_weight: child.base_weight / weight_sum });
        }

        let composite = build_composite(self.agent_id(), "CROSS_ASSET_BR_COMPOSITE", as_of_date, 90, &renormalized_children)?;

        let narrative = format!(
            "Regime: {} (growth momentum {:.4}, inflation-pressure momentum {:.4}). {} of 4 upstream composites consulted.",
            features.regime.as_str(),
            features.growth_momentum.unwrap_or(f64::NAN),
            features.inflation_pressure_momentum.unwrap_or(f64::NAN),
            upstream.len(),
        );

        let mut report = AgentReport::empty(self.agent_id(), as_of_date);
        report.signals = vec![regime_signal, composite];
        report.data_quality_flags = data_quality_flags;
        report.narrative = Some(narrative);
        self.base.persist(&report).await;
        Ok(report)
    }
}

fn regime_to_signal(regime: Regime, as_of_date: NaiveDate) -> AgentSignal {
    const SIGNAL_ID: &str = "CROSS_ASSET_BR_REGIME";
    const HORIZON_DAYS: u32 = 90;
    match regime {
        Regime::Goldilocks => AgentSignal::directional(SIGNAL_ID, "cross_asset_agent", as_of_date, SignalDirection::Long, 0.6, 1.0, HORIZON_DAYS, Default::default()),
        Regime::Reflation => AgentSignal::directional(SIGNAL_ID, "cross_asset_agent", as_of_date, SignalDirection::Long, 0.4, 0.5, HORIZON_DAYS, Default::default()),
        Regime::Stagflation => AgentSignal::directional(SIGNAL_ID, "cross_asset_agent", as_of_date, SignalDirection::Short, 0.6, -1.0, HORIZON_DAYS, Default::default()),
        Regime::Deflation => AgentSignal::directional(SIGNAL_ID, "cross_asset_agent", as_of_date, SignalDirection::Short, 0.4, -0.5, HORIZON_DAYS, Default::default()),
        Regime::Unknown => AgentSignal::no_signal(SIGNAL_ID, "cross_asset_agent", as_of_date, HORIZON_DAYS, "insufficient_data"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goldilocks_regime_is_long() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = regime_to_signal(Regime::Goldilocks, as_of);
        assert_eq!(signal.direction, SignalDirection::Long);
    }

    #[test]
    fn unknown_regime_is_no_signal() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        let signal = regime_to_signal(Regime::Unknown, as_of);
        assert!(signal.is_no_signal());
    }
}
