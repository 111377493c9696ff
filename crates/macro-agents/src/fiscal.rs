use agent_framework::{Agent, BaseAgent};
use async_trait::async_trait;
use chrono::NaiveDate;
use econ_models::{build_composite, CompositeChild, DominanceRiskModel, DsaModel, FiscalImpulseModel};
use macro_core::{AgentReport, AgentSignal, MacroResult};
use macro_features::{fiscal, FiscalBundle};
use pit_repository::{PointInTimeLoader, Repository};
use std::collections::BTreeSet;
use std::sync::Arc;

const MONTHLY_LOOKBACK_DAYS: u32 = 365 * 5;
const LATEST_LOOKBACK_DAYS: u32 = 45;

/// Locked equal-thirds weighting across the fiscal sub-models (spec.md §4.6).
const EQUAL_THIRD: f64 = 1.0 / 3.0;

pub struct FiscalAgent {
    base: BaseAgent,
    loader: Arc<PointInTimeLoader>,
}

impl FiscalAgent {
    pub fn new(loader: Arc<PointInTimeLoader>, repository: Arc<dyn Repository>) -> Self {
        Self { base: BaseAgent::new("fiscal_agent", "Fiscal").with_repository(repository), loader }
    }

    async fn load_data(&self, as_of_date: NaiveDate) -> (FiscalBundle, BTreeSet<String>) {
        let mut flags = BTreeSet::new();
        let mut bundle = FiscalBundle::default();

        if let Some(s) = self.base.safe_load(
            "BR_GROSS_DEBT_GDP",
            self.loader.get_fiscal_data("BR_GROSS_DEBT_GDP", as_of_date, LATEST_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.debt_gdp_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_REAL_RATE",
            self.loader.get_macro_series("BR_REAL_RATE", as_of_date, LATEST_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.real_rate_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_REAL_GDP_GROWTH",
            self.loader.get_macro_series("BR_REAL_GDP_GROWTH", as_of_date, LATEST_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.growth_rate_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_PRIMARY_BALANCE_GDP",
            self.loader.get_fiscal_data("BR_PRIMARY_BALANCE_GDP", as_of_date, MONTHLY_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.monthly_primary_balance_gdp_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_R_MINUS_G",
            self.loader.get_fiscal_data("BR_R_MINUS_G", as_of_date, LATEST_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.r_minus_g_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_PB_TREND",
            self.loader.get_fiscal_data("BR_PB_TREND", as_of_date, LATEST_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.pb_trend_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_CB_CREDIBILITY_GAP",
            self.loader.get_fiscal_data("BR_CB_CREDIBILITY_GAP", as_of_date, LATEST_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.cb_credibility_gap_pct = s;
        }

        (bundle, flags)
    }
}

#[async_trait]
impl Agent for FiscalAgent {
    fn agent_id(&self) -> &str {
        "fiscal_agent"
    }

    fn agent_name(&self) -> &str {
        "Fiscal"
    }

    async fn run(&self, as_of_date: NaiveDate) -> MacroResult<AgentReport> {
        let (bundle, data_quality_flags) = self.load_data(as_of_date).await;
        let features = fiscal::compute(&bundle, as_of_date);

        let dsa = match (
            features.scalars.get(&fiscal::FiscalFeatureName::CurrentDebtGdpPct),
            features.scalars.get(&fiscal::FiscalFeatureName::RealRatePct),
            features.scalars.get(&fiscal::FiscalFeatureName::GrowthRatePct),
            features.scalars.get(&fiscal::FiscalFeatureName::PrimaryBalanceGdpPct),
        ) {
            (Some(&debt), Some(&r), Some(&g), Some(&pb)) => DsaModel::run(debt, r, g, pb, as_of_date),
            _ => AgentSignal::no_signal(DsaModel::SIGNAL_ID, self.agent_id(), as_of_date, 365 * 2, "insufficient_data"),
        };

        let impulse = match &features.monthly_primary_balance_gdp_pct {
            Some(series) => FiscalImpulseModel::run(series, as_of_date),
            None => AgentSignal::no_signal(FiscalImpulseModel::SIGNAL_ID, self.agent_id(), as_of_date, 180, "insufficient_data"),
        };

        let dominance = DominanceRiskModel::run(features.dominance_inputs, as_of_date);

        let children = vec![
            CompositeChild { signal: &dsa, base_weight: EQUAL_THIRD },
            CompositeChild { signal: &impulse, base_weight: EQUAL_THIRD },
            CompositeChild { signal: &dominance, base_weight: EQUAL_THIRD },
        ];
        let composite = build_composite(self.agent_id(), "FISCAL_BR_COMPOSITE", as_of_date, 180, &children)?;

        let mut report = AgentReport::empty(self.agent_id(), as_of_date);
        report.signals = vec![dsa, impulse, dominance, composite];
        report.data_quality_flags = data_quality_flags;
        report.narrative = Some(self.generate_narrative(&report));
        self.base.persist(&report).await;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_thirds_sum_to_one() {
        assert!((EQUAL_THIRD * 3.0 - 1.0).abs() < 1e-9);
    }
}
