use agent_framework::{Agent, BaseAgent};
use async_trait::async_trait;
use chrono::NaiveDate;
use econ_models::{build_composite, BeerModel, CarryToRiskModel, CipBasisModel, CompositeChild, FlowModel};
use macro_core::{AgentReport, MacroResult};
use macro_features::{fx, FxBundle};
use pit_repository::{PointInTimeLoader, Repository};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const BEER_LOOKBACK_DAYS: u32 = 900;
const CARRY_LOOKBACK_DAYS: u32 = 400;
const FLOW_LOOKBACK_DAYS: u32 = 200;
const RATE_LOOKBACK_DAYS: u32 = 10;

const BEER_PREDICTOR_SERIES: [&str; 2] = ["BR_US_CPI_DIFFERENTIAL", "BR_TERMS_OF_TRADE_INDEX"];

/// Locked composite weights (spec.md §4.6): BEER 0.40 / CARRY 0.30 / FLOW 0.20 / CIP 0.10.
const WEIGHT_BEER: f64 = 0.40;
const WEIGHT_CARRY: f64 = 0.30;
const WEIGHT_FLOW: f64 = 0.20;
const WEIGHT_CIP: f64 = 0.10;

pub struct FxAgent {
    base: BaseAgent,
    loader: Arc<PointInTimeLoader>,
}

impl FxAgent {
    pub fn new(loader: Arc<PointInTimeLoader>, repository: Arc<dyn Repository>) -> Self {
        Self { base: BaseAgent::new("fx_agent", "FX").with_repository(repository), loader }
    }

    async fn load_data(&self, as_of_date: NaiveDate) -> (FxBundle, BTreeSet<String>) {
        let mut flags = BTreeSet::new();
        let mut bundle = FxBundle::default();

        let bars = self.base.safe_load(
            "usdbrl_daily",
            self.loader.get_market_data("USDBRL", as_of_date, BEER_LOOKBACK_DAYS).await,
            &mut flags,
        );
        if let Some(bars) = bars {
            bundle.log_usdbrl = bars
                .into_iter()
                .map(|bar| (bar.observation_date, if bar.adjusted_close > 0.0 { Some(bar.adjusted_close.ln()) } else { None }))
                .collect();
        }

        for series_id in BEER_PREDICTOR_SERIES {
            if let Some(series) = self.base.safe_load(
                series_id,
                self.loader.get_macro_series(series_id, as_of_date, BEER_LOOKBACK_DAYS).await,
                &mut flags,
            ) {
                bundle.beer_predictors.push((series_id.to_string(), series));
            }
        }

        if let Some(series) = self.base.safe_load(
            "BR_CARRY_TO_RISK_RATIO",
            self.loader.get_macro_series("BR_CARRY_TO_RISK_RATIO", as_of_date, CARRY_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.carry_to_risk_ratio_history = series;
        }

        if let Some(series) = self.base.safe_load(
            "BR_FX_FLOW",
            self.loader.get_flow_data("BR_FX_FLOW", as_of_date, FLOW_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.fx_flow_history = series;
        }

        if let Some(series) = self.base.safe_load(
            "BR_FX_SPECULATIVE_POSITIONING",
            self.loader.get_flow_data("BR_FX_SPECULATIVE_POSITIONING", as_of_date, FLOW_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.positioning_history = series;
        }

        if let Some(series) = self.base.safe_load(
            "BR_SELIC_SHORT_RATE",
            self.loader.get_macro_series("BR_SELIC_SHORT_RATE", as_of_date, RATE_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.domestic_short_rate = series;
        }

        if let Some(series) = self.base.safe_load(
            "US_SOFR_RATE",
            self.loader.get_macro_series("US_SOFR_RATE", as_of_date, RATE_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.foreign_risk_free_rate = series;
        }

        if let Some(series) = self.base.safe_load(
            "BR_FX_SURVEY_EXPECTED_DEPRECIATION",
            self.loader.get_macro_series("BR_FX_SURVEY_EXPECTED_DEPRECIATION", as_of_date, RATE_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.survey_expected_depreciation = series;
        }

        (bundle, flags)
    }
}

#[async_trait]
impl Agent for FxAgent {
    fn agent_id(&self) -> &str {
        "fx_agent"
    }

    fn agent_name(&self) -> &str {
        "FX"
    }

    async fn run(&self, as_of_date: NaiveDate) -> MacroResult<AgentReport> {
        let (bundle, data_quality_flags) = self.load_data(as_of_date).await;
        let features = fx::compute(&bundle, as_of_date);

        let beer = match &features.beer_ols_frame {
            Some(frame) => BeerModel::run(frame, as_of_date),
            None => macro_core::AgentSignal::no_signal(BeerModel::SIGNAL_ID, self.agent_id(), as_of_date, 90, "insufficient_data"),
        };
        let carry = match &features.carry_ratio_history {
            Some(history) => CarryToRiskModel::run(history, as_of_date),
            None => macro_core::AgentSignal::no_signal(CarryToRiskModel::SIGNAL_ID, self.agent_id(), as_of_date, 60, "insufficient_data"),
        };
        let flow = FlowModel::run(features.fx_flow_history.as_deref(), features.positioning_history.as_deref(), as_of_date);
        let cip = CipBasisModel::run(
            features.scalars.get(&fx::FxFeatureName::DomesticShortRate).copied(),
            features.scalars.get(&fx::FxFeatureName::ForeignRiskFreeRate).copied(),
            features.scalars.get(&fx::FxFeatureName::SurveyExpectedDepreciation).copied(),
            as_of_date,
        );

        let children = vec![
            CompositeChild { signal: &beer, base_weight: WEIGHT_BEER },
            CompositeChild { signal: &carry, base_weight: WEIGHT_CARRY },
            CompositeChild { signal: &flow, base_weight: WEIGHT_FLOW },
            CompositeChild { signal: &cip, base_weight: WEIGHT_CIP },
        ];
        let composite = build_composite(self.agent_id(), "FX_BR_COMPOSITE", as_of_date, 90, &children)?;

        let mut diagnostics = BTreeMap::new();
        diagnostics.insert("n_beer_predictors".to_string(), serde_json::json!(bundle.beer_predictors.len()));

        let mut report = AgentReport::empty(self.agent_id(), as_of_date);
        report.signals = vec![beer, carry, flow, cip, composite];
        report.data_quality_flags = data_quality_flags;
        report.diagnostics = diagnostics;
        report.narrative = Some(self.generate_narrative(&report));
        self.base.persist(&report).await;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_weights_sum_to_one() {
        assert!((WEIGHT_BEER + WEIGHT_CARRY + WEIGHT_FLOW + WEIGHT_CIP - 1.0).abs() < 1e-9);
    }
}
