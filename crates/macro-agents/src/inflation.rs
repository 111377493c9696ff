use agent_framework::{Agent, BaseAgent};
use async_trait::async_trait;
use econ_models::{build_composite, CompositeChild, InflationSurpriseModel, InflationTrendModel};
use chrono::NaiveDate;
use macro_core::{AgentReport, MacroResult};
use macro_features::{inflation, InflationBundle};
use pit_repository::{PointInTimeLoader, Repository};
use std::collections::BTreeSet;
use std::sync::Arc;

const PRINT_LOOKBACK_DAYS: u32 = 45;
const SURPRISE_HISTORY_LOOKBACK_DAYS: u32 = 365 * 3;
const TREND_LOOKBACK_DAYS: u32 = 365 * 3;

/// Equal weighting between the surprise and trend sub-models; the spec
/// names both models for the inflation agent without locking a composite
/// weight, unlike FX and fiscal.
const WEIGHT_SURPRISE: f64 = 0.5;
const WEIGHT_TREND: f64 = 0.5;

pub struct InflationAgent {
    base: BaseAgent,
    loader: Arc<PointInTimeLoader>,
}

impl InflationAgent {
    pub fn new(loader: Arc<PointInTimeLoader>, repository: Arc<dyn Repository>) -> Self {
        Self { base: BaseAgent::new("inflation_agent", "Inflation").with_repository(repository), loader }
    }

    async fn load_data(&self, as_of_date: NaiveDate) -> (InflationBundle, BTreeSet<String>) {
        let mut flags = BTreeSet::new();
        let mut bundle = InflationBundle::default();

        if let Some(s) = self.base.safe_load(
            "BR_IPCA_ACTUAL",
            self.loader.get_macro_series("BR_IPCA_ACTUAL", as_of_date, PRINT_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.actual_print_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_IPCA_CONSENSUS",
            self.loader.get_macro_series("BR_IPCA_CONSENSUS", as_of_date, PRINT_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.consensus_print_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_IPCA_SURPRISE_HISTORY",
            self.loader.get_macro_series("BR_IPCA_SURPRISE_HISTORY", as_of_date, SURPRISE_HISTORY_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.surprise_history = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_IPCA_YOY",
            self.loader.get_macro_series("BR_IPCA_YOY", as_of_date, TREND_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.monthly_yoy_inflation_pct = s;
        }

        (bundle, flags)
    }
}

#[async_trait]
impl Agent for InflationAgent {
    fn agent_id(&self) -> &str {
        "inflation_agent"
    }

    fn agent_name(&self) -> &str {
        "Inflation"
    }

    async fn run(&self, as_of_date: NaiveDate) -> MacroResult<AgentReport> {
        let (bundle, data_quality_flags) = self.load_data(as_of_date).await;
        let features = inflation::compute(&bundle, as_of_date);

        let surprise = InflationSurpriseModel::run(
            features.scalars.get(&inflation::InflationFeatureName::ActualPrint).copied(),
            features.scalars.get(&inflation::InflationFeatureName::ConsensusPrint).copied(),
            features.surprise_history.as_deref().unwrap_or(&[]),
            as_of_date,
        );

        let trend = match &features.monthly_yoy_inflation_pct {
            Some(series) => InflationTrendModel::run(series, as_of_date),
            None => macro_core::AgentSignal::no_signal(InflationTrendModel::SIGNAL_ID, self.agent_id(), as_of_date, 120, "insufficient_data"),
        };

        let children = vec![
            CompositeChild { signal: &surprise, base_weight: WEIGHT_SURPRISE },
            CompositeChild { signal: &trend, base_weight: WEIGHT_TREND },
        ];
        let composite = build_composite(self.agent_id(), "INFLATION_BR_COMPOSITE", as_of_date, 120, &children)?;

        let mut report = AgentReport::empty(self.agent_id(), as_of_date);
        report.signals = vec![surprise, trend, composite];
        report.data_quality_flags = data_quality_flags;
        report.narrative = Some(self.generate_narrative(&report));
        self.base.persist(&report).await;
        Ok(report)
    }
}
