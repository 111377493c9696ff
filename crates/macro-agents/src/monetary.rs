use agent_framework::{Agent, BaseAgent};
use async_trait::async_trait;
use chrono::NaiveDate;
use econ_models::{build_composite, CompositeChild, KalmanRStarModel, TaylorRuleModel};
use macro_core::{AgentReport, MacroResult};
use macro_features::{monetary, MonetaryBundle, INFLATION_TARGET_PCT};
use pit_repository::{PointInTimeLoader, Repository};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const RATE_LOOKBACK_DAYS: u32 = 45;
const REAL_RATE_LOOKBACK_DAYS: u32 = 365 * 4;

/// Spec.md §9 open question resolution: the spec locks FX and fiscal
/// composite weights explicitly but leaves the monetary agent's two-model
/// composite unweighted; this agent splits Taylor-rule and r* evenly.
const WEIGHT_TAYLOR: f64 = 0.5;
const WEIGHT_R_STAR: f64 = 0.5;

pub struct MonetaryAgent {
    base: BaseAgent,
    loader: Arc<PointInTimeLoader>,
}

impl MonetaryAgent {
    pub fn new(loader: Arc<PointInTimeLoader>, repository: Arc<dyn Repository>) -> Self {
        Self { base: BaseAgent::new("monetary_agent", "Monetary").with_repository(repository), loader }
    }

    async fn load_data(&self, as_of_date: NaiveDate) -> (MonetaryBundle, BTreeSet<String>) {
        let mut flags = BTreeSet::new();
        let mut bundle = MonetaryBundle::default();

        if let Some(s) = self.base.safe_load(
            "BR_SELIC_TARGET",
            self.loader.get_macro_series("BR_SELIC_TARGET", as_of_date, RATE_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.policy_rate_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_IPCA_YOY",
            self.loader.get_macro_series("BR_IPCA_YOY", as_of_date, RATE_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.headline_inflation_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_OUTPUT_GAP",
            self.loader.get_macro_series("BR_OUTPUT_GAP", as_of_date, RATE_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.output_gap_pct = s;
        }
        if let Some(s) = self.base.safe_load(
            "BR_REAL_RATE_MONTHLY",
            self.loader.get_macro_series("BR_REAL_RATE_MONTHLY", as_of_date, REAL_RATE_LOOKBACK_DAYS).await,
            &mut flags,
        ) {
            bundle.monthly_real_rate_pct = s;
        }

        (bundle, flags)
    }
}

#[async_trait]
impl Agent for MonetaryAgent {
    fn agent_id(&self) -> &str {
        "monetary_agent"
    }

    fn agent_name(&self) -> &str {
        "Monetary"
    }

    async fn run(&self, as_of_date: NaiveDate) -> MacroResult<AgentReport> {
        let (_bundle, data_quality_flags) = self.load_data(as_of_date).await;
        let features = monetary::compute(&_bundle, as_of_date);

        let (r_star_signal, r_star_path) = match &features.monthly_real_rate_pct {
            Some(series) => KalmanRStarModel::run(series, as_of_date),
            None => (
                macro_core::AgentSignal::no_signal(KalmanRStarModel::SIGNAL_ID, self.agent_id(), as_of_date, 180, "insufficient_data"),
                Vec::new(),
            ),
        };

        let taylor = TaylorRuleModel::run(
            features.scalars.get(&monetary::MonetaryFeatureName::PolicyRatePct).copied(),
            features.scalars.get(&monetary::MonetaryFeatureName::HeadlineInflationPct).copied(),
            INFLATION_TARGET_PCT,
            features.scalars.get(&monetary::MonetaryFeatureName::OutputGapPct).copied(),
            r_star_path.last().copied(),
            as_of_date,
        );

        let children = vec![
            CompositeChild { signal: &r_star_signal, base_weight: WEIGHT_R_STAR },
            CompositeChild { signal: &taylor, base_weight: WEIGHT_TAYLOR },
        ];
        let composite = build_composite(self.agent_id(), "MONETARY_BR_COMPOSITE", as_of_date, 180, &children)?;

        let mut diagnostics = BTreeMap::new();
        diagnostics.insert("r_star_path_len".to_string(), serde_json::json!(r_star_path.len()));

        let mut report = AgentReport::empty(self.agent_id(), as_of_date);
        report.signals = vec![r_star_signal, taylor, composite];
        report.data_quality_flags = data_quality_flags;
        report.diagnostics = diagnostics;
        report.narrative = Some(self.generate_narrative(&report));
        self.base.persist(&report).await;
        Ok(report)
    }
}
