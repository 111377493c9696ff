pub mod adaptive;
pub mod beer;
pub mod carry_to_risk;
pub mod cip_basis;
pub mod composite;
pub mod dominance_risk;
pub mod dsa;
pub mod filters;
pub mod fiscal_impulse;
pub mod flow;
pub mod inflation_surprise;
pub mod inflation_trend;
pub mod kalman_r_star;
pub mod ols;
pub mod stats;
pub mod taylor_rule;

pub use adaptive::{adaptive_signal, percentile_rank, percentile_to_signal};
pub use beer::BeerModel;
pub use carry_to_risk::CarryToRiskModel;
pub use cip_basis::CipBasisModel;
pub use composite::{build_composite, CompositeChild, CONFLICT_DAMPENING};
pub use dominance_risk::{DominanceInputs, DominanceRiskModel};
pub use dsa::{DsaModel, ScenarioAdjustment, SCENARIOS as DSA_SCENARIOS};
pub use filters::{hp_filter, ScalarKalmanFilter};
pub use fiscal_impulse::FiscalImpulseModel;
pub use flow::FlowModel;
pub use inflation_surprise::InflationSurpriseModel;
pub use inflation_trend::InflationTrendModel;
pub use kalman_r_star::KalmanRStarModel;
pub use ols::{FittedOls, OlsError, OlsFrame};
pub use taylor_rule::TaylorRuleModel;
