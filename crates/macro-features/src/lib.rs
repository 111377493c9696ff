pub mod cross_asset;
pub mod fiscal;
pub mod fx;
pub mod inflation;
pub mod monetary;
pub mod series;

pub use cross_asset::{CrossAssetBundle, CrossAssetFeatureMap, Regime};
pub use fiscal::{FiscalBundle, FiscalFeatureMap, FiscalFeatureName};
pub use fx::{FxBundle, FxFeatureMap, FxFeatureName};
pub use inflation::{InflationBundle, InflationFeatureMap, InflationFeatureName};
pub use monetary::{MonetaryBundle, MonetaryFeatureMap, MonetaryFeatureName, INFLATION_TARGET_PCT};
