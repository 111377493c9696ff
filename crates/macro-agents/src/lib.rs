pub mod cross_asset;
pub mod fiscal;
pub mod fx;
pub mod inflation;
pub mod monetary;

pub use cross_asset::CrossAssetAgent;
pub use fiscal::FiscalAgent;
pub use fx::FxAgent;
pub use inflation::InflationAgent;
pub use monetary::MonetaryAgent;
