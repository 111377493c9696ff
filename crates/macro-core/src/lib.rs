pub mod canonical;
pub mod error;
pub mod journal;
pub mod observation;
pub mod proposal;
pub mod report;
pub mod signal;

pub use canonical::canonical_json;
pub use error::{MacroError, MacroResult};
pub use journal::{EntryType, JournalEntry};
pub use observation::{CurvePoint, CurveType, FiscalRecord, FlowRecord, MarketBar, Observation};
pub use proposal::{ProposalStatus, TradeProposal, CONVICTION_MIN, FLIP_THRESHOLD, MAX_PROPOSALS_PER_DAY};
pub use report::AgentReport;
pub use signal::{classify_strength, classify_strength_with, AgentSignal, SignalDirection, SignalStrength, StrengthThresholds};
