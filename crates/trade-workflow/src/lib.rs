pub mod service;

pub use service::{ProposalModification, TradeWorkflowService, WorkflowConfig, PER_STRATEGY_CAP};
