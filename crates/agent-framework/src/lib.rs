pub mod agent;
pub mod base;
pub mod registry;

pub use agent::Agent;
pub use base::BaseAgent;
pub use registry::{AgentRegistry, AGENT_WALL_CLOCK_BUDGET_SECONDS, EXECUTION_ORDER};
