pub mod context;
pub mod crew;
pub mod outlet;
pub mod parser;
pub mod pipeline;
pub mod step_forward_agent;
pub mod types;
pub mod workflow;
