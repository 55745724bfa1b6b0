pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod llm;
pub mod map;
pub mod search;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{PlannerError, PlannerResult};
pub use generator::context::CrewContext;
pub use generator::crew::{CrewOutput, TravelCrew};
pub use generator::workflow::{LaunchReport, execute, launch};
pub use types::{BudgetTier, Itinerary, TripRequest};
