pub mod activity_researcher;
pub mod cost_estimator;
pub mod destination_analyst;
pub mod synthesizer;

pub use activity_researcher::ActivityResearcher;
pub use cost_estimator::CostEstimator;
pub use destination_analyst::DestinationAnalyst;
pub use synthesizer::Synthesizer;
