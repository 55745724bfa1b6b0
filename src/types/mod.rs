pub mod itinerary;
pub mod trip;

pub use itinerary::{Activity, CostEstimate, CostRange, DayPlan, Itinerary};
pub use trip::{BudgetTier, TripRequest};
