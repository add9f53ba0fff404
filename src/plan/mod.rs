//! Sweep planning: filters, well arrays and the (channel, loop) cross product.

pub mod filters;
pub mod planner;
pub mod wells;

pub use filters::Filters;
pub use planner::{AnalysisUnit, CombinationPlanner, Plan};
pub use wells::{resolve_well_array, WellArray, WellRange};
