//! Query planner module.
//!
//! The planner turns bound statements into trees of physical operators.
//! Plans follow the statement as written; there is no optimization step.

pub mod physical_plan;

pub use physical_plan::PhysicalPlanGenerator;
