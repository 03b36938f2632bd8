//! Spot-price battery schedule optimizer.
//!
//! Given a per-slot production/consumption forecast, a spot-price curve with
//! fixed buy/sell fee addons and a battery configuration, this crate builds a
//! continuous linear program, solves it, and decodes the solution into an
//! ordered schedule of per-slot grid and battery decisions, each labelled
//! with its dominant economic activity.
//!
//! The entry point is [`ScheduleOptimizer::optimize`]. Each call is
//! stateless: it validates its inputs, builds and solves one LP instance,
//! and discards it, so concurrent callers may run independent solves.

pub mod domain;
pub mod optimizer;

pub use domain::{
    Activity, BatteryConfig, EvChargePlan, ForecastSlot, PriceCurve, PriceFees, Schedule,
    ScheduleEntry, SolveStatus, ValidationError,
};
pub use optimizer::{
    LabelPolicy, ObjectiveWeights, OptimizeError, OptimizeRequest, ScheduleOptimizer,
    SolverSettings,
};
