//! Linear-programming schedule optimizer.
//!
//! Each [`ScheduleOptimizer::optimize`] call validates its inputs, builds
//! one LP instance ([`problem`]), assembles the cost function
//! ([`objective`]), hands both to the solver backend ([`solver`]) and
//! decodes the solution into labelled per-slot decisions ([`extract`]).
//! Nothing is shared between calls.

pub mod extract;
pub mod objective;
pub mod problem;
pub mod solver;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    validate_battery, validate_ev, validate_forecast, validate_prices, BatteryConfig,
    EvChargePlan, ForecastSlot, PriceCurve, Schedule, SolveStatus, ValidationError,
};

pub use extract::LabelPolicy;
pub use objective::ObjectiveWeights;
pub use solver::SolverSettings;

use extract::ScheduleExtractor;
use objective::ObjectiveComposer;
use problem::ProblemBuilder;

/// Complete input for one optimization run. Treated as immutable; the
/// optimizer keeps no state between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// Wall-clock time of the start of slot 0.
    pub horizon_start: DateTime<FixedOffset>,
    /// One entry per slot, same length as `prices`.
    pub forecast: Vec<ForecastSlot>,
    pub prices: PriceCurve,
    pub battery: BatteryConfig,
    pub ev: Option<EvChargePlan>,
    pub weights: ObjectiveWeights,
}

impl OptimizeRequest {
    pub fn slots(&self) -> usize {
        self.forecast.len()
    }
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The constraint set admits no schedule, e.g. consumption that cannot
    /// be covered under the configured grid limit. Retrying with unchanged
    /// inputs cannot succeed; the optimizer never retries on its own.
    #[error("no feasible schedule: {0}")]
    Infeasible(String),
    #[error("objective is unbounded: {0}")]
    Unbounded(String),
    #[error("solve exceeded the time budget of {0:?}")]
    Timeout(std::time::Duration),
    #[error("solver failure: {0}")]
    Solver(String),
}

impl OptimizeError {
    /// The [`SolveStatus`] this failure corresponds to.
    pub fn status(&self) -> SolveStatus {
        match self {
            OptimizeError::Validation(_) => SolveStatus::Error,
            OptimizeError::Infeasible(_) => SolveStatus::Infeasible,
            OptimizeError::Unbounded(_) => SolveStatus::Unbounded,
            OptimizeError::Timeout(_) => SolveStatus::Timeout,
            OptimizeError::Solver(_) => SolveStatus::Error,
        }
    }
}

/// Stateless front door of the crate.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOptimizer {
    solver: SolverSettings,
    labels: LabelPolicy,
}

impl ScheduleOptimizer {
    pub fn new(solver: SolverSettings, labels: LabelPolicy) -> Self {
        Self { solver, labels }
    }

    /// Build, solve and decode one schedule.
    ///
    /// Fails with a typed error on invalid input or when the solver reports
    /// infeasibility, unboundedness, a timeout or a backend failure; a
    /// partial or zero-filled schedule is never returned.
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<Schedule, OptimizeError> {
        validate_request(request)?;

        // An empty horizon has a trivially optimal empty schedule.
        if request.forecast.is_empty() {
            return Ok(Schedule {
                entries: Vec::new(),
                status: SolveStatus::Optimal,
                objective_value: 0.0,
                total_cost: 0.0,
            });
        }

        tracing::debug!(slots = request.slots(), "building schedule LP");
        let problem = ProblemBuilder::new(request).build();
        let objective = ObjectiveComposer::new(request).compose(&problem);
        let raw = solver::solve(&self.solver, problem, objective)?;
        Ok(ScheduleExtractor::new(request, self.labels).extract(&raw))
    }
}

fn validate_request(request: &OptimizeRequest) -> Result<(), ValidationError> {
    if request.prices.len() != request.forecast.len() {
        return Err(ValidationError::MismatchedLengths {
            prices: request.prices.len(),
            forecast: request.forecast.len(),
        });
    }
    validate_battery(&request.battery)?;
    validate_prices(&request.prices)?;
    validate_forecast(&request.forecast)?;
    if let Some(ev) = &request.ev {
        validate_ev(ev)?;
    }

    let weights = [
        ("soc penalty", request.weights.soc_penalty_per_wh),
        ("charge penalty", request.weights.charge_penalty_per_wh),
        ("retention bonus", request.weights.retention_bonus_per_wh),
    ];
    for (name, value) in weights {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ValidationError::InvalidWeight { name, value });
        }
    }
    Ok(())
}
