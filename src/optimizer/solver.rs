//! Adapter around the continuous LP backend.
//!
//! The backend is `good_lp` with the pure-Rust `minilp` simplex solver: no
//! integer variables, deterministic for identical input. The solve runs on
//! a dedicated worker thread so the caller waits at most the configured
//! wall-clock budget; on expiry the worker keeps running to completion and
//! its result is discarded - there is no mid-solve cancellation.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use good_lp::{default_solver, Expression, ResolutionError, Solution, SolverModel};

use crate::domain::SolveStatus;
use crate::optimizer::problem::ScheduleProblem;
use crate::optimizer::OptimizeError;

#[derive(Debug, Clone)]
pub struct SolverSettings {
    /// Wall-clock budget for one solve. `None` disables the watchdog and
    /// solves on the calling thread.
    pub timeout: Option<Duration>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Solved values for one slot, before clamping and labelling.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawSlot {
    pub grid_import_wh: f64,
    pub grid_export_wh: f64,
    pub battery_charge_wh: f64,
    pub battery_discharge_wh: f64,
    pub battery_energy_wh: f64,
    pub soc_deficit_wh: f64,
    pub ev_charge_wh: f64,
    pub ev_energy_wh: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct RawSolution {
    pub status: SolveStatus,
    pub objective_value: f64,
    pub slots: Vec<RawSlot>,
}

pub(crate) fn solve(
    settings: &SolverSettings,
    problem: ScheduleProblem,
    objective: Expression,
) -> Result<RawSolution, OptimizeError> {
    match settings.timeout {
        None => run_solve(problem, objective),
        Some(limit) => {
            let (tx, rx) = mpsc::channel();
            thread::Builder::new()
                .name("schedule-lp".into())
                .spawn(move || {
                    let _ = tx.send(run_solve(problem, objective));
                })
                .map_err(|e| OptimizeError::Solver(format!("failed to spawn solver thread: {e}")))?;

            match rx.recv_timeout(limit) {
                Ok(result) => result,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    tracing::warn!(budget_ms = limit.as_millis() as u64, "solve timed out");
                    Err(OptimizeError::Timeout(limit))
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => Err(OptimizeError::Solver(
                    "solver thread exited without a result".into(),
                )),
            }
        }
    }
}

fn run_solve(problem: ScheduleProblem, objective: Expression) -> Result<RawSolution, OptimizeError> {
    let ScheduleProblem {
        vars,
        constraints,
        grid_import,
        grid_export,
        battery_charge,
        battery_discharge,
        battery_energy,
        soc_deficit,
        ev,
    } = problem;

    let n = grid_import.len();
    let started = Instant::now();

    let mut model = vars.minimise(objective.clone()).using(default_solver);
    for constraint in constraints {
        model = model.with(constraint);
    }

    match model.solve() {
        Ok(solution) => {
            let objective_value = solution.eval(objective);
            let slots = (0..n)
                .map(|t| RawSlot {
                    grid_import_wh: solution.value(grid_import[t]),
                    grid_export_wh: solution.value(grid_export[t]),
                    battery_charge_wh: solution.value(battery_charge[t]),
                    battery_discharge_wh: solution.value(battery_discharge[t]),
                    battery_energy_wh: solution.value(battery_energy[t]),
                    soc_deficit_wh: solution.value(soc_deficit[t]),
                    ev_charge_wh: ev.as_ref().map_or(0.0, |e| solution.value(e.charge[t])),
                    ev_energy_wh: ev.as_ref().map_or(0.0, |e| solution.value(e.energy[t])),
                })
                .collect();

            tracing::debug!(
                slots = n,
                objective = objective_value,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "schedule LP solved"
            );
            Ok(RawSolution {
                status: SolveStatus::Optimal,
                objective_value,
                slots,
            })
        }
        Err(ResolutionError::Infeasible) => Err(OptimizeError::Infeasible(format!(
            "{n}-slot problem admits no schedule under the configured bounds"
        ))),
        Err(ResolutionError::Unbounded) => Err(OptimizeError::Unbounded(
            "check price signs and fee configuration".into(),
        )),
        Err(other) => Err(OptimizeError::Solver(format!("{other:?}"))),
    }
}
