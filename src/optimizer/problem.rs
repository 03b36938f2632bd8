//! LP formulation of the scheduling problem.
//!
//! For every slot t the builder creates six non-negative decision variables
//! (grid import/export, battery charge/discharge, stored energy, SOC
//! deficit slack) and imposes:
//!
//! - energy balance: production + import + discharge =
//!   consumption + charge + export (+ EV charge when a plan is present)
//! - stored-energy transition with the charging efficiency applied on the
//!   way in, anchored at the configured initial energy before slot 0
//! - device bounds converted from W to per-slot Wh
//! - a throughput coupling charge/max_charge + discharge/max_discharge <= 1,
//!   the linear relaxation of a binary charge-or-discharge selector
//! - with a fuse limit configured, import + export per slot stay within it,
//!   so the connection never carries both directions at full power
//! - the soft SOC constraint deficit >= target - stored, deficit >= 0
//!
//! Everything is continuous; no integer variables. Input that passed
//! validation always yields a well-formed problem, so a failure can only
//! come from the solve step.

use good_lp::{constraint, variable, Constraint, ProblemVariables, Variable};

use crate::domain::EvChargePlan;
use crate::optimizer::OptimizeRequest;

pub(crate) struct ScheduleProblem {
    pub vars: ProblemVariables,
    pub constraints: Vec<Constraint>,
    pub grid_import: Vec<Variable>,
    pub grid_export: Vec<Variable>,
    pub battery_charge: Vec<Variable>,
    pub battery_discharge: Vec<Variable>,
    pub battery_energy: Vec<Variable>,
    pub soc_deficit: Vec<Variable>,
    pub ev: Option<EvVariables>,
}

pub(crate) struct EvVariables {
    pub charge: Vec<Variable>,
    pub energy: Vec<Variable>,
    pub deficit: Option<EvDeficitVar>,
}

pub(crate) struct EvDeficitVar {
    pub slot: usize,
    pub var: Variable,
    pub target_wh: f64,
}

/// Which slot the EV must be ready at, and with how much energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EvTarget {
    pub slot: usize,
    pub target_wh: f64,
}

pub(crate) struct ProblemBuilder<'a> {
    request: &'a OptimizeRequest,
}

impl<'a> ProblemBuilder<'a> {
    pub fn new(request: &'a OptimizeRequest) -> Self {
        Self { request }
    }

    pub fn build(self) -> ScheduleProblem {
        let request = self.request;
        let battery = &request.battery;
        let n = request.slots();

        let mut vars = ProblemVariables::new();

        let max_charge_wh = battery.max_charge_wh_per_slot();
        let max_discharge_wh = battery.max_discharge_wh_per_slot();
        let floor_wh = battery.min_energy_wh();
        let target_wh = battery.target_energy_wh();

        let grid_limit_wh = battery.grid_limit_wh_per_slot();
        let grid_import = match grid_limit_wh {
            Some(limit) => vars.add_vector(variable().min(0.0).max(limit), n),
            None => vars.add_vector(variable().min(0.0), n),
        };
        let grid_export = match grid_limit_wh {
            Some(limit) => vars.add_vector(variable().min(0.0).max(limit), n),
            None => vars.add_vector(variable().min(0.0), n),
        };
        let battery_charge = vars.add_vector(variable().min(0.0).max(max_charge_wh), n);
        let battery_discharge = vars.add_vector(variable().min(0.0).max(max_discharge_wh), n);
        let battery_energy =
            vars.add_vector(variable().min(floor_wh).max(battery.capacity_wh), n);
        let soc_deficit = vars.add_vector(variable().min(0.0), n);

        let ev = request.ev.as_ref().map(|plan| {
            let charge =
                vars.add_vector(variable().min(0.0).max(plan.max_charge_wh_per_slot(battery)), n);
            let energy = vars.add_vector(variable().min(0.0).max(plan.capacity_wh), n);
            let deficit = ev_target(request, plan).map(|target| EvDeficitVar {
                slot: target.slot,
                var: vars.add(variable().min(0.0)),
                target_wh: target.target_wh,
            });
            EvVariables {
                charge,
                energy,
                deficit,
            }
        });

        let eta = battery.charge_efficiency;
        let inv_charge = 1.0 / max_charge_wh;
        let inv_discharge = 1.0 / max_discharge_wh;

        let mut constraints = Vec::with_capacity(4 * n);
        for t in 0..n {
            let slot = &request.forecast[t];
            let net_load_wh = slot.consumption_wh - slot.production_wh;

            // Energy balance.
            if let Some(ev) = &ev {
                constraints.push(constraint!(
                    grid_import[t] + battery_discharge[t]
                        - battery_charge[t]
                        - grid_export[t]
                        - ev.charge[t]
                        == net_load_wh
                ));
            } else {
                constraints.push(constraint!(
                    grid_import[t] + battery_discharge[t] - battery_charge[t] - grid_export[t]
                        == net_load_wh
                ));
            }

            // Stored-energy transition; slot -1 is the fixed initial energy.
            if t == 0 {
                constraints.push(constraint!(
                    battery_energy[0] - battery_charge[0] * eta + battery_discharge[0]
                        == battery.initial_energy_wh
                ));
            } else {
                constraints.push(constraint!(
                    battery_energy[t] - battery_energy[t - 1] - battery_charge[t] * eta
                        + battery_discharge[t]
                        == 0.0
                ));
            }

            // Shared inverter throughput; keeps charge and discharge from
            // both running at full power in one slot. Together with the
            // asymmetric prices and the charging penalty this makes
            // simultaneous charge+discharge strictly suboptimal.
            constraints.push(constraint!(
                battery_charge[t] * inv_charge + battery_discharge[t] * inv_discharge <= 1.0
            ));

            // The fuse carries import or export, never both at full power.
            if let Some(limit) = grid_limit_wh {
                constraints.push(constraint!(grid_import[t] + grid_export[t] <= limit));
            }

            // Soft SOC floor: deficit picks up whatever stored energy lacks
            // against the target, and is penalized in the objective.
            constraints.push(constraint!(soc_deficit[t] + battery_energy[t] >= target_wh));

            if let (Some(ev), Some(plan)) = (&ev, &request.ev) {
                if t == 0 {
                    constraints.push(constraint!(
                        ev.energy[0] - ev.charge[0] == plan.initial_energy_wh
                    ));
                } else {
                    constraints.push(constraint!(
                        ev.energy[t] - ev.energy[t - 1] - ev.charge[t] == 0.0
                    ));
                }
            }
        }

        if let Some(ev) = &ev {
            if let Some(deficit) = &ev.deficit {
                constraints.push(constraint!(
                    deficit.var + ev.energy[deficit.slot] >= deficit.target_wh
                ));
            }
        }

        ScheduleProblem {
            vars,
            constraints,
            grid_import,
            grid_export,
            battery_charge,
            battery_discharge,
            battery_energy,
            soc_deficit,
            ev,
        }
    }
}

/// Map an EV ready time onto a slot index and target energy.
///
/// The ready slot is the first slot starting at or after the ready time. A
/// ready time before the horizon clamps to slot 0. A ready time beyond the
/// horizon prorates the target at the last slot by the fraction of the lead
/// time the horizon covers, so back-to-back runs ramp the vehicle up
/// gradually instead of ignoring the deadline.
pub(crate) fn ev_target(request: &OptimizeRequest, plan: &EvChargePlan) -> Option<EvTarget> {
    let ready = plan.ready_time?;
    let n = request.slots();
    if n == 0 {
        return None;
    }

    let slot_minutes = request.battery.slot_duration_minutes as i64;
    let offset_minutes = ready
        .signed_duration_since(request.horizon_start)
        .num_minutes();
    if offset_minutes <= 0 {
        return Some(EvTarget {
            slot: 0,
            target_wh: plan.target_energy_wh(),
        });
    }

    let slot = ((offset_minutes + slot_minutes - 1) / slot_minutes) as usize;
    if slot < n {
        Some(EvTarget {
            slot,
            target_wh: plan.target_energy_wh(),
        })
    } else {
        let elapsed_minutes = ((n - 1) as i64 * slot_minutes) as f64;
        let progress = (elapsed_minutes / offset_minutes as f64).min(1.0);
        Some(EvTarget {
            slot: n - 1,
            target_wh: progress * plan.target_energy_wh(),
        })
    }
}
