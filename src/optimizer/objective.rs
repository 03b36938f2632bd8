//! Assembly of the linear cost function.
//!
//! The base objective is Σ_t import·buy − export·sell + deficit·penalty;
//! everything else is an opt-in refinement with a neutral default. No
//! quadratic or integer terms, so the problem stays solvable by a plain
//! continuous simplex.

use good_lp::Expression;
use serde::{Deserialize, Serialize};

use crate::optimizer::problem::ScheduleProblem;
use crate::optimizer::OptimizeRequest;

/// Tunable weights of the cost function. All rates are currency per Wh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    /// Cost per Wh per slot the battery sits below its SOC target. Keep it
    /// below the largest buy/sell spread of the horizon
    /// ([`crate::domain::PriceCurve::max_arbitrage_margin_per_wh`]) or the
    /// deficit term dominates every scheduling decision.
    pub soc_penalty_per_wh: f64,
    /// Small cost per charged Wh. The default is only a tie-breaker that
    /// keeps degenerate charge+discharge pairs out of optimal solutions;
    /// raise it toward a real per-Wh wear cost to suppress marginal
    /// arbitrage cycles.
    pub charge_penalty_per_wh: f64,
    /// Bonus per stored Wh per slot. Zero by default; a tiny value shifts
    /// discharging toward the end of the horizon instead of an arbitrary
    /// cost-equivalent slot.
    pub retention_bonus_per_wh: f64,
    /// Credit energy left in the battery at the end of the horizon at the
    /// final slot's sell price, so the optimizer does not sell off a full
    /// battery just because the horizon ends.
    pub value_final_energy: bool,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            soc_penalty_per_wh: 0.001,
            charge_penalty_per_wh: 1e-6,
            retention_bonus_per_wh: 0.0,
            value_final_energy: false,
        }
    }
}

pub(crate) struct ObjectiveComposer<'a> {
    request: &'a OptimizeRequest,
}

impl<'a> ObjectiveComposer<'a> {
    pub fn new(request: &'a OptimizeRequest) -> Self {
        Self { request }
    }

    pub fn compose(&self, problem: &ScheduleProblem) -> Expression {
        let request = self.request;
        let weights = &request.weights;
        let n = request.slots();

        let mut objective = Expression::from(0.0);
        for t in 0..n {
            objective += problem.grid_import[t] * request.prices.buy_price_per_wh(t);
            objective -= problem.grid_export[t] * request.prices.sell_price_per_wh(t);
            objective += problem.soc_deficit[t] * weights.soc_penalty_per_wh;
            objective += problem.battery_charge[t] * weights.charge_penalty_per_wh;
            if weights.retention_bonus_per_wh > 0.0 {
                objective -= problem.battery_energy[t] * weights.retention_bonus_per_wh;
            }
        }

        if weights.value_final_energy && n > 0 {
            objective -= problem.battery_energy[n - 1] * request.prices.sell_price_per_wh(n - 1);
        }

        if let (Some(ev), Some(plan)) = (&problem.ev, &request.ev) {
            if let Some(deficit) = &ev.deficit {
                objective += deficit.var * plan.deficit_penalty_per_wh;
            }
        }

        objective
    }
}
