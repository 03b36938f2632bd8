//! Decoding of raw LP values into a labelled schedule.
//!
//! Extraction is a pure post-processing step over solved values: it snaps
//! numerical noise, computes per-slot grid cost and attaches the activity
//! label. It never feeds back into the solve and never changes a decision,
//! so the LP formulation stays testable independent of labelling policy.

use serde::{Deserialize, Serialize};

use crate::domain::{Activity, ForecastSlot, Schedule, ScheduleEntry};
use crate::optimizer::solver::RawSolution;
use crate::optimizer::OptimizeRequest;

/// Values this close to zero are solver noise and read as zero.
const ZERO_TOLERANCE_WH: f64 = 1e-6;

/// Thresholds for the activity labelling.
///
/// `flow_epsilon_wh` is the smallest battery flow that counts as activity;
/// `limit_margin_wh` is how close to a stored-energy bound the battery must
/// be for an idle slot with unmet surplus or demand to read as blocked
/// (`ChargeLimit`/`DischargeLimit`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LabelPolicy {
    pub flow_epsilon_wh: f64,
    pub limit_margin_wh: f64,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            flow_epsilon_wh: 1.0,
            limit_margin_wh: 10.0,
        }
    }
}

pub(crate) struct ScheduleExtractor<'a> {
    request: &'a OptimizeRequest,
    policy: LabelPolicy,
}

impl<'a> ScheduleExtractor<'a> {
    pub fn new(request: &'a OptimizeRequest, policy: LabelPolicy) -> Self {
        Self { request, policy }
    }

    pub fn extract(&self, raw: &RawSolution) -> Schedule {
        let request = self.request;
        let battery = &request.battery;
        let floor_wh = battery.min_energy_wh();
        let slot_len = battery.slot_duration();
        let grid_limit = battery.grid_limit_wh_per_slot().unwrap_or(f64::INFINITY);
        let max_charge_wh = battery.max_charge_wh_per_slot();
        let max_discharge_wh = battery.max_discharge_wh_per_slot();
        let ev_bounds = request
            .ev
            .as_ref()
            .map(|plan| (plan.capacity_wh, plan.max_charge_wh_per_slot(battery)));

        let mut entries = Vec::with_capacity(raw.slots.len());
        let mut total_cost = 0.0;
        for (t, values) in raw.slots.iter().enumerate() {
            let grid_import_wh = bounded(values.grid_import_wh, 0.0, grid_limit, t, "grid_import");
            let grid_export_wh = bounded(values.grid_export_wh, 0.0, grid_limit, t, "grid_export");
            let battery_charge_wh =
                bounded(values.battery_charge_wh, 0.0, max_charge_wh, t, "battery_charge");
            let battery_discharge_wh = bounded(
                values.battery_discharge_wh,
                0.0,
                max_discharge_wh,
                t,
                "battery_discharge",
            );
            let battery_energy_wh = bounded(
                values.battery_energy_wh,
                floor_wh,
                battery.capacity_wh,
                t,
                "battery_energy",
            );
            let (ev_charge_wh, ev_energy_wh) = match ev_bounds {
                Some((capacity_wh, max_ev_charge_wh)) => (
                    bounded(values.ev_charge_wh, 0.0, max_ev_charge_wh, t, "ev_charge"),
                    bounded(values.ev_energy_wh, 0.0, capacity_wh, t, "ev_energy"),
                ),
                None => (0.0, 0.0),
            };

            if values.soc_deficit_wh > self.policy.flow_epsilon_wh {
                tracing::debug!(
                    slot = t,
                    deficit_wh = values.soc_deficit_wh,
                    "slot settles below the SOC target"
                );
            }

            let slot_cost = grid_import_wh * request.prices.buy_price_per_wh(t)
                - grid_export_wh * request.prices.sell_price_per_wh(t);
            total_cost += slot_cost;

            let time_start = request.horizon_start + slot_len * t as i32;
            entries.push(ScheduleEntry {
                slot: t,
                time_start,
                time_end: time_start + slot_len,
                grid_import_wh,
                grid_export_wh,
                battery_charge_wh,
                battery_discharge_wh,
                battery_energy_wh,
                battery_soc_percent: battery_energy_wh / battery.capacity_wh * 100.0,
                ev_charge_wh,
                ev_energy_wh,
                activity: self.classify(
                    &request.forecast[t],
                    battery_charge_wh,
                    battery_discharge_wh,
                    battery_energy_wh,
                ),
                slot_cost,
            });
        }

        Schedule {
            entries,
            status: raw.status,
            objective_value: raw.objective_value,
            total_cost,
        }
    }

    /// First matching rule wins; charging outranks discharging, and both
    /// outrank the blocked/idle distinction.
    fn classify(
        &self,
        slot: &ForecastSlot,
        charge_wh: f64,
        discharge_wh: f64,
        energy_wh: f64,
    ) -> Activity {
        let eps = self.policy.flow_epsilon_wh;
        let margin = self.policy.limit_margin_wh;
        let battery = &self.request.battery;
        let surplus_wh = slot.surplus_wh();

        if charge_wh > eps {
            if slot.production_wh + eps >= charge_wh + slot.consumption_wh {
                Activity::ChargeSolarSurplus
            } else {
                Activity::Charge
            }
        } else if discharge_wh > eps {
            if discharge_wh <= slot.consumption_wh - slot.production_wh + eps {
                Activity::DischargeForHome
            } else {
                Activity::Discharge
            }
        } else if surplus_wh > eps && energy_wh >= battery.capacity_wh - margin {
            Activity::ChargeLimit
        } else if -surplus_wh > eps && energy_wh <= battery.min_energy_wh() + margin {
            Activity::DischargeLimit
        } else {
            Activity::Idle
        }
    }
}

/// Snap solver noise to zero and clamp to the declared bounds, logging a
/// non-fatal numerical warning when a value strays outside them.
fn bounded(value: f64, lo: f64, hi: f64, slot: usize, name: &'static str) -> f64 {
    let snapped = if value.abs() < ZERO_TOLERANCE_WH {
        0.0
    } else {
        value
    };
    if snapped < lo {
        tracing::warn!(
            slot,
            variable = name,
            value = snapped,
            bound = lo,
            "clamping value below its declared bound"
        );
        lo
    } else if snapped > hi {
        tracing::warn!(
            slot,
            variable = name,
            value = snapped,
            bound = hi,
            "clamping value above its declared bound"
        );
        hi
    } else {
        snapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BatteryConfig, PriceCurve, PriceFees, SolveStatus};
    use crate::optimizer::solver::{RawSlot, RawSolution};
    use crate::optimizer::ObjectiveWeights;
    use chrono::TimeZone;

    fn request(forecast: Vec<ForecastSlot>) -> OptimizeRequest {
        let n = forecast.len();
        OptimizeRequest {
            horizon_start: chrono::FixedOffset::east_opt(3600)
                .unwrap()
                .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
                .unwrap(),
            forecast,
            prices: PriceCurve::new(vec![1.0; n], PriceFees::default()),
            battery: BatteryConfig {
                capacity_wh: 10_000.0,
                initial_energy_wh: 3_000.0,
                ..BatteryConfig::default()
            },
            ev: None,
            weights: ObjectiveWeights::default(),
        }
    }

    fn classify(slot: ForecastSlot, charge: f64, discharge: f64, energy: f64) -> Activity {
        let req = request(vec![slot]);
        ScheduleExtractor::new(&req, LabelPolicy::default()).classify(
            &slot, charge, discharge, energy,
        )
    }

    #[test]
    fn test_charge_covered_by_surplus() {
        let slot = ForecastSlot::new(4000.0, 1000.0);
        assert_eq!(classify(slot, 2000.0, 0.0, 5000.0), Activity::ChargeSolarSurplus);
    }

    #[test]
    fn test_charge_beyond_surplus_reads_as_grid_charge() {
        let slot = ForecastSlot::new(1000.0, 500.0);
        assert_eq!(classify(slot, 2000.0, 0.0, 5000.0), Activity::Charge);
    }

    #[test]
    fn test_discharge_within_household_need() {
        let slot = ForecastSlot::new(0.0, 3000.0);
        assert_eq!(classify(slot, 0.0, 2000.0, 1000.0), Activity::DischargeForHome);
    }

    #[test]
    fn test_discharge_beyond_need_reads_as_sale() {
        let slot = ForecastSlot::new(0.0, 500.0);
        assert_eq!(classify(slot, 0.0, 2000.0, 1000.0), Activity::Discharge);
    }

    #[test]
    fn test_surplus_against_full_battery_reads_as_charge_limit() {
        let slot = ForecastSlot::new(3000.0, 500.0);
        assert_eq!(classify(slot, 0.0, 0.0, 9995.0), Activity::ChargeLimit);
    }

    #[test]
    fn test_deficit_against_empty_battery_reads_as_discharge_limit() {
        let slot = ForecastSlot::new(0.0, 3000.0);
        assert_eq!(classify(slot, 0.0, 0.0, 702.0), Activity::DischargeLimit);
    }

    #[test]
    fn test_no_flow_no_pressure_is_idle() {
        let slot = ForecastSlot::new(1000.0, 1000.0);
        assert_eq!(classify(slot, 0.0, 0.0, 5000.0), Activity::Idle);
    }

    #[test]
    fn test_flows_below_epsilon_read_as_idle() {
        let slot = ForecastSlot::new(0.0, 0.0);
        assert_eq!(classify(slot, 0.5, 0.3, 5000.0), Activity::Idle);
    }

    #[test]
    fn test_rule_order_prefers_charge_over_discharge() {
        // Never produced by an optimal solution, but the labelling must
        // stay deterministic on arbitrary values.
        let slot = ForecastSlot::new(0.0, 0.0);
        assert_eq!(classify(slot, 50.0, 50.0, 5000.0), Activity::Charge);
    }

    #[test]
    fn test_bounded_snaps_noise_and_clamps() {
        assert_eq!(bounded(1e-9, 0.0, 100.0, 0, "x"), 0.0);
        assert_eq!(bounded(-1e-8, 0.0, 100.0, 0, "x"), 0.0);
        assert_eq!(bounded(100.0000001, 0.0, 100.0, 0, "x"), 100.0);
        assert_eq!(bounded(699.999999, 700.0, 10_000.0, 0, "x"), 700.0);
        assert_eq!(bounded(42.0, 0.0, 100.0, 0, "x"), 42.0);
    }

    #[test]
    fn test_extract_builds_timed_entries_with_costs() {
        let req = request(vec![
            ForecastSlot::new(0.0, 0.0),
            ForecastSlot::new(0.0, 0.0),
        ]);
        let raw = RawSolution {
            status: SolveStatus::Optimal,
            objective_value: -1.0,
            slots: vec![
                RawSlot {
                    grid_import_wh: 1000.0,
                    grid_export_wh: 0.0,
                    battery_charge_wh: 1000.0,
                    battery_discharge_wh: 0.0,
                    battery_energy_wh: 3950.0,
                    soc_deficit_wh: 0.0,
                    ev_charge_wh: 0.0,
                    ev_energy_wh: 0.0,
                },
                RawSlot {
                    grid_import_wh: 0.0,
                    grid_export_wh: 2000.0,
                    battery_charge_wh: 0.0,
                    battery_discharge_wh: 2000.0,
                    battery_energy_wh: 1950.0,
                    soc_deficit_wh: 1050.0,
                    ev_charge_wh: 0.0,
                    ev_energy_wh: 0.0,
                },
            ],
        };

        let schedule = ScheduleExtractor::new(&req, LabelPolicy::default()).extract(&raw);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.status, SolveStatus::Optimal);

        let first = &schedule.entries[0];
        assert_eq!(first.slot, 0);
        assert_eq!(first.time_start, req.horizon_start);
        assert_eq!(first.time_end, req.horizon_start + chrono::Duration::hours(1));
        assert_eq!(first.activity, Activity::Charge);
        // 1000 Wh at 1.95/kWh
        assert!((first.slot_cost - 1.95).abs() < 1e-9);
        assert!((first.battery_soc_percent - 39.5).abs() < 1e-9);

        let second = &schedule.entries[1];
        assert_eq!(second.time_start, req.horizon_start + chrono::Duration::hours(1));
        assert_eq!(second.activity, Activity::Discharge);
        // 2000 Wh sold at 1.68/kWh
        assert!((second.slot_cost + 3.36).abs() < 1e-9);

        assert!((schedule.total_cost - (1.95 - 3.36)).abs() < 1e-9);
        assert!(schedule
            .entry_at(req.horizon_start + chrono::Duration::minutes(90))
            .is_some_and(|e| e.slot == 1));
    }
}
