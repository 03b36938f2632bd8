use serde::{Deserialize, Serialize};

/// Stationary battery configuration for one optimization horizon.
///
/// Energies are in Wh, powers in W. Power limits are converted to per-slot
/// energy limits using `slot_duration_minutes` when the problem is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Usable storage capacity (Wh).
    pub capacity_wh: f64,
    /// Stored energy at the start of slot 0 (Wh).
    pub initial_energy_wh: f64,
    /// Maximum charging power (W).
    pub max_charge_w: f64,
    /// Maximum discharging power (W).
    pub max_discharge_w: f64,
    /// Charging efficiency, in (0, 1]. Discharge is modelled lossless; the
    /// round-trip loss is applied on the way in.
    pub charge_efficiency: f64,
    /// Preferred state of charge as a fraction of capacity. Dropping below
    /// it is allowed but penalized in the objective.
    pub target_soc_fraction: f64,
    /// Hard lower state-of-charge bound as a fraction of capacity.
    pub min_soc_fraction: f64,
    /// Length of one time slot in minutes.
    pub slot_duration_minutes: u32,
    /// Main fuse capacity (W). When set, grid import and export are each
    /// bounded by this per slot; when `None` the grid connection is treated
    /// as unlimited.
    pub max_grid_power_w: Option<f64>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_wh: 44_000.0,
            initial_energy_wh: 5_000.0,
            max_charge_w: 5_000.0,
            max_discharge_w: 5_000.0,
            charge_efficiency: 0.95,
            target_soc_fraction: 0.30,
            min_soc_fraction: 0.07,
            slot_duration_minutes: 60,
            max_grid_power_w: None,
        }
    }
}

impl BatteryConfig {
    /// Hard lower bound on stored energy (Wh).
    pub fn min_energy_wh(&self) -> f64 {
        self.min_soc_fraction * self.capacity_wh
    }

    /// Soft target on stored energy (Wh).
    pub fn target_energy_wh(&self) -> f64 {
        self.target_soc_fraction * self.capacity_wh
    }

    /// Convert a power (W) into the energy it moves in one slot (Wh).
    pub fn power_to_slot_wh(&self, power_w: f64) -> f64 {
        power_w * (self.slot_duration_minutes as f64 / 60.0)
    }

    pub fn max_charge_wh_per_slot(&self) -> f64 {
        self.power_to_slot_wh(self.max_charge_w)
    }

    pub fn max_discharge_wh_per_slot(&self) -> f64 {
        self.power_to_slot_wh(self.max_discharge_w)
    }

    pub fn grid_limit_wh_per_slot(&self) -> Option<f64> {
        self.max_grid_power_w.map(|w| self.power_to_slot_wh(w))
    }

    pub fn slot_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.slot_duration_minutes as i64)
    }
}

/// Optional EV charging demand co-optimized with the stationary battery.
///
/// The EV only draws energy (no vehicle-to-grid). When `ready_time` is set,
/// the optimizer is penalized for every Wh the vehicle is short of its
/// target at that time; without it the EV is modelled but never charged,
/// since charging has a cost and no reward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvChargePlan {
    /// Vehicle battery capacity (Wh).
    pub capacity_wh: f64,
    /// Stored energy when the horizon starts (Wh).
    pub initial_energy_wh: f64,
    /// Maximum charger power (W).
    pub max_charge_w: f64,
    /// When the vehicle should be ready to leave.
    pub ready_time: Option<chrono::DateTime<chrono::FixedOffset>>,
    /// Desired state of charge at `ready_time`, as a fraction of capacity.
    pub target_soc_fraction: f64,
    /// Penalty per Wh below the target at the ready slot (currency/Wh).
    pub deficit_penalty_per_wh: f64,
}

impl EvChargePlan {
    pub fn new(capacity_wh: f64, initial_energy_wh: f64, max_charge_w: f64) -> Self {
        Self {
            capacity_wh,
            initial_energy_wh,
            max_charge_w,
            ready_time: None,
            target_soc_fraction: 0.9,
            deficit_penalty_per_wh: 0.01,
        }
    }

    pub fn ready_at(mut self, ready_time: chrono::DateTime<chrono::FixedOffset>) -> Self {
        self.ready_time = Some(ready_time);
        self
    }

    pub fn target_energy_wh(&self) -> f64 {
        self.target_soc_fraction * self.capacity_wh
    }

    pub fn max_charge_wh_per_slot(&self, battery: &BatteryConfig) -> f64 {
        battery.power_to_slot_wh(self.max_charge_w)
    }
}
