use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Dominant economic activity of one schedule slot.
///
/// Labels are purely descriptive: they are derived from solved decision
/// values after the fact and never feed back into the optimization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Charging, mostly from the grid.
    Charge,
    /// Charging covered entirely by solar surplus.
    ChargeSolarSurplus,
    /// Surplus available but the battery is full.
    ChargeLimit,
    /// Discharging beyond household need, selling to the grid.
    Discharge,
    /// Discharging to cover the household deficit.
    DischargeForHome,
    /// Household deficit present but the battery is at its floor.
    DischargeLimit,
    Idle,
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activity::Charge => write!(f, "charge"),
            Activity::ChargeSolarSurplus => write!(f, "charge_solar_surplus"),
            Activity::ChargeLimit => write!(f, "charge_limit"),
            Activity::Discharge => write!(f, "discharge"),
            Activity::DischargeForHome => write!(f, "discharge_for_home"),
            Activity::DischargeLimit => write!(f, "discharge_limit"),
            Activity::Idle => write!(f, "idle"),
        }
    }
}

impl std::str::FromStr for Activity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "charge" => Ok(Activity::Charge),
            "charge_solar_surplus" => Ok(Activity::ChargeSolarSurplus),
            "charge_limit" => Ok(Activity::ChargeLimit),
            "discharge" => Ok(Activity::Discharge),
            "discharge_for_home" => Ok(Activity::DischargeForHome),
            "discharge_limit" => Ok(Activity::DischargeLimit),
            "idle" => Ok(Activity::Idle),
            _ => Err(format!("Unknown activity: {}", s)),
        }
    }
}

/// Outcome reported by the LP backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unbounded,
    Timeout,
    Error,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Timeout => "timeout",
            SolveStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Solved decision values for one time slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub slot: usize,
    pub time_start: DateTime<FixedOffset>,
    pub time_end: DateTime<FixedOffset>,
    pub grid_import_wh: f64,
    pub grid_export_wh: f64,
    pub battery_charge_wh: f64,
    pub battery_discharge_wh: f64,
    /// Stored energy at the end of the slot (Wh).
    pub battery_energy_wh: f64,
    pub battery_soc_percent: f64,
    pub ev_charge_wh: f64,
    pub ev_energy_wh: f64,
    pub activity: Activity,
    /// Grid cost of this slot: import at buy price minus export at sell
    /// price. Negative when the slot earns money.
    pub slot_cost: f64,
}

/// Ordered optimization result over the whole horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub entries: Vec<ScheduleEntry>,
    pub status: SolveStatus,
    /// Value of the full objective, including penalty and bonus terms.
    pub objective_value: f64,
    /// Sum of per-slot grid costs only.
    pub total_cost: f64,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_at(&self, t: DateTime<FixedOffset>) -> Option<&ScheduleEntry> {
        self.entries
            .iter()
            .find(|e| t >= e.time_start && t < e.time_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_round_trip() {
        use std::str::FromStr;

        for activity in [
            Activity::Charge,
            Activity::ChargeSolarSurplus,
            Activity::ChargeLimit,
            Activity::Discharge,
            Activity::DischargeForHome,
            Activity::DischargeLimit,
            Activity::Idle,
        ] {
            assert_eq!(Activity::from_str(&activity.to_string()).unwrap(), activity);
        }
        assert!(Activity::from_str("sleep").is_err());
    }

    #[test]
    fn test_activity_serde_names() {
        let json = serde_json::to_string(&Activity::ChargeSolarSurplus).unwrap();
        assert_eq!(json, "\"charge_solar_surplus\"");
    }

    #[test]
    fn test_solve_status_display() {
        assert_eq!(SolveStatus::Optimal.to_string(), "optimal");
        assert_eq!(SolveStatus::Timeout.to_string(), "timeout");
    }
}
