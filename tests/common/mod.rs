#![allow(dead_code)]

use battery_scheduler::{
    BatteryConfig, ForecastSlot, ObjectiveWeights, OptimizeRequest, PriceCurve, PriceFees,
    Schedule,
};
use chrono::TimeZone;

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

pub fn horizon_start() -> chrono::DateTime<chrono::FixedOffset> {
    chrono::FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
        .unwrap()
}

/// 10 kWh battery at its 30% target, hourly slots, no fuse limit.
pub fn base_battery() -> BatteryConfig {
    BatteryConfig {
        capacity_wh: 10_000.0,
        initial_energy_wh: 3_000.0,
        max_charge_w: 5_000.0,
        max_discharge_w: 5_000.0,
        charge_efficiency: 0.95,
        target_soc_fraction: 0.30,
        min_soc_fraction: 0.07,
        slot_duration_minutes: 60,
        max_grid_power_w: None,
    }
}

pub fn request(spot_prices: Vec<f64>, forecast: Vec<(f64, f64)>) -> OptimizeRequest {
    assert_eq!(spot_prices.len(), forecast.len());
    OptimizeRequest {
        horizon_start: horizon_start(),
        forecast: forecast
            .into_iter()
            .map(|(production, consumption)| ForecastSlot::new(production, consumption))
            .collect(),
        prices: PriceCurve::new(spot_prices, PriceFees::default()),
        battery: base_battery(),
        ev: None,
        weights: ObjectiveWeights::default(),
    }
}

/// Check the physical invariants every solution must satisfy: per-slot
/// energy balance, the stored-energy transition chain, SOC bounds and no
/// simultaneous charge+discharge.
pub fn assert_physical(schedule: &Schedule, request: &OptimizeRequest) {
    let battery = &request.battery;
    let floor = battery.min_energy_wh();
    let mut previous_energy = battery.initial_energy_wh;

    for entry in &schedule.entries {
        let slot = &request.forecast[entry.slot];

        let balance = slot.production_wh + entry.grid_import_wh + entry.battery_discharge_wh
            - slot.consumption_wh
            - entry.battery_charge_wh
            - entry.grid_export_wh
            - entry.ev_charge_wh;
        assert!(
            balance.abs() < 1e-3,
            "slot {}: energy balance off by {balance} Wh",
            entry.slot
        );

        let expected_energy = previous_energy
            + battery.charge_efficiency * entry.battery_charge_wh
            - entry.battery_discharge_wh;
        assert!(
            (entry.battery_energy_wh - expected_energy).abs() < 1e-3,
            "slot {}: stored energy {} does not follow transition to {}",
            entry.slot,
            entry.battery_energy_wh,
            expected_energy
        );
        previous_energy = entry.battery_energy_wh;

        assert!(
            entry.battery_energy_wh >= floor - 1e-3
                && entry.battery_energy_wh <= battery.capacity_wh + 1e-3,
            "slot {}: stored energy {} outside [{floor}, {}]",
            entry.slot,
            entry.battery_energy_wh,
            battery.capacity_wh
        );

        assert!(
            !(entry.battery_charge_wh > 1.0 && entry.battery_discharge_wh > 1.0),
            "slot {}: simultaneous charge ({} Wh) and discharge ({} Wh)",
            entry.slot,
            entry.battery_charge_wh,
            entry.battery_discharge_wh
        );
    }
}
