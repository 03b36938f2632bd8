//! Input validation for the schedule optimizer.
//!
//! Every check here runs before a solve is attempted; malformed input is
//! rejected with a typed error and never silently clamped. By construction,
//! input that passes validation can only fail later in the solve step
//! itself (infeasibility, timeout).

use thiserror::Error;

use super::battery::{BatteryConfig, EvChargePlan};
use super::forecast::ForecastSlot;
use super::prices::PriceCurve;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("price curve has {prices} slots but forecast has {forecast}")]
    MismatchedLengths { prices: usize, forecast: usize },
    #[error("battery capacity must be positive, got {0} Wh")]
    NonPositiveCapacity(f64),
    #[error("SOC fractions must satisfy 0 <= min ({min}) <= target ({target}) <= 1")]
    SocFractionOrder { min: f64, target: f64 },
    #[error("charge efficiency must be in (0, 1], got {0}")]
    EfficiencyOutOfRange(f64),
    #[error("initial energy {initial} Wh outside [{floor}, {capacity}] Wh")]
    InitialEnergyOutOfRange {
        initial: f64,
        floor: f64,
        capacity: f64,
    },
    #[error("max charge power must be positive and finite, got {0} W")]
    InvalidChargePower(f64),
    #[error("max discharge power must be positive and finite, got {0} W")]
    InvalidDischargePower(f64),
    #[error("slot duration must be positive")]
    InvalidSlotDuration,
    #[error("grid power limit must be positive and finite, got {0} W")]
    InvalidGridLimit(f64),
    #[error("spot price at slot {slot} is not finite")]
    NonFiniteSpotPrice { slot: usize },
    #[error("price fee addons must be finite")]
    NonFinitePriceFees,
    #[error("forecast at slot {slot} must be finite and non-negative")]
    InvalidForecast { slot: usize },
    #[error("EV capacity must be positive, got {0} Wh")]
    InvalidEvCapacity(f64),
    #[error("EV initial energy {initial} Wh outside [0, {capacity}] Wh")]
    EvInitialEnergyOutOfRange { initial: f64, capacity: f64 },
    #[error("EV charge power must be positive and finite, got {0} W")]
    InvalidEvChargePower(f64),
    #[error("EV target SOC fraction must be in (0, 1], got {0}")]
    InvalidEvTargetSoc(f64),
    #[error("{name} weight must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
}

pub fn validate_battery(config: &BatteryConfig) -> Result<(), ValidationError> {
    if !(config.capacity_wh > 0.0 && config.capacity_wh.is_finite()) {
        return Err(ValidationError::NonPositiveCapacity(config.capacity_wh));
    }
    if !(config.min_soc_fraction >= 0.0
        && config.min_soc_fraction <= config.target_soc_fraction
        && config.target_soc_fraction <= 1.0)
    {
        return Err(ValidationError::SocFractionOrder {
            min: config.min_soc_fraction,
            target: config.target_soc_fraction,
        });
    }
    if !(config.charge_efficiency > 0.0 && config.charge_efficiency <= 1.0) {
        return Err(ValidationError::EfficiencyOutOfRange(
            config.charge_efficiency,
        ));
    }
    if !(config.max_charge_w > 0.0 && config.max_charge_w.is_finite()) {
        return Err(ValidationError::InvalidChargePower(config.max_charge_w));
    }
    if !(config.max_discharge_w > 0.0 && config.max_discharge_w.is_finite()) {
        return Err(ValidationError::InvalidDischargePower(
            config.max_discharge_w,
        ));
    }
    if config.slot_duration_minutes == 0 {
        return Err(ValidationError::InvalidSlotDuration);
    }
    let floor = config.min_energy_wh();
    if !(config.initial_energy_wh >= floor && config.initial_energy_wh <= config.capacity_wh) {
        return Err(ValidationError::InitialEnergyOutOfRange {
            initial: config.initial_energy_wh,
            floor,
            capacity: config.capacity_wh,
        });
    }
    if let Some(limit) = config.max_grid_power_w {
        if !(limit > 0.0 && limit.is_finite()) {
            return Err(ValidationError::InvalidGridLimit(limit));
        }
    }
    Ok(())
}

pub fn validate_ev(plan: &EvChargePlan) -> Result<(), ValidationError> {
    if !(plan.capacity_wh > 0.0 && plan.capacity_wh.is_finite()) {
        return Err(ValidationError::InvalidEvCapacity(plan.capacity_wh));
    }
    if !(plan.initial_energy_wh >= 0.0 && plan.initial_energy_wh <= plan.capacity_wh) {
        return Err(ValidationError::EvInitialEnergyOutOfRange {
            initial: plan.initial_energy_wh,
            capacity: plan.capacity_wh,
        });
    }
    if !(plan.max_charge_w > 0.0 && plan.max_charge_w.is_finite()) {
        return Err(ValidationError::InvalidEvChargePower(plan.max_charge_w));
    }
    if !(plan.target_soc_fraction > 0.0 && plan.target_soc_fraction <= 1.0) {
        return Err(ValidationError::InvalidEvTargetSoc(plan.target_soc_fraction));
    }
    if !(plan.deficit_penalty_per_wh >= 0.0 && plan.deficit_penalty_per_wh.is_finite()) {
        return Err(ValidationError::InvalidWeight {
            name: "ev deficit penalty",
            value: plan.deficit_penalty_per_wh,
        });
    }
    Ok(())
}

pub fn validate_prices(prices: &PriceCurve) -> Result<(), ValidationError> {
    for (slot, spot) in prices.spot_prices.iter().enumerate() {
        if !spot.is_finite() {
            return Err(ValidationError::NonFiniteSpotPrice { slot });
        }
    }
    if !(prices.fees.buy_addon.is_finite() && prices.fees.sell_addon.is_finite()) {
        return Err(ValidationError::NonFinitePriceFees);
    }
    Ok(())
}

pub fn validate_forecast(forecast: &[ForecastSlot]) -> Result<(), ValidationError> {
    for (slot, entry) in forecast.iter().enumerate() {
        let production_ok = entry.production_wh.is_finite() && entry.production_wh >= 0.0;
        let consumption_ok = entry.consumption_wh.is_finite() && entry.consumption_wh >= 0.0;
        if !production_ok || !consumption_ok {
            return Err(ValidationError::InvalidForecast { slot });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prices::PriceFees;

    #[test]
    fn test_default_battery_is_valid() {
        assert!(validate_battery(&BatteryConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_positive_capacity() {
        let config = BatteryConfig {
            capacity_wh: 0.0,
            ..BatteryConfig::default()
        };
        assert_eq!(
            validate_battery(&config),
            Err(ValidationError::NonPositiveCapacity(0.0))
        );
    }

    #[test]
    fn test_rejects_min_soc_above_target() {
        let config = BatteryConfig {
            min_soc_fraction: 0.5,
            target_soc_fraction: 0.3,
            initial_energy_wh: 30_000.0,
            ..BatteryConfig::default()
        };
        assert!(matches!(
            validate_battery(&config),
            Err(ValidationError::SocFractionOrder { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_efficiency() {
        for eta in [0.0, -0.5, 1.5, f64::NAN] {
            let config = BatteryConfig {
                charge_efficiency: eta,
                ..BatteryConfig::default()
            };
            assert!(matches!(
                validate_battery(&config),
                Err(ValidationError::EfficiencyOutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_rejects_initial_energy_below_floor() {
        let config = BatteryConfig {
            capacity_wh: 10_000.0,
            min_soc_fraction: 0.2,
            initial_energy_wh: 1_000.0,
            ..BatteryConfig::default()
        };
        assert!(matches!(
            validate_battery(&config),
            Err(ValidationError::InitialEnergyOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_slot_duration() {
        let config = BatteryConfig {
            slot_duration_minutes: 0,
            ..BatteryConfig::default()
        };
        assert_eq!(
            validate_battery(&config),
            Err(ValidationError::InvalidSlotDuration)
        );
    }

    #[test]
    fn test_rejects_negative_forecast() {
        let forecast = vec![
            ForecastSlot::new(100.0, 200.0),
            ForecastSlot::new(-1.0, 200.0),
        ];
        assert_eq!(
            validate_forecast(&forecast),
            Err(ValidationError::InvalidForecast { slot: 1 })
        );
    }

    #[test]
    fn test_rejects_non_finite_spot_price() {
        let prices = PriceCurve::new(vec![1.0, f64::INFINITY], PriceFees::default());
        assert_eq!(
            validate_prices(&prices),
            Err(ValidationError::NonFiniteSpotPrice { slot: 1 })
        );
    }

    #[test]
    fn test_rejects_invalid_ev_plan() {
        let mut plan = EvChargePlan::new(60_000.0, 70_000.0, 11_000.0);
        assert!(matches!(
            validate_ev(&plan),
            Err(ValidationError::EvInitialEnergyOutOfRange { .. })
        ));

        plan.initial_energy_wh = 10_000.0;
        plan.target_soc_fraction = 0.0;
        assert!(matches!(
            validate_ev(&plan),
            Err(ValidationError::InvalidEvTargetSoc(_))
        ));
    }
}
