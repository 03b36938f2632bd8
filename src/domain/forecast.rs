use serde::{Deserialize, Serialize};

/// Forecasted energy flows for one time slot, in Wh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForecastSlot {
    pub production_wh: f64,
    pub consumption_wh: f64,
}

impl ForecastSlot {
    pub fn new(production_wh: f64, consumption_wh: f64) -> Self {
        Self {
            production_wh,
            consumption_wh,
        }
    }

    /// Production minus consumption; positive when there is solar surplus.
    pub fn surplus_wh(&self) -> f64 {
        self.production_wh - self.consumption_wh
    }
}
