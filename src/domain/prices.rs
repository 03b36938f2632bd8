use serde::{Deserialize, Serialize};

/// Fixed fee addons applied on top of the spot price, in currency per kWh.
///
/// The buy addon covers delivery fee plus energy tax; the sell addon covers
/// the grid-benefit compensation plus the tax refund. With any realistic fee
/// structure `buy_addon > sell_addon`, so `buy_price >= sell_price` in every
/// slot. That relationship is a configuration assumption the optimizer
/// relies on for charge/discharge exclusivity - it is documented here, not
/// enforced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceFees {
    pub buy_addon: f64,
    pub sell_addon: f64,
}

impl Default for PriceFees {
    fn default() -> Self {
        Self {
            buy_addon: 0.95,  // 0.40 delivery + 0.55 tax
            sell_addon: 0.68, // 0.08 grid benefit + 0.60 tax refund
        }
    }
}

/// Per-slot spot prices with the fee structure that turns them into
/// effective buy and sell prices. Prices are in currency per kWh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCurve {
    pub spot_prices: Vec<f64>,
    pub fees: PriceFees,
}

impl PriceCurve {
    pub fn new(spot_prices: Vec<f64>, fees: PriceFees) -> Self {
        Self { spot_prices, fees }
    }

    pub fn len(&self) -> usize {
        self.spot_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spot_prices.is_empty()
    }

    /// Effective price paid per kWh imported in slot `t`.
    pub fn buy_price(&self, t: usize) -> f64 {
        self.spot_prices[t] + self.fees.buy_addon
    }

    /// Effective price received per kWh exported in slot `t`.
    pub fn sell_price(&self, t: usize) -> f64 {
        self.spot_prices[t] + self.fees.sell_addon
    }

    pub fn buy_price_per_wh(&self, t: usize) -> f64 {
        self.buy_price(t) / 1000.0
    }

    pub fn sell_price_per_wh(&self, t: usize) -> f64 {
        self.sell_price(t) / 1000.0
    }

    /// Largest realizable buy/sell spread over the horizon, per Wh. The SOC
    /// deficit penalty should stay below this or it dominates every
    /// scheduling decision.
    pub fn max_arbitrage_margin_per_wh(&self) -> f64 {
        if self.spot_prices.is_empty() {
            return 0.0;
        }
        let max_buy = self
            .spot_prices
            .iter()
            .map(|s| s + self.fees.buy_addon)
            .fold(f64::NEG_INFINITY, f64::max);
        let min_sell = self
            .spot_prices
            .iter()
            .map(|s| s + self.fees.sell_addon)
            .fold(f64::INFINITY, f64::min);
        (max_buy - min_sell) / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_and_sell_prices() {
        let curve = PriceCurve::new(vec![0.5, 2.0], PriceFees::default());
        assert!((curve.buy_price(0) - 1.45).abs() < 1e-9);
        assert!((curve.buy_price(1) - 2.95).abs() < 1e-9);
        assert!((curve.sell_price(0) - 1.18).abs() < 1e-9);
        assert!((curve.sell_price(1) - 2.68).abs() < 1e-9);
    }

    #[test]
    fn test_per_wh_conversion() {
        let curve = PriceCurve::new(vec![1.0], PriceFees::default());
        assert!((curve.buy_price_per_wh(0) - 0.00195).abs() < 1e-12);
    }

    #[test]
    fn test_max_arbitrage_margin() {
        let curve = PriceCurve::new(vec![0.5, 2.0], PriceFees::default());
        // max buy 2.95, min sell 1.18
        assert!((curve.max_arbitrage_margin_per_wh() - 0.00177).abs() < 1e-9);

        let empty = PriceCurve::new(vec![], PriceFees::default());
        assert_eq!(empty.max_arbitrage_margin_per_wh(), 0.0);
    }
}
