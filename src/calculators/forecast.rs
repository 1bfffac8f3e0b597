//! Inflation forecast for essential expenses
//!
//! Base, optimistic (CPI − 2, floored at 0) and pessimistic (CPI + 3) projections.

use super::{ensure_finite, ensure_non_negative, inflation_adjusted_future_value, round_to};
use crate::models::{InflationForecast, InflationItem, InflationProjection};
use crate::Result;

const OPTIMISTIC_DELTA_PCT: f64 = -2.0;
const PESSIMISTIC_DELTA_PCT: f64 = 3.0;

pub fn inflation_forecast(
    items: &[InflationItem],
    cpi_rate: f64,
    years: f64,
) -> Result<InflationForecast> {
    ensure_finite("cpi_rate", cpi_rate)?;
    ensure_non_negative("years", years)?;
    for item in items {
        ensure_non_negative(&format!("{}.current_cost", item.name), item.current_cost)?;
        ensure_non_negative(&format!("{}.weight", item.name), item.weight)?;
    }

    let optimistic_rate = (cpi_rate + OPTIMISTIC_DELTA_PCT).max(0.0);
    let pessimistic_rate = cpi_rate + PESSIMISTIC_DELTA_PCT;

    let mut base_scenario = Vec::with_capacity(items.len());
    let mut optimistic_scenario = Vec::with_capacity(items.len());
    let mut pessimistic_scenario = Vec::with_capacity(items.len());
    let mut total_current = 0.0;
    let mut total_projected = 0.0;

    for item in items {
        let base = project(item, cpi_rate, years)?;
        total_current += item.current_cost * item.weight;
        total_projected += base.projected_cost * item.weight;

        base_scenario.push(base);
        optimistic_scenario.push(project(item, optimistic_rate, years)?);
        pessimistic_scenario.push(project(item, pessimistic_rate, years)?);
    }

    Ok(InflationForecast {
        base_scenario,
        optimistic_scenario,
        pessimistic_scenario,
        total_current: round_to(total_current, 2),
        total_projected: round_to(total_projected, 2),
    })
}

fn project(item: &InflationItem, rate: f64, years: f64) -> Result<InflationProjection> {
    let projected = inflation_adjusted_future_value(item.current_cost, rate, years)?;
    let increase_pct = if item.current_cost > 0.0 {
        (projected - item.current_cost) / item.current_cost * 100.0
    } else {
        0.0
    };

    Ok(InflationProjection {
        name: item.name.clone(),
        current_cost: round_to(item.current_cost, 2),
        projected_cost: round_to(projected, 2),
        increase_pct: round_to(increase_pct, 2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, cost: f64, weight: f64) -> InflationItem {
        InflationItem {
            name: name.to_string(),
            current_cost: cost,
            weight,
        }
    }

    #[test]
    fn test_three_scenarios() {
        let forecast = inflation_forecast(&[item("rent", 1000.0, 1.0)], 7.0, 5.0).unwrap();

        assert_eq!(forecast.base_scenario[0].projected_cost, 1402.55);
        assert_eq!(forecast.base_scenario[0].increase_pct, 40.26);
        // 5% and 10%
        assert_eq!(forecast.optimistic_scenario[0].projected_cost, 1276.28);
        assert_eq!(forecast.pessimistic_scenario[0].projected_cost, 1610.51);
    }

    #[test]
    fn test_optimistic_rate_floors_at_zero() {
        let forecast = inflation_forecast(&[item("groceries", 500.0, 1.0)], 1.0, 3.0).unwrap();
        assert_eq!(forecast.optimistic_scenario[0].projected_cost, 500.0);
        assert_eq!(forecast.optimistic_scenario[0].increase_pct, 0.0);
    }

    #[test]
    fn test_weighted_totals() {
        let forecast = inflation_forecast(
            &[item("rent", 1000.0, 1.0), item("school", 400.0, 0.5)],
            0.0,
            2.0,
        )
        .unwrap();

        assert_eq!(forecast.total_current, 1200.0);
        assert_eq!(forecast.total_projected, 1200.0);
    }

    #[test]
    fn test_zero_cost_item_has_zero_increase() {
        let forecast = inflation_forecast(&[item("free", 0.0, 1.0)], 7.0, 5.0).unwrap();
        assert_eq!(forecast.base_scenario[0].increase_pct, 0.0);
    }

    #[test]
    fn test_rejects_negative_years() {
        assert!(inflation_forecast(&[item("rent", 1000.0, 1.0)], 7.0, -2.0).is_err());
    }
}
