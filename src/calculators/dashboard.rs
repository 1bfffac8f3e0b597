//! Dashboard summary of a user's monthly position

use super::{dti, ensure_non_negative, fun_budget, round_to};
use crate::config::FinanceConfig;
use crate::models::{DashboardInput, DashboardSummary};
use crate::Result;

pub fn dashboard_summary(input: &DashboardInput, config: &FinanceConfig) -> Result<DashboardSummary> {
    ensure_non_negative("monthly_income", input.monthly_income)?;
    ensure_non_negative("principal_remaining", input.principal_remaining)?;
    for amount in &input.expenses {
        ensure_non_negative("expenses", *amount)?;
    }
    for amount in &input.debt_emis {
        ensure_non_negative("debt_emis", *amount)?;
    }
    for goal in &input.goals {
        ensure_non_negative(&format!("{}.target_amount", goal.name), goal.target_amount)?;
        ensure_non_negative(&format!("{}.saved_amount", goal.name), goal.saved_amount)?;
    }

    let income = input.monthly_income;
    let total_expenses: f64 = input.expenses.iter().sum();
    let total_debt_emi: f64 = input.debt_emis.iter().sum();
    let surplus = income - total_expenses - total_debt_emi;

    let dti_ratio = if income > 0.0 {
        Some(dti(total_debt_emi, income)?)
    } else {
        None
    };

    let goal_allocation = if surplus > 0.0 {
        surplus * config.goal_allocation_ratio
    } else {
        0.0
    };
    let safe_to_spend = (surplus - goal_allocation).max(0.0);

    let fun = fun_budget(income, input.fun_ratio.unwrap_or(config.fun_ratio))?;

    let total_target: f64 = input.goals.iter().map(|g| g.target_amount).sum();
    let total_saved: f64 = input.goals.iter().map(|g| g.saved_amount).sum();
    let goal_progress_pct = if total_target > 0.0 {
        total_saved / total_target * 100.0
    } else {
        0.0
    };

    // Rough ETA: remaining principal over current EMIs, ignoring interest
    let debt_payoff_eta_months = if total_debt_emi > 0.0 {
        Some((input.principal_remaining / total_debt_emi).floor() as u32)
    } else {
        None
    };

    Ok(DashboardSummary {
        total_income: round_to(income, 2),
        total_expenses: round_to(total_expenses, 2),
        surplus: round_to(surplus, 2),
        dti: dti_ratio.map(|r| round_to(r, 4)),
        safe_to_spend: round_to(safe_to_spend, 2),
        fun_budget: round_to(fun, 2),
        goal_progress_pct: round_to(goal_progress_pct, 2),
        debt_payoff_eta_months,
    })
}
