//! Financial calculators
//!
//! Closed-form formulas over validated scalar inputs. Every function is pure:
//! no I/O, no global state, same inputs always give the same output.
//! Out-of-domain parameters fail with `FinanceError::InvalidInput` instead of
//! producing NaN or infinity.

use crate::error::FinanceError;
use crate::Result;

pub mod assessment;
pub mod dashboard;
pub mod forecast;
pub mod payoff;

pub use assessment::{loan_pre_assessment, max_affordable_principal, BreakEven};
pub use dashboard::dashboard_summary;
pub use forecast::inflation_forecast;
pub use payoff::{loan_payoff_summary, payoff_plan};

/// Recognised share of income for discretionary spending
pub const DEFAULT_FUN_RATIO: f64 = 0.15;

//
// ================= Validation =================
//

pub(crate) fn ensure_finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FinanceError::invalid(field, "must be a finite number"))
    }
}

pub(crate) fn ensure_positive(field: &str, value: f64) -> Result<f64> {
    ensure_finite(field, value)?;
    if value <= 0.0 {
        return Err(FinanceError::invalid(field, "must be positive"));
    }
    Ok(value)
}

pub(crate) fn ensure_non_negative(field: &str, value: f64) -> Result<f64> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(FinanceError::invalid(field, "must not be negative"));
    }
    Ok(value)
}

pub(crate) fn ensure_term(field: &str, months: u32) -> Result<u32> {
    if months == 0 {
        return Err(FinanceError::invalid(field, "must be at least 1 month"));
    }
    Ok(months)
}

pub(crate) fn ensure_ratio(field: &str, ratio: f64) -> Result<f64> {
    ensure_finite(field, ratio)?;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(FinanceError::invalid(field, "must be between 0 and 1"));
    }
    Ok(ratio)
}

/// Results that overflow are reported against the inputs, never returned
pub(crate) fn ensure_result(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FinanceError::invalid(
            field,
            "is out of range for these inputs",
        ))
    }
}

//
// ================= Formulas =================
//

pub(crate) fn monthly_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 100.0 / 12.0
}

/// `1 - (1 + r)^-n`, evaluated through `ln_1p`/`exp_m1` so it neither collapses
/// to 0 for tiny rates nor overflows for long terms. `None` means the rate is
/// too small to register and the loan amortizes as if interest-free.
fn discount_factor(r: f64, n: f64) -> Option<f64> {
    if r == 0.0 {
        return None;
    }
    let factor = -(-n * r.ln_1p()).exp_m1();
    (factor > 0.0).then_some(factor)
}

/// EMI without validation. Callers guarantee principal ≥ 0, rate ≥ 0, term ≥ 1.
pub(crate) fn emi_unchecked(principal: f64, annual_rate_pct: f64, term_months: u32) -> f64 {
    let r = monthly_rate(annual_rate_pct);
    let n = f64::from(term_months);

    match discount_factor(r, n) {
        Some(factor) => principal * r / factor,
        None => principal / n,
    }
}

/// Equated monthly installment that fully amortizes `principal` over `term_months`.
pub fn emi(principal: f64, annual_rate_pct: f64, term_months: u32) -> Result<f64> {
    ensure_positive("principal", principal)?;
    ensure_non_negative("annual_rate_pct", annual_rate_pct)?;
    ensure_term("term_months", term_months)?;

    ensure_result("emi", emi_unchecked(principal, annual_rate_pct, term_months))
}

/// Principal that a given EMI can carry. Inverse of [`emi`].
pub fn principal_from_emi(emi: f64, annual_rate_pct: f64, term_months: u32) -> Result<f64> {
    ensure_non_negative("emi", emi)?;
    ensure_non_negative("annual_rate_pct", annual_rate_pct)?;
    ensure_term("term_months", term_months)?;

    let r = monthly_rate(annual_rate_pct);
    let n = f64::from(term_months);

    let principal = match discount_factor(r, n) {
        Some(factor) => emi * factor / r,
        None => emi * n,
    };
    ensure_result("principal", principal)
}

/// Debt-to-income ratio as a raw fraction. Threshold policy belongs to the caller.
pub fn dti(total_monthly_debt_service: f64, monthly_income: f64) -> Result<f64> {
    ensure_non_negative("total_monthly_debt_service", total_monthly_debt_service)?;
    ensure_positive("monthly_income", monthly_income)?;

    Ok(total_monthly_debt_service / monthly_income)
}

/// Income left after expenses and debt. Negative means overspending.
pub fn disposable_income(
    monthly_income: f64,
    fixed_expenses: f64,
    variable_expenses: f64,
    debt_service: f64,
) -> Result<f64> {
    ensure_non_negative("monthly_income", monthly_income)?;
    ensure_non_negative("fixed_expenses", fixed_expenses)?;
    ensure_non_negative("variable_expenses", variable_expenses)?;
    ensure_non_negative("debt_service", debt_service)?;

    Ok(monthly_income - fixed_expenses - variable_expenses - debt_service)
}

pub fn fun_budget(monthly_income: f64, ratio: f64) -> Result<f64> {
    ensure_non_negative("monthly_income", monthly_income)?;
    ensure_ratio("fun_ratio", ratio)?;

    Ok(monthly_income * ratio)
}

/// Value of `present_value` after `years` of compounding at `annual_rate_pct`.
pub fn inflation_adjusted_future_value(
    present_value: f64,
    annual_rate_pct: f64,
    years: f64,
) -> Result<f64> {
    ensure_finite("present_value", present_value)?;
    ensure_finite("annual_rate_pct", annual_rate_pct)?;
    ensure_non_negative("years", years)?;
    if annual_rate_pct <= -100.0 {
        return Err(FinanceError::invalid(
            "annual_rate_pct",
            "must be greater than -100",
        ));
    }

    ensure_result(
        "future_value",
        present_value * (1.0 + annual_rate_pct / 100.0).powf(years),
    )
}

//
// ================= Presentation =================
//

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `1234567.891` → `"1,234,567.89"`
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}
