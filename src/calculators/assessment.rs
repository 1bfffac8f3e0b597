//! Loan pre-assessment
//!
//! Composes EMI and DTI for a proposed loan and searches for the largest
//! principal that keeps DTI at the configured threshold. Educational estimate
//! only: approval is never implied.

use super::{dti, emi, emi_unchecked, ensure_non_negative, ensure_positive, ensure_term};
use crate::config::FinanceConfig;
use crate::error::FinanceError;
use crate::models::{IncomeExpenseSnapshot, LoanPreAssessment, LoanTerms, StressTestResult};
use crate::Result;
use tracing::debug;

const STRESS_RATE_BUMP_PCT: f64 = 2.0;
const STRESS_INCOME_FACTOR: f64 = 0.9;

/// Outcome of the break-even principal search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakEven {
    pub principal: f64,
    pub iterations: u32,
}

/// Bisection over principal for `(existing_debt + EMI(p)) / income == threshold`.
///
/// EMI is increasing in principal and `EMI(p) >= p / term`, so the root lies in
/// `[0, target_emi * term]`. The search stops after `search_max_iterations`
/// halvings or once the bracket is narrower than `search_tolerance`, whichever
/// comes first; with the defaults (50, 0.01) any bracket below ~1.1e13 stops on
/// tolerance. The lower bracket end is returned so the resulting DTI never
/// exceeds the threshold.
pub fn max_affordable_principal(
    monthly_income: f64,
    existing_debt_service: f64,
    annual_rate_pct: f64,
    term_months: u32,
    config: &FinanceConfig,
) -> Result<BreakEven> {
    ensure_positive("monthly_income", monthly_income)?;
    ensure_non_negative("existing_debt_service", existing_debt_service)?;
    ensure_non_negative("annual_rate_pct", annual_rate_pct)?;
    ensure_term("term_months", term_months)?;
    let threshold = validate_threshold(config)?;

    let target_emi = monthly_income * threshold - existing_debt_service;
    if target_emi <= 0.0 {
        return Ok(BreakEven {
            principal: 0.0,
            iterations: 0,
        });
    }

    let within_threshold = |principal: f64| {
        (existing_debt_service + emi_unchecked(principal, annual_rate_pct, term_months))
            / monthly_income
            <= threshold
    };

    let mut lo = 0.0_f64;
    let mut hi = target_emi * f64::from(term_months);
    let mut iterations = 0;

    while iterations < config.search_max_iterations && hi - lo > config.search_tolerance {
        let mid = lo + (hi - lo) / 2.0;
        if within_threshold(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
        iterations += 1;
    }

    debug!(
        principal = lo,
        iterations,
        bracket = hi - lo,
        "Break-even principal search finished"
    );

    Ok(BreakEven {
        principal: lo,
        iterations,
    })
}

/// Affordability of `terms` against the borrower's current obligations.
pub fn loan_pre_assessment(
    terms: &LoanTerms,
    snapshot: &IncomeExpenseSnapshot,
    config: &FinanceConfig,
) -> Result<LoanPreAssessment> {
    validate_snapshot(snapshot)?;
    let threshold = validate_threshold(config)?;

    let income = snapshot.monthly_income;
    let existing = snapshot.debt_service;

    let payment = emi(terms.principal, terms.annual_rate_pct, terms.term_months)?;
    let resulting_dti = dti(existing + payment, income)?;
    let break_even =
        max_affordable_principal(income, existing, terms.annual_rate_pct, terms.term_months, config)?;

    let stress_tests = vec![
        rate_shock(terms, snapshot, threshold, config)?,
        income_shock(terms, snapshot, payment, threshold, config)?,
    ];

    Ok(LoanPreAssessment {
        emi: payment,
        resulting_dti,
        affordable: resulting_dti <= threshold,
        max_affordable_principal: break_even.principal,
        affordable_emi_cap: (income * threshold - existing).max(0.0),
        search_iterations: break_even.iterations,
        stress_tests,
    })
}

fn rate_shock(
    terms: &LoanTerms,
    snapshot: &IncomeExpenseSnapshot,
    threshold: f64,
    config: &FinanceConfig,
) -> Result<StressTestResult> {
    let rate = terms.annual_rate_pct + STRESS_RATE_BUMP_PCT;
    let payment = emi(terms.principal, rate, terms.term_months)?;
    let stressed_dti = dti(snapshot.debt_service + payment, snapshot.monthly_income)?;
    let break_even = max_affordable_principal(
        snapshot.monthly_income,
        snapshot.debt_service,
        rate,
        terms.term_months,
        config,
    )?;

    Ok(StressTestResult {
        scenario: "Interest rate +2%".to_string(),
        emi: payment,
        dti: stressed_dti,
        affordable: stressed_dti <= threshold,
        max_affordable_principal: break_even.principal,
    })
}

fn income_shock(
    terms: &LoanTerms,
    snapshot: &IncomeExpenseSnapshot,
    payment: f64,
    threshold: f64,
    config: &FinanceConfig,
) -> Result<StressTestResult> {
    let income = snapshot.monthly_income * STRESS_INCOME_FACTOR;
    let stressed_dti = dti(snapshot.debt_service + payment, income)?;
    let break_even = max_affordable_principal(
        income,
        snapshot.debt_service,
        terms.annual_rate_pct,
        terms.term_months,
        config,
    )?;

    Ok(StressTestResult {
        scenario: "Income -10%".to_string(),
        emi: payment,
        dti: stressed_dti,
        affordable: stressed_dti <= threshold,
        max_affordable_principal: break_even.principal,
    })
}

fn validate_snapshot(snapshot: &IncomeExpenseSnapshot) -> Result<()> {
    ensure_positive("monthly_income", snapshot.monthly_income)?;
    ensure_non_negative("fixed_expenses", snapshot.fixed_expenses)?;
    ensure_non_negative("variable_expenses", snapshot.variable_expenses)?;
    ensure_non_negative("debt_service", snapshot.debt_service)?;
    Ok(())
}

fn validate_threshold(config: &FinanceConfig) -> Result<f64> {
    let threshold = config.max_dti_ratio;
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(FinanceError::invalid("max_dti_ratio", "must be positive"));
    }
    if !config.search_tolerance.is_finite() || config.search_tolerance <= 0.0 {
        return Err(FinanceError::invalid("search_tolerance", "must be positive"));
    }
    Ok(threshold)
}
