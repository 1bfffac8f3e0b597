//! PII redaction and sanitized user context
//!
//! Nothing that leaves the process (backend prompts, audit records) carries raw
//! contact details or identifiers.

use crate::calculators::{ensure_non_negative, ensure_ratio, format_amount};
use crate::config::FinanceConfig;
use crate::models::{RiskTolerance, UserContext};
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex");
    static ref PHONE: Regex = Regex::new(r"\+?\d[\d -]{8,}\d").expect("valid phone regex");
}

/// Replace emails and phone-like digit runs with placeholders
pub fn redact_pii(text: &str) -> String {
    let without_email = EMAIL.replace_all(text, "[EMAIL]");
    PHONE.replace_all(&without_email, "[PHONE]").into_owned()
}

/// Reject a user context whose figures are out of domain
pub fn validate_user_context(ctx: &UserContext) -> Result<()> {
    if let Some(income) = ctx.monthly_income {
        ensure_non_negative("context.monthly_income", income)?;
    }
    ensure_non_negative("context.total_expenses", ctx.total_expenses)?;
    ensure_non_negative("context.total_debt_service", ctx.total_debt_service)?;
    if let Some(ratio) = ctx.fun_ratio {
        ensure_ratio("context.fun_ratio", ratio)?;
    }
    for (i, goal) in ctx.goals.iter().enumerate() {
        ensure_non_negative(&format!("context.goals[{}].target_amount", i), goal.target_amount)?;
        ensure_non_negative(&format!("context.goals[{}].saved_amount", i), goal.saved_amount)?;
    }
    Ok(())
}

/// Amount-only view of a [`UserContext`]. Goal names and any other free text
/// are dropped here, so generators never receive them.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedContext {
    pub monthly_income: Option<f64>,
    pub total_expenses: f64,
    pub total_debt_service: f64,
    /// Effective ratio: the user's override when in range, else the configured one
    pub fun_ratio: f64,
    pub goal_count: usize,
    pub goal_target: f64,
    pub goal_saved: f64,
    pub risk_tolerance: Option<RiskTolerance>,
}

impl SanitizedContext {
    pub fn new(ctx: &UserContext, config: &FinanceConfig) -> Self {
        let fun_ratio = ctx
            .fun_ratio
            .filter(|ratio| ensure_ratio("fun_ratio", *ratio).is_ok())
            .unwrap_or(config.fun_ratio);

        Self {
            monthly_income: ctx.monthly_income.filter(|income| income.is_finite()),
            total_expenses: ctx.total_expenses,
            total_debt_service: ctx.total_debt_service,
            fun_ratio,
            goal_count: ctx.goals.len(),
            goal_target: ctx.goals.iter().map(|g| g.target_amount).sum(),
            goal_saved: ctx.goals.iter().map(|g| g.saved_amount).sum(),
            risk_tolerance: ctx.risk_tolerance,
        }
    }

    pub fn surplus(&self) -> Option<f64> {
        self.monthly_income
            .map(|income| income - self.total_expenses - self.total_debt_service)
    }

    /// Prompt-ready summary of the user's position
    pub fn summary(&self) -> String {
        let Some(income) = self.monthly_income else {
            return "User Financial Summary: not provided".to_string();
        };

        let risk = self
            .risk_tolerance
            .map(|r| r.to_string())
            .unwrap_or_else(|| "Not set".to_string());

        [
            "User Financial Summary:".to_string(),
            format!("- Monthly Income: {}", format_amount(income)),
            format!("- Total Monthly Expenses: {}", format_amount(self.total_expenses)),
            format!(
                "- Total Monthly Debt Payments (EMI): {}",
                format_amount(self.total_debt_service)
            ),
            format!(
                "- Surplus: {}",
                format_amount(income - self.total_expenses - self.total_debt_service)
            ),
            format!(
                "- Fun Budget Allocation: {} ({:.0}% of income)",
                format_amount(income * self.fun_ratio),
                self.fun_ratio * 100.0
            ),
            format!(
                "- Goals: {} active (Target: {}, Saved: {})",
                self.goal_count,
                format_amount(self.goal_target),
                format_amount(self.goal_saved)
            ),
            format!("- Risk Tolerance: {}", risk),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalSnapshot, RiskTolerance};

    #[test]
    fn test_redacts_email_and_phone() {
        let redacted = redact_pii("mail me at rahim.k@example.com or call +880 1712-345678");
        assert_eq!(redacted, "mail me at [EMAIL] or call [PHONE]");
    }

    #[test]
    fn test_keeps_ordinary_amounts() {
        let text = "Can I afford a 150000 loan at 9% for 36 months?";
        assert_eq!(redact_pii(text), text);
    }

    #[test]
    fn test_context_summary() {
        let ctx = UserContext {
            monthly_income: Some(50_000.0),
            total_expenses: 20_000.0,
            total_debt_service: 10_000.0,
            fun_ratio: None,
            goals: vec![GoalSnapshot {
                name: "wedding for jane@example.com".into(),
                target_amount: 200_000.0,
                saved_amount: 50_000.0,
            }],
            risk_tolerance: Some(RiskTolerance::Medium),
        };

        let summary = SanitizedContext::new(&ctx, &FinanceConfig::default()).summary();
        assert!(summary.contains("- Monthly Income: 50,000.00"));
        assert!(summary.contains("- Surplus: 20,000.00"));
        assert!(summary.contains("- Fun Budget Allocation: 7,500.00 (15% of income)"));
        assert!(summary.contains("- Goals: 1 active (Target: 200,000.00, Saved: 50,000.00)"));
        assert!(summary.contains("- Risk Tolerance: Medium"));
        assert!(!summary.contains("jane"));
    }

    #[test]
    fn test_out_of_range_fun_ratio_is_ignored() {
        let ctx = UserContext {
            monthly_income: Some(50_000.0),
            fun_ratio: Some(2.5),
            ..UserContext::default()
        };

        let summary = SanitizedContext::new(&ctx, &FinanceConfig::default()).summary();
        assert!(summary.contains("- Fun Budget Allocation: 7,500.00 (15% of income)"));
        assert!(!summary.contains("250%"));
    }

    #[test]
    fn test_validate_user_context() {
        assert!(validate_user_context(&UserContext::default()).is_ok());

        let bad_ratio = UserContext {
            fun_ratio: Some(2.5),
            ..UserContext::default()
        };
        let err = validate_user_context(&bad_ratio).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: context.fun_ratio must be between 0 and 1"
        );

        let negative_income = UserContext {
            monthly_income: Some(-1.0),
            ..UserContext::default()
        };
        assert!(validate_user_context(&negative_income).is_err());

        let bad_goal = UserContext {
            goals: vec![GoalSnapshot {
                name: "car".into(),
                target_amount: f64::NAN,
                saved_amount: 0.0,
            }],
            ..UserContext::default()
        };
        assert!(validate_user_context(&bad_goal).is_err());
    }

    #[test]
    fn test_missing_income() {
        let summary = SanitizedContext::new(&UserContext::default(), &FinanceConfig::default()).summary();
        assert_eq!(summary, "User Financial Summary: not provided");
    }
}
