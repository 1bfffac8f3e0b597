//! Templated responses (mock mode and fallback)

use super::{refusal_message, GenerationRequest, ResponseGenerator};
use crate::calculators::format_amount;
use crate::config::FinanceConfig;
use crate::models::{AdvisorIntent, ResponseSource};
use crate::privacy::SanitizedContext;
use crate::Result;
use async_trait::async_trait;

/// Deterministic answers with the user's own numbers substituted in
pub struct TemplateGenerator {
    finance: FinanceConfig,
}

impl TemplateGenerator {
    pub fn new(finance: FinanceConfig) -> Self {
        Self { finance }
    }

    pub fn render(&self, request: &GenerationRequest<'_>) -> String {
        let mut text = match request.intent {
            AdvisorIntent::BudgetHelp => BUDGET.to_string(),
            AdvisorIntent::LoanQuestion => LOAN.replace(
                "{max_dti_pct}",
                &format!("{:.0}", self.finance.max_dti_ratio * 100.0),
            ),
            AdvisorIntent::GoalPlanning => GOALS.to_string(),
            AdvisorIntent::SpendingQuery => SPENDING.to_string(),
            AdvisorIntent::GeneralAdvice => GENERAL.to_string(),
            blocked => return refusal_message(blocked).to_string(),
        };

        if let Some(personal) = self.personalize(request.intent, request.context) {
            text.push_str("\n\n");
            text.push_str(&personal);
        }

        text
    }

    fn personalize(&self, intent: AdvisorIntent, ctx: &SanitizedContext) -> Option<String> {
        let income = ctx.monthly_income.filter(|income| *income > 0.0)?;
        let surplus = ctx.surplus()?;

        match intent {
            AdvisorIntent::BudgetHelp => {
                let ratio = ctx.fun_ratio;
                Some(format!(
                    "Your numbers: surplus {} per month; a {:.0}% fun budget would be {}.",
                    format_amount(surplus),
                    ratio * 100.0,
                    format_amount(income * ratio)
                ))
            }
            AdvisorIntent::LoanQuestion => {
                let cap = income * self.finance.max_dti_ratio;
                Some(format!(
                    "Your numbers: current DTI {:.1}%; total EMIs up to {} keep you within the cap, \
                     leaving {} for a new loan.",
                    ctx.total_debt_service / income * 100.0,
                    format_amount(cap),
                    format_amount((cap - ctx.total_debt_service).max(0.0))
                ))
            }
            AdvisorIntent::GoalPlanning if ctx.goal_count > 0 => {
                let target = ctx.goal_target;
                let saved = ctx.goal_saved;
                let progress = if target > 0.0 { saved / target * 100.0 } else { 0.0 };
                Some(format!(
                    "Your numbers: {} goal(s), {:.1}% funded ({} of {}).",
                    ctx.goal_count,
                    progress,
                    format_amount(saved),
                    format_amount(target)
                ))
            }
            AdvisorIntent::SpendingQuery => {
                let reserve = if surplus > 0.0 {
                    surplus * self.finance.goal_allocation_ratio
                } else {
                    0.0
                };
                Some(format!(
                    "Your numbers: about {} is safe to spend this month after bills, debt and a \
                     {:.0}% goal reserve.",
                    format_amount((surplus - reserve).max(0.0)),
                    self.finance.goal_allocation_ratio * 100.0
                ))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl ResponseGenerator for TemplateGenerator {
    fn name(&self) -> &'static str {
        "template"
    }

    fn source(&self) -> ResponseSource {
        ResponseSource::Template
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        Ok(self.render(request))
    }
}

const BUDGET: &str = "Here's a simple way to structure your budget:\n\n\
1. Track all expenses, fixed and variable\n\
2. Aim to keep essential expenses below 50% of income\n\
3. Allocate 20% to savings and goals\n\
4. Keep discretionary spending around 15-20%\n\n\
Safe-to-spend = Income - Bills - Debt payments - Goal allocations";

const LOAN: &str = "When considering a loan:\n\n\
1. Keep your DTI (Debt-to-Income) ratio at or below {max_dti_pct}%\n\
2. EMI formula: P x r x (1+r)^n / ((1+r)^n - 1)\n   \
where P = principal, r = monthly rate, n = months\n\
3. Compare offers from multiple lenders\n\
4. Stress-test the payment: +2% rate, -10% income\n\n\
Estimates are illustrative; approval and terms are set by licensed lenders.";

const GOALS: &str = "Tips for reaching your financial goals:\n\n\
1. Set specific, measurable targets with deadlines\n\
2. Automate savings (pay yourself first)\n\
3. Prioritize: emergency fund, then debt, then long-term goals\n\
4. Review progress monthly and adjust";

const SPENDING: &str = "Before a purchase, check what is safe to spend:\n\n\
1. Start from this month's income\n\
2. Subtract bills and minimum debt payments\n\
3. Set aside your goal contributions\n\
4. What remains is safe to spend; keep a buffer for surprises";

const GENERAL: &str = "I can help with:\n\
- Budget planning and expense tracking\n\
- Loan affordability estimates\n\
- Inflation projections for essential expenses\n\
- Goal setting and savings strategies\n\n\
What would you like to know more about?";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalSnapshot, UserContext};

    fn render(intent: AdvisorIntent, user: &UserContext) -> String {
        let config = FinanceConfig::default();
        let context = SanitizedContext::new(user, &config);
        let generator = TemplateGenerator::new(config);
        generator.render(&GenerationRequest {
            intent,
            query: "q",
            context: &context,
            context_summary: "",
        })
    }

    fn user() -> UserContext {
        UserContext {
            monthly_income: Some(50_000.0),
            total_expenses: 20_000.0,
            total_debt_service: 10_000.0,
            fun_ratio: None,
            goals: vec![GoalSnapshot {
                name: "car".into(),
                target_amount: 40_000.0,
                saved_amount: 10_000.0,
            }],
            risk_tolerance: None,
        }
    }

    #[test]
    fn test_loan_template_uses_threshold_and_numbers() {
        let text = render(AdvisorIntent::LoanQuestion, &user());
        assert!(text.contains("at or below 40%"));
        assert!(text.contains("current DTI 20.0%"));
        assert!(text.contains("leaving 10,000.00 for a new loan"));
    }

    #[test]
    fn test_budget_template_substitutes_fun_budget() {
        let text = render(AdvisorIntent::BudgetHelp, &user());
        assert!(text.contains("a 15% fun budget would be 7,500.00"));
    }

    #[test]
    fn test_out_of_range_fun_ratio_falls_back_to_default() {
        let user = UserContext {
            fun_ratio: Some(2.5),
            ..user()
        };
        let text = render(AdvisorIntent::BudgetHelp, &user);
        assert!(text.contains("a 15% fun budget would be 7,500.00"));
        assert!(!text.contains("250%"));
    }

    #[test]
    fn test_spending_and_goals() {
        let spending = render(AdvisorIntent::SpendingQuery, &user());
        assert!(spending.contains("about 16,000.00 is safe to spend"));

        let goals = render(AdvisorIntent::GoalPlanning, &user());
        assert!(goals.contains("1 goal(s), 25.0% funded"));
    }

    #[test]
    fn test_generic_without_context() {
        let text = render(AdvisorIntent::BudgetHelp, &UserContext::default());
        assert!(!text.contains("Your numbers"));
    }

    #[test]
    fn test_blocked_intent_renders_refusal() {
        let text = render(AdvisorIntent::LoanApproval, &user());
        assert!(text.starts_with("Peak Finance cannot approve"));
    }
}
