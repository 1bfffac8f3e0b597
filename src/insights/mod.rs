//! Insight engine
//!
//! Rules-based observations over a user's monthly snapshot.
//! Deterministic; no generation backend involved.

use crate::calculators::format_amount;
use crate::models::{DashboardInput, Insight, InsightCategory, Severity};
use std::cmp::Ordering;
use tracing::debug;

/// Aggregates every rule needs, computed once per evaluation
pub struct InsightContext<'a> {
    pub input: &'a DashboardInput,
    pub total_expenses: f64,
    pub total_debt_emi: f64,
    pub surplus: f64,
}

impl<'a> InsightContext<'a> {
    pub fn new(input: &'a DashboardInput) -> Self {
        let total_expenses: f64 = input.expenses.iter().sum();
        let total_debt_emi: f64 = input.debt_emis.iter().sum();

        Self {
            input,
            total_expenses,
            total_debt_emi,
            surplus: input.monthly_income - total_expenses - total_debt_emi,
        }
    }
}

/// Trait for insight rules
pub trait InsightRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Vec<Insight>;
}

/// Runs rules and orders the findings most severe first
pub struct InsightEngine {
    rules: Vec<Box<dyn InsightRule>>,
}

impl InsightEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn InsightRule>) {
        self.rules.push(rule);
    }

    pub fn evaluate(&self, input: &DashboardInput) -> Vec<Insight> {
        let ctx = InsightContext::new(input);
        let mut insights = Vec::new();

        for rule in &self.rules {
            let found = rule.evaluate(&ctx);
            debug!(rule = rule.name(), count = found.len(), "Insight rule evaluated");
            insights.extend(found);
        }

        // stable: rule order is kept within a severity
        insights.sort_by(|a, b| b.severity.cmp(&a.severity));
        insights
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

//
// ================= Severity Ordering =================
//

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl Severity {
    fn rank(&self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
        }
    }
}

//
// ================= Rules =================
//

/// Rule: flag deficits, acknowledge surpluses
pub struct CashFlowRule;

impl InsightRule for CashFlowRule {
    fn name(&self) -> &'static str {
        "cash_flow"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        if ctx.surplus < 0.0 {
            vec![Insight {
                category: InsightCategory::Budget,
                title: "Budget Deficit".to_string(),
                message: format!(
                    "You're spending {} more than you earn monthly. Consider reducing variable expenses.",
                    format_amount(-ctx.surplus)
                ),
                severity: Severity::Critical,
            }]
        } else if ctx.surplus > 0.0 {
            vec![Insight {
                category: InsightCategory::Budget,
                title: "Positive Cash Flow".to_string(),
                message: format!(
                    "You have a surplus of {}/month. Consider allocating it to goals or an emergency fund.",
                    format_amount(ctx.surplus)
                ),
                severity: Severity::Info,
            }]
        } else {
            vec![]
        }
    }
}

/// Rule: DTI above the affordability threshold
pub struct DebtToIncomeRule {
    pub threshold: f64,
}

impl InsightRule for DebtToIncomeRule {
    fn name(&self) -> &'static str {
        "debt_to_income"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        let income = ctx.input.monthly_income;
        if income <= 0.0 {
            return vec![];
        }

        let ratio = ctx.total_debt_emi / income;
        if ratio <= self.threshold {
            return vec![];
        }

        vec![Insight {
            category: InsightCategory::Debt,
            title: "High Debt-to-Income Ratio".to_string(),
            message: format!(
                "Your DTI is {:.1}% (recommended: below {:.0}%). Avoid taking new loans until DTI improves.",
                ratio * 100.0,
                self.threshold * 100.0
            ),
            severity: Severity::Warning,
        }]
    }
}

/// Rule: goals under 25% funded, first three goals only
pub struct GoalProgressRule;

const GOALS_CHECKED: usize = 3;
const LOW_PROGRESS_PCT: f64 = 25.0;

impl InsightRule for GoalProgressRule {
    fn name(&self) -> &'static str {
        "goal_progress"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        ctx.input
            .goals
            .iter()
            .take(GOALS_CHECKED)
            .filter(|goal| goal.target_amount > 0.0)
            .filter_map(|goal| {
                let progress = goal.saved_amount / goal.target_amount * 100.0;
                (progress < LOW_PROGRESS_PCT).then(|| Insight {
                    category: InsightCategory::Goal,
                    title: format!("Goal: {}", goal.name),
                    message: format!(
                        "Only {:.1}% complete. Increase monthly contributions to stay on track.",
                        progress
                    ),
                    severity: Severity::Info,
                })
            })
            .collect()
    }
}

/// Rule: surplus large enough to prepay debt
pub struct PrepaymentRule;

impl InsightRule for PrepaymentRule {
    fn name(&self) -> &'static str {
        "prepayment_opportunity"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        if ctx.input.debt_emis.is_empty() || ctx.surplus <= ctx.total_debt_emi * 0.5 {
            return vec![];
        }

        vec![Insight {
            category: InsightCategory::Debt,
            title: "Prepayment Opportunity".to_string(),
            message: format!(
                "You could pay an extra {}/month on debts to save on interest and finish early.",
                format_amount(ctx.surplus * 0.2)
            ),
            severity: Severity::Info,
        }]
    }
}

/// Create an engine with the standard rules
pub fn create_default_insight_engine(max_dti_ratio: f64) -> InsightEngine {
    let mut engine = InsightEngine::new();
    engine.add_rule(Box::new(CashFlowRule));
    engine.add_rule(Box::new(DebtToIncomeRule {
        threshold: max_dti_ratio,
    }));
    engine.add_rule(Box::new(GoalProgressRule));
    engine.add_rule(Box::new(PrepaymentRule));
    engine
}
