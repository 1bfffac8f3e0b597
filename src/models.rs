//! Core data models for the finance core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Calculator Inputs =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate_pct: f64,
    pub term_months: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IncomeExpenseSnapshot {
    pub monthly_income: f64,
    #[serde(default)]
    pub fixed_expenses: f64,
    #[serde(default)]
    pub variable_expenses: f64,
    #[serde(default)]
    pub debt_service: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InflationQuery {
    pub present_value: f64,
    pub annual_rate_pct: f64,
    pub years: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebtAccount {
    pub name: String,
    pub balance: f64,
    pub annual_rate_pct: f64,
    pub minimum_payment: f64,
}

//
// ================= Calculator Outputs =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CalculationKind {
    Emi,
    PrincipalFromEmi,
    Dti,
    DisposableIncome,
    FunBudget,
    FutureValue,
}

/// Tagged scalar output plus any derived flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    pub kind: CalculationKind,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceeds_threshold: Option<bool>,
}

impl CalculationResult {
    pub fn new(kind: CalculationKind, value: f64) -> Self {
        Self {
            kind,
            value,
            exceeds_threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.exceeds_threshold = Some(self.value > threshold);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestResult {
    pub scenario: String,
    pub emi: f64,
    pub dti: f64,
    pub affordable: bool,
    pub max_affordable_principal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPreAssessment {
    pub emi: f64,
    pub resulting_dti: f64,
    pub affordable: bool,
    pub max_affordable_principal: f64,
    pub affordable_emi_cap: f64,
    pub search_iterations: u32,
    pub stress_tests: Vec<StressTestResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPayoffSummary {
    pub required_emi: f64,
    pub total_interest: f64,
    pub total_payment: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayoffStrategy {
    /// Smallest balance first
    Snowball,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffEntry {
    pub account: String,
    pub priority: usize,
    pub months_to_payoff: u32,
    pub total_interest_paid: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffPlan {
    pub strategy: PayoffStrategy,
    pub entries: Vec<PayoffEntry>,
    pub total_months: u32,
    pub total_interest: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflationItem {
    pub name: String,
    pub current_cost: f64,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflationProjection {
    pub name: String,
    pub current_cost: f64,
    pub projected_cost: f64,
    pub increase_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflationForecast {
    pub base_scenario: Vec<InflationProjection>,
    pub optimistic_scenario: Vec<InflationProjection>,
    pub pessimistic_scenario: Vec<InflationProjection>,
    pub total_current: f64,
    pub total_projected: f64,
}

//
// ================= Dashboard =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalSnapshot {
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub saved_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardInput {
    pub monthly_income: f64,
    #[serde(default)]
    pub expenses: Vec<f64>,
    #[serde(default)]
    pub debt_emis: Vec<f64>,
    #[serde(default)]
    pub principal_remaining: f64,
    #[serde(default)]
    pub goals: Vec<GoalSnapshot>,
    #[serde(default)]
    pub fun_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub surplus: f64,
    pub dti: Option<f64>,
    pub safe_to_spend: f64,
    pub fun_budget: f64,
    pub goal_progress_pct: f64,
    pub debt_payoff_eta_months: Option<u32>,
}

//
// ================= Advisor =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorIntent {
    GeneralAdvice,
    BudgetHelp,
    LoanQuestion,
    GoalPlanning,
    SpendingQuery,
    LoanApproval,
    Ekyc,
    CreditBureauAccess,
}

impl AdvisorIntent {
    /// Regulated capabilities this service never performs
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            AdvisorIntent::LoanApproval | AdvisorIntent::Ekyc | AdvisorIntent::CreditBureauAccess
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisorIntent::GeneralAdvice => "general_advice",
            AdvisorIntent::BudgetHelp => "budget_help",
            AdvisorIntent::LoanQuestion => "loan_question",
            AdvisorIntent::GoalPlanning => "goal_planning",
            AdvisorIntent::SpendingQuery => "spending_query",
            AdvisorIntent::LoanApproval => "BLOCKED:loan_approval",
            AdvisorIntent::Ekyc => "BLOCKED:ekyc",
            AdvisorIntent::CreditBureauAccess => "BLOCKED:credit_bureau_access",
        }
    }
}

impl fmt::Display for AdvisorIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Refusal,
    Template,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorResponse {
    pub intent: AdvisorIntent,
    pub blocked: bool,
    pub text: String,
    pub source: ResponseSource,
}

/// Read-only snapshot supplied by the data layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default)]
    pub total_expenses: f64,
    #[serde(default)]
    pub total_debt_service: f64,
    #[serde(default)]
    pub fun_ratio: Option<f64>,
    #[serde(default)]
    pub goals: Vec<GoalSnapshot>,
    #[serde(default)]
    pub risk_tolerance: Option<RiskTolerance>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTolerance::Low => "Low",
            RiskTolerance::Medium => "Medium",
            RiskTolerance::High => "High",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Insights =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    Budget,
    Debt,
    Goal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

//
// ================= Audit =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AiRequestAnswered,
    AiRequestBlocked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: Uuid,
    pub action: AuditAction,
    pub intent: AdvisorIntent,
    pub question: String,
    pub source: ResponseSource,
    pub created_at: DateTime<Utc>,
    pub integrity_hash: String,
}
