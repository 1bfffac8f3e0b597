use peak_finance_core::{
    audit::AuditLog,
    calculators::{self, format_amount},
    config::{AdvisorConfig, FinanceConfig},
    insights::create_default_insight_engine,
    Advisor, DashboardInput, DebtAccount, GoalSnapshot, IncomeExpenseSnapshot, LoanTerms,
    UserContext,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let finance = FinanceConfig::from_env();
    let advisor = Advisor::from_config(&AdvisorConfig::from_env(), finance.clone())?;
    let audit_log = AuditLog::new();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let question = if args.is_empty() {
        "How much EMI can I afford on my salary?".to_string()
    } else {
        args.join(" ")
    };

    let user = UserContext {
        monthly_income: Some(50_000.0),
        total_expenses: 20_000.0,
        total_debt_service: 10_000.0,
        fun_ratio: None,
        goals: vec![GoalSnapshot {
            name: "Emergency fund".to_string(),
            target_amount: 150_000.0,
            saved_amount: 30_000.0,
        }],
        risk_tolerance: None,
    };

    info!(question = %question, "Running advisor");

    let response = advisor.ask(&question, &user).await?;
    let audit_id = audit_log.record_advisor(&question, &response).await?;

    println!("\n=== ADVISOR ===");
    println!("Question: {}", question);
    println!("Intent:   {}", response.intent);
    println!("Source:   {:?}", response.source);
    println!("Audit ID: {}", audit_id);
    println!("\n{}", response.text);

    println!("\n=== LOAN PRE-ASSESSMENT ===");
    let loan = LoanTerms {
        principal: 300_000.0,
        annual_rate_pct: 10.0,
        term_months: 36,
    };
    let snapshot = IncomeExpenseSnapshot {
        monthly_income: 50_000.0,
        fixed_expenses: 15_000.0,
        variable_expenses: 5_000.0,
        debt_service: 10_000.0,
    };
    let assessment = calculators::loan_pre_assessment(&loan, &snapshot, &finance)?;
    println!("EMI:             {}", format_amount(assessment.emi));
    println!("Resulting DTI:   {:.1}%", assessment.resulting_dti * 100.0);
    println!("Affordable:      {}", assessment.affordable);
    println!(
        "Max principal:   {}",
        format_amount(assessment.max_affordable_principal)
    );
    for stress in &assessment.stress_tests {
        println!(
            "  {}: EMI {}, DTI {:.1}%, affordable={}",
            stress.scenario,
            format_amount(stress.emi),
            stress.dti * 100.0,
            stress.affordable
        );
    }

    println!("\n=== PAYOFF PLAN ===");
    let accounts = vec![
        DebtAccount {
            name: "Credit card".to_string(),
            balance: 1_000.0,
            annual_rate_pct: 24.0,
            minimum_payment: 200.0,
        },
        DebtAccount {
            name: "Personal loan".to_string(),
            balance: 5_000.0,
            annual_rate_pct: 12.0,
            minimum_payment: 300.0,
        },
    ];
    let plan = calculators::payoff_plan(&accounts, 100.0, &finance)?;
    for entry in &plan.entries {
        println!(
            "  {}. {} paid off in {} months (interest {})",
            entry.priority + 1,
            entry.account,
            entry.months_to_payoff,
            format_amount(entry.total_interest_paid)
        );
    }
    println!(
        "Debt-free in {} months, total interest {}",
        plan.total_months,
        format_amount(plan.total_interest)
    );

    println!("\n=== DASHBOARD ===");
    let dashboard = DashboardInput {
        monthly_income: 50_000.0,
        expenses: vec![15_000.0, 5_000.0],
        debt_emis: vec![10_000.0],
        principal_remaining: 120_000.0,
        goals: user.goals.clone(),
        fun_ratio: None,
    };
    let summary = calculators::dashboard_summary(&dashboard, &finance)?;
    println!("Surplus:       {}", format_amount(summary.surplus));
    println!("Safe to spend: {}", format_amount(summary.safe_to_spend));
    println!("Fun budget:    {}", format_amount(summary.fun_budget));

    let insights = create_default_insight_engine(finance.max_dti_ratio).evaluate(&dashboard);
    for insight in insights {
        println!("  [{:?}] {}: {}", insight.severity, insight.title, insight.message);
    }

    Ok(())
}
