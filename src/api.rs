//! REST API Server for the finance core
//!
//! Exposes calculators and the advisor over JSON.
//! Caller identity is established upstream.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::advisor::Advisor;
use crate::audit::AuditLog;
use crate::calculators;
use crate::config::FinanceConfig;
use crate::error::FinanceError;
use crate::insights::create_default_insight_engine;
use crate::models::{
    CalculationKind, CalculationResult, DashboardInput, DebtAccount, IncomeExpenseSnapshot,
    InflationItem, InflationQuery, LoanTerms, UserContext,
};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct DtiRequest {
    pub total_monthly_debt_service: f64,
    pub monthly_income: f64,
}

#[derive(Debug, Deserialize)]
pub struct PrincipalFromEmiRequest {
    pub emi: f64,
    pub annual_rate_pct: f64,
    pub term_months: u32,
}

#[derive(Debug, Deserialize)]
pub struct FunBudgetRequest {
    pub monthly_income: f64,
    pub ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PreAssessmentRequest {
    pub loan: LoanTerms,
    pub snapshot: IncomeExpenseSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct PayoffSummaryRequest {
    pub principal: f64,
    pub annual_rate_pct: f64,
    pub months_remaining: u32,
}

#[derive(Debug, Deserialize)]
pub struct PayoffPlanRequest {
    pub accounts: Vec<DebtAccount>,
    #[serde(default)]
    pub extra_monthly_payment: f64,
}

#[derive(Debug, Deserialize)]
pub struct InflationForecastRequest {
    pub items: Vec<InflationItem>,
    pub cpi_rate: Option<f64>,
    pub years: f64,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub context: UserContext,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiReply = (StatusCode, Json<ApiResponse>);

fn respond<T: Serialize>(result: crate::Result<T>) -> ApiReply {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))),
        Err(e) => {
            let status = match &e {
                FinanceError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
                FinanceError::NonConverging { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            warn!(%status, "Request failed: {}", e);
            (status, Json(ApiResponse::error(e.to_string())))
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub advisor: Arc<Advisor>,
    pub audit: Arc<AuditLog>,
    pub finance: Arc<FinanceConfig>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "advisor_backend": state.advisor.generator_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Calculator Endpoints
/// =============================

async fn calc_emi(Json(req): Json<LoanTerms>) -> ApiReply {
    respond(
        calculators::emi(req.principal, req.annual_rate_pct, req.term_months)
            .map(|value| CalculationResult::new(CalculationKind::Emi, value)),
    )
}

async fn calc_principal_from_emi(Json(req): Json<PrincipalFromEmiRequest>) -> ApiReply {
    respond(
        calculators::principal_from_emi(req.emi, req.annual_rate_pct, req.term_months)
            .map(|value| CalculationResult::new(CalculationKind::PrincipalFromEmi, value)),
    )
}

async fn calc_disposable_income(Json(req): Json<IncomeExpenseSnapshot>) -> ApiReply {
    respond(
        calculators::disposable_income(
            req.monthly_income,
            req.fixed_expenses,
            req.variable_expenses,
            req.debt_service,
        )
        .map(|value| CalculationResult::new(CalculationKind::DisposableIncome, value)),
    )
}

async fn calc_fun_budget(
    State(state): State<ApiState>,
    Json(req): Json<FunBudgetRequest>,
) -> ApiReply {
    let ratio = req.ratio.unwrap_or(state.finance.fun_ratio);
    respond(
        calculators::fun_budget(req.monthly_income, ratio)
            .map(|value| CalculationResult::new(CalculationKind::FunBudget, value)),
    )
}

async fn calc_future_value(Json(req): Json<InflationQuery>) -> ApiReply {
    respond(
        calculators::inflation_adjusted_future_value(
            req.present_value,
            req.annual_rate_pct,
            req.years,
        )
        .map(|value| CalculationResult::new(CalculationKind::FutureValue, value)),
    )
}

async fn calc_dti(State(state): State<ApiState>, Json(req): Json<DtiRequest>) -> ApiReply {
    respond(
        calculators::dti(req.total_monthly_debt_service, req.monthly_income).map(|value| {
            CalculationResult::new(CalculationKind::Dti, value)
                .with_threshold(state.finance.max_dti_ratio)
        }),
    )
}

async fn calc_loan_pre_assessment(
    State(state): State<ApiState>,
    Json(req): Json<PreAssessmentRequest>,
) -> ApiReply {
    info!(
        principal = req.loan.principal,
        term_months = req.loan.term_months,
        "Loan pre-assessment requested"
    );
    respond(calculators::loan_pre_assessment(
        &req.loan,
        &req.snapshot,
        &state.finance,
    ))
}

async fn calc_loan_payoff_summary(Json(req): Json<PayoffSummaryRequest>) -> ApiReply {
    respond(calculators::loan_payoff_summary(
        req.principal,
        req.annual_rate_pct,
        req.months_remaining,
    ))
}

async fn calc_payoff_plan(
    State(state): State<ApiState>,
    Json(req): Json<PayoffPlanRequest>,
) -> ApiReply {
    info!(accounts = req.accounts.len(), "Payoff plan requested");
    respond(calculators::payoff_plan(
        &req.accounts,
        req.extra_monthly_payment,
        &state.finance,
    ))
}

async fn calc_inflation_forecast(
    State(state): State<ApiState>,
    Json(req): Json<InflationForecastRequest>,
) -> ApiReply {
    let cpi_rate = req.cpi_rate.unwrap_or(state.finance.default_cpi_rate);
    respond(calculators::inflation_forecast(&req.items, cpi_rate, req.years))
}

async fn calc_dashboard(
    State(state): State<ApiState>,
    Json(req): Json<DashboardInput>,
) -> ApiReply {
    let result = calculators::dashboard_summary(&req, &state.finance).map(|summary| {
        let insights = create_default_insight_engine(state.finance.max_dti_ratio).evaluate(&req);
        serde_json::json!({
            "summary": summary,
            "insights": insights,
        })
    });
    respond(result)
}

/// =============================
/// Advisor Endpoint
/// =============================

async fn ask_advisor(State(state): State<ApiState>, Json(req): Json<AskRequest>) -> ApiReply {
    let response = match state.advisor.ask(&req.question, &req.context).await {
        Ok(response) => response,
        Err(e) => return respond::<()>(Err(e)),
    };

    if let Err(e) = state.audit.record_advisor(&req.question, &response).await {
        warn!("Audit write failed, response will still be returned: {}", e);
    }

    respond(Ok(response))
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/calc/emi", post(calc_emi))
        .route("/api/calc/principal-from-emi", post(calc_principal_from_emi))
        .route("/api/calc/dti", post(calc_dti))
        .route("/api/calc/disposable-income", post(calc_disposable_income))
        .route("/api/calc/fun-budget", post(calc_fun_budget))
        .route("/api/calc/future-value", post(calc_future_value))
        .route("/api/calc/loan-pre-assessment", post(calc_loan_pre_assessment))
        .route("/api/calc/loan-payoff-summary", post(calc_loan_payoff_summary))
        .route("/api/calc/payoff-plan", post(calc_payoff_plan))
        .route("/api/calc/inflation-forecast", post(calc_inflation_forecast))
        .route("/api/calc/dashboard", post(calc_dashboard))
        .route("/api/ai/ask", post(ask_advisor))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> ApiState {
        let finance = FinanceConfig::default();
        ApiState {
            advisor: Arc::new(Advisor::mock(finance.clone())),
            audit: Arc::new(AuditLog::new()),
            finance: Arc::new(finance),
        }
    }

    async fn post_json(
        router: Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, ApiResponse) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_emi_endpoint() {
        let router = create_router(test_state());
        let (status, body) = post_json(
            router,
            "/api/calc/emi",
            serde_json::json!({"principal": 100000.0, "annual_rate_pct": 10.0, "term_months": 12}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["kind"], "emi");
        assert!((data["value"].as_f64().unwrap() - 8791.59).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let router = create_router(test_state());
        let (status, body) = post_json(
            router,
            "/api/calc/dti",
            serde_json::json!({"total_monthly_debt_service": 100.0, "monthly_income": 0.0}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(
            body.error.unwrap(),
            "Invalid input: monthly_income must be positive"
        );
    }

    #[tokio::test]
    async fn test_dti_threshold_flag() {
        let router = create_router(test_state());
        let (_, body) = post_json(
            router,
            "/api/calc/dti",
            serde_json::json!({"total_monthly_debt_service": 25000.0, "monthly_income": 50000.0}),
        )
        .await;

        let data = body.data.unwrap();
        assert_eq!(data["value"], 0.5);
        assert_eq!(data["exceeds_threshold"], true);
    }

    #[tokio::test]
    async fn test_principal_from_emi_endpoint() {
        let router = create_router(test_state());
        let (status, body) = post_json(
            router,
            "/api/calc/principal-from-emi",
            serde_json::json!({"emi": 1000.0, "annual_rate_pct": 0.0, "term_months": 12}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["kind"], "principal_from_emi");
        assert_eq!(data["value"], 12000.0);
    }

    #[tokio::test]
    async fn test_disposable_income_endpoint() {
        let router = create_router(test_state());
        let (status, body) = post_json(
            router,
            "/api/calc/disposable-income",
            serde_json::json!({
                "monthly_income": 30000.0,
                "fixed_expenses": 20000.0,
                "variable_expenses": 10000.0,
                "debt_service": 5000.0
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["kind"], "disposable_income");
        assert_eq!(data["value"], -5000.0);
    }

    #[tokio::test]
    async fn test_fun_budget_uses_configured_ratio() {
        let (status, body) = post_json(
            create_router(test_state()),
            "/api/calc/fun-budget",
            serde_json::json!({"monthly_income": 50000.0}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["kind"], "fun_budget");
        assert_eq!(data["value"], 7500.0);

        let (status, _) = post_json(
            create_router(test_state()),
            "/api/calc/fun-budget",
            serde_json::json!({"monthly_income": 50000.0, "ratio": 2.5}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_future_value_endpoint() {
        let router = create_router(test_state());
        let (status, body) = post_json(
            router,
            "/api/calc/future-value",
            serde_json::json!({"present_value": 1000.0, "annual_rate_pct": 7.0, "years": 5.0}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["kind"], "future_value");
        assert!((data["value"].as_f64().unwrap() - 1402.55).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_ask_rejects_invalid_context() {
        let router = create_router(test_state());
        let (status, body) = post_json(
            router,
            "/api/ai/ask",
            serde_json::json!({
                "question": "help me budget",
                "context": {"monthly_income": 50000.0, "fun_ratio": 2.5}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.unwrap().contains("context.fun_ratio"));
    }

    #[tokio::test]
    async fn test_non_converging_payoff_is_unprocessable() {
        let router = create_router(test_state());
        let (status, body) = post_json(
            router,
            "/api/calc/payoff-plan",
            serde_json::json!({
                "accounts": [{"name": "payday", "balance": 10000.0, "annual_rate_pct": 24.0, "minimum_payment": 150.0}],
                "extra_monthly_payment": 0.0
            }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.error.unwrap().contains("did not converge"));
    }

    #[tokio::test]
    async fn test_dashboard_includes_insights() {
        let router = create_router(test_state());
        let (status, body) = post_json(
            router,
            "/api/calc/dashboard",
            serde_json::json!({
                "monthly_income": 30000.0,
                "expenses": [20000.0],
                "debt_emis": [15000.0]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["summary"]["surplus"], -5000.0);
        assert_eq!(data["insights"][0]["title"], "Budget Deficit");
    }

    #[tokio::test]
    async fn test_ask_blocked_is_audited() {
        let state = test_state();
        let audit = state.audit.clone();
        let router = create_router(state);

        let (status, body) = post_json(
            router,
            "/api/ai/ask",
            serde_json::json!({"question": "Please approve my loan"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["blocked"], true);
        assert_eq!(data["intent"], "loan_approval");

        let blocked = audit
            .list_by_action(crate::models::AuditAction::AiRequestBlocked)
            .await
            .unwrap();
        assert_eq!(blocked.len(), 1);
    }

    #[tokio::test]
    async fn test_ask_empty_question() {
        let router = create_router(test_state());
        let (status, _) = post_json(
            router,
            "/api/ai/ask",
            serde_json::json!({"question": ""}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
