use peak_finance_core::{
    api::{start_server, ApiState},
    audit::AuditLog,
    config::{AdvisorConfig, FinanceConfig},
    Advisor,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("Peak Finance - API Server");
    info!("Port: {}", api_port);

    let finance = FinanceConfig::from_env();
    let advisor_config = AdvisorConfig::from_env();

    if !advisor_config.is_external_configured() {
        warn!("AI_API_KEY or AI_MODEL not set, advisor runs in template mode");
    }

    let advisor = Advisor::from_config(&advisor_config, finance.clone())?;

    let state = ApiState {
        advisor: Arc::new(advisor),
        audit: Arc::new(AuditLog::with_capacity(advisor_config.audit_max_records)),
        finance: Arc::new(finance),
    };

    info!("Advisor initialized ({})", state.advisor.generator_name());

    start_server(state, api_port).await?;

    Ok(())
}
