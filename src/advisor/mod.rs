//! Advisor guardrail
//!
//! CLASSIFY → RESPOND. Blocked intents get a fixed refusal and nothing else
//! runs. Allowed intents go to the generator chosen at startup; any backend
//! failure or timeout degrades to the templated answer and is never shown to
//! the user.

use crate::classifier::IntentClassifier;
use crate::config::{AdvisorConfig, FinanceConfig};
use crate::error::FinanceError;
use crate::llm::{ChatCompletionClient, ChatCompletionGenerator};
use crate::models::{AdvisorIntent, AdvisorResponse, ResponseSource, UserContext};
use crate::privacy::{redact_pii, validate_user_context, SanitizedContext};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub mod templates;
pub use templates::TemplateGenerator;

/// Appended verbatim to every non-blocked response
pub const DISCLAIMER: &str =
    "This is educational guidance, not professional financial advice or a loan offer.";

/// Everything a generator may see. The query is already PII-redacted and the
/// context carries amounts only.
pub struct GenerationRequest<'a> {
    pub intent: AdvisorIntent,
    pub query: &'a str,
    pub context: &'a SanitizedContext,
    pub context_summary: &'a str,
}

/// Text generation capability (templated or external)
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    fn source(&self) -> ResponseSource {
        ResponseSource::External
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;
}

/// Fixed refusal naming the regulated capability
pub fn refusal_message(intent: AdvisorIntent) -> &'static str {
    match intent {
        AdvisorIntent::LoanApproval => {
            "Peak Finance cannot approve or grant loans. Lending decisions are made by \
             licensed lenders; please consult a licensed institution."
        }
        AdvisorIntent::Ekyc => {
            "Peak Finance cannot perform e-KYC or identity verification. Please complete \
             verification directly with a licensed institution."
        }
        AdvisorIntent::CreditBureauAccess => {
            "Peak Finance cannot access credit bureau (CIB) data or credit reports. Please \
             request your report from the bureau or a licensed institution."
        }
        _ => {
            "Peak Finance operates in educational mode and cannot process this request; \
             consult a licensed institution."
        }
    }
}

pub struct Advisor {
    generator: Arc<dyn ResponseGenerator>,
    fallback: TemplateGenerator,
    timeout: Duration,
    finance: FinanceConfig,
}

impl Advisor {
    pub fn new(
        generator: Arc<dyn ResponseGenerator>,
        timeout: Duration,
        finance: FinanceConfig,
    ) -> Self {
        Self {
            fallback: TemplateGenerator::new(finance.clone()),
            generator,
            timeout,
            finance,
        }
    }

    /// Template-only advisor
    pub fn mock(finance: FinanceConfig) -> Self {
        let generator = Arc::new(TemplateGenerator::new(finance.clone()));
        Self::new(generator, AdvisorConfig::default().timeout, finance)
    }

    /// Pick the generator once, at startup
    pub fn from_config(config: &AdvisorConfig, finance: FinanceConfig) -> Result<Self> {
        if !config.is_external_configured() {
            info!("Advisor backend: template (mock mode)");
            return Ok(Self::mock(finance));
        }

        info!(provider = %config.provider, model = %config.model, "Advisor backend: chat completion");
        let client = ChatCompletionClient::new(config)?;
        Ok(Self::new(
            Arc::new(ChatCompletionGenerator::new(client)),
            config.timeout,
            finance,
        ))
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Validate, classify, respond
    pub async fn ask(&self, query: &str, user: &UserContext) -> Result<AdvisorResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FinanceError::invalid("question", "must not be empty"));
        }
        validate_user_context(user)?;

        let intent = IntentClassifier::classify(query);
        info!(%intent, "Advisor query classified");

        Ok(self.generate_response(intent, query, user).await)
    }

    pub async fn generate_response(
        &self,
        intent: AdvisorIntent,
        query: &str,
        user: &UserContext,
    ) -> AdvisorResponse {
        if intent.is_blocked() {
            warn!(%intent, "Blocked regulated request");
            return AdvisorResponse {
                intent,
                blocked: true,
                text: refusal_message(intent).to_string(),
                source: ResponseSource::Refusal,
            };
        }

        let context = SanitizedContext::new(user, &self.finance);
        let context_summary = context.summary();
        let redacted = redact_pii(query);
        let request = GenerationRequest {
            intent,
            query: &redacted,
            context: &context,
            context_summary: &context_summary,
        };

        let (body, source) =
            match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await {
                Ok(Ok(text)) => (text, self.generator.source()),
                Ok(Err(e)) => {
                    warn!(generator = self.generator.name(), "Falling back to template: {}", e);
                    (self.fallback.render(&request), ResponseSource::Template)
                }
                Err(_) => {
                    warn!(
                        generator = self.generator.name(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Generator timed out, falling back to template"
                    );
                    (self.fallback.render(&request), ResponseSource::Template)
                }
            };

        AdvisorResponse {
            intent,
            blocked: false,
            text: format!("{}\n\n{}", body.trim_end(), DISCLAIMER),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counts calls and records what it was given
    struct CountingGenerator {
        calls: AtomicUsize,
        last_query: Mutex<Option<String>>,
        last_summary: Mutex<Option<String>>,
        reply: Result<String>,
    }

    impl CountingGenerator {
        fn ok(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
                last_summary: Mutex::new(None),
                reply: Ok(text.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
                last_summary: Mutex::new(None),
                reply: Err(FinanceError::BackendUnavailable("connection refused".into())),
            }
        }
    }

    #[async_trait]
    impl ResponseGenerator for CountingGenerator {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(request.query.to_string());
            *self.last_summary.lock().unwrap() = Some(request.context_summary.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(FinanceError::BackendUnavailable("connection refused".into())),
            }
        }
    }

    struct StalledGenerator;

    #[async_trait]
    impl ResponseGenerator for StalledGenerator {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".to_string())
        }
    }

    fn advisor_with(generator: Arc<dyn ResponseGenerator>) -> Advisor {
        Advisor::new(generator, Duration::from_secs(10), FinanceConfig::default())
    }

    #[tokio::test]
    async fn test_blocked_intent_never_reaches_backend() {
        let backend = Arc::new(CountingGenerator::ok("approved!"));
        let advisor = advisor_with(backend.clone());

        for query in [
            "approve my loan",
            "do my ekyc",
            "pull my credit report and help me budget",
        ] {
            let response = advisor.ask(query, &UserContext::default()).await.unwrap();
            assert!(response.blocked, "{}", query);
            assert_eq!(response.source, ResponseSource::Refusal);
            assert!(!response.text.contains(DISCLAIMER));
            assert!(response.text.contains("licensed institution"));
        }

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_external_answer_gets_disclaimer() {
        let backend = Arc::new(CountingGenerator::ok("Keep total EMIs under 40% of income."));
        let advisor = advisor_with(backend.clone());

        let response = advisor
            .ask("How much EMI is too much?", &UserContext::default())
            .await
            .unwrap();

        assert_eq!(response.intent, AdvisorIntent::LoanQuestion);
        assert_eq!(response.source, ResponseSource::External);
        assert!(response.text.starts_with("Keep total EMIs under 40% of income."));
        assert!(response.text.ends_with(DISCLAIMER));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_is_redacted_before_backend() {
        let backend = Arc::new(CountingGenerator::ok("ok"));
        let advisor = advisor_with(backend.clone());

        advisor
            .ask("budget tips? reach me at a.b@example.com", &UserContext::default())
            .await
            .unwrap();

        let seen = backend.last_query.lock().unwrap().clone().unwrap();
        assert_eq!(seen, "budget tips? reach me at [EMAIL]");
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back_to_template() {
        let advisor = advisor_with(Arc::new(CountingGenerator::failing()));

        let response = advisor
            .ask("help me with my budget", &UserContext::default())
            .await
            .unwrap();

        assert!(!response.blocked);
        assert_eq!(response.source, ResponseSource::Template);
        assert!(!response.text.contains("connection refused"));
        assert!(response.text.ends_with(DISCLAIMER));
    }

    #[tokio::test]
    async fn test_backend_timeout_falls_back_to_template() {
        let advisor = Advisor::new(
            Arc::new(StalledGenerator),
            Duration::from_millis(20),
            FinanceConfig::default(),
        );

        let response = advisor
            .ask("how do I save for a goal?", &UserContext::default())
            .await
            .unwrap();

        assert_eq!(response.intent, AdvisorIntent::GoalPlanning);
        assert_eq!(response.source, ResponseSource::Template);
        assert!(!response.text.contains("too late"));
    }

    #[tokio::test]
    async fn test_goal_names_never_reach_backend() {
        let backend = Arc::new(CountingGenerator::ok("ok"));
        let advisor = advisor_with(backend.clone());
        let user = UserContext {
            monthly_income: Some(40_000.0),
            goals: vec![crate::models::GoalSnapshot {
                name: "gift for jane@example.com".into(),
                target_amount: 10_000.0,
                saved_amount: 1_000.0,
            }],
            ..UserContext::default()
        };

        advisor.ask("how do I reach my goal?", &user).await.unwrap();

        let summary = backend.last_summary.lock().unwrap().clone().unwrap();
        assert!(summary.contains("- Goals: 1 active"));
        assert!(!summary.contains("jane"));
    }

    #[tokio::test]
    async fn test_invalid_context_rejected_before_backend() {
        let backend = Arc::new(CountingGenerator::ok("ok"));
        let advisor = advisor_with(backend.clone());
        let user = UserContext {
            monthly_income: Some(50_000.0),
            fun_ratio: Some(2.5),
            ..UserContext::default()
        };

        let err = advisor.ask("help me budget", &user).await.unwrap_err();
        assert!(matches!(err, FinanceError::InvalidInput { .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let advisor = Advisor::mock(FinanceConfig::default());
        let err = advisor.ask("   ", &UserContext::default()).await.unwrap_err();
        assert!(matches!(err, FinanceError::InvalidInput { .. }));
    }

    #[test]
    fn test_mock_advisor_selected_without_key() {
        let advisor =
            Advisor::from_config(&AdvisorConfig::default(), FinanceConfig::default()).unwrap();
        assert_eq!(advisor.generator_name(), "template");

        let response = tokio_test::block_on(
            advisor.ask("what should I do with my money?", &UserContext::default()),
        )
        .unwrap();
        assert_eq!(response.intent, AdvisorIntent::GeneralAdvice);
        assert_eq!(response.source, ResponseSource::Template);
    }
}
