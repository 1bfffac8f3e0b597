//! Immutable configuration
//!
//! Thresholds and ratios are passed explicitly into every calculation.
//! Values are read once at startup (defaults, overridden by environment).

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Financial policy parameters
#[derive(Debug, Clone)]
pub struct FinanceConfig {
    /// DTI at or below which a new loan counts as affordable
    pub max_dti_ratio: f64,
    /// Share of income earmarked for discretionary spending
    pub fun_ratio: f64,
    /// Annual CPI estimate used when a forecast request omits one
    pub default_cpi_rate: f64,
    /// Bisection cap for the break-even principal search
    pub search_max_iterations: u32,
    /// Bracket width (currency units) at which the search stops early
    pub search_tolerance: f64,
    /// Safety cap for payoff simulation
    pub payoff_max_months: u32,
    /// Share of surplus reserved for goals on the dashboard
    pub goal_allocation_ratio: f64,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            max_dti_ratio: 0.40,
            fun_ratio: 0.15,
            default_cpi_rate: 7.0,
            search_max_iterations: 50,
            search_tolerance: 0.01,
            payoff_max_months: 600,
            goal_allocation_ratio: 0.20,
        }
    }
}

impl FinanceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_dti_ratio: env_or("MAX_DTI_RATIO", defaults.max_dti_ratio),
            fun_ratio: env_or("DEFAULT_FUN_RATIO", defaults.fun_ratio),
            default_cpi_rate: env_or("DEFAULT_CPI_RATE", defaults.default_cpi_rate),
            search_max_iterations: env_or(
                "SEARCH_MAX_ITERATIONS",
                defaults.search_max_iterations,
            ),
            search_tolerance: env_or("SEARCH_TOLERANCE", defaults.search_tolerance),
            payoff_max_months: env_or("PAYOFF_MAX_MONTHS", defaults.payoff_max_months),
            goal_allocation_ratio: env_or(
                "GOAL_ALLOCATION_RATIO",
                defaults.goal_allocation_ratio,
            ),
        }
    }
}

/// Advisor backend settings
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
    pub system_prompt: String,
    /// Audit records kept in memory before the oldest are evicted
    pub audit_max_records: usize,
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful financial education assistant. \
Provide concise, actionable advice. Include formulas and explanations when relevant. \
Never approve loans, verify identity or read credit bureau data.";

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: String::new(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            audit_max_records: 10_000,
        }
    }
}

impl AdvisorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            provider: env::var("AI_PROVIDER")
                .map(|p| p.trim().to_lowercase())
                .unwrap_or(defaults.provider),
            base_url: env::var("AI_BASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.base_url),
            model: env::var("AI_MODEL").unwrap_or(defaults.model),
            api_key: env::var("AI_API_KEY").unwrap_or(defaults.api_key),
            timeout: Duration::from_secs(env_or("AI_TIMEOUT_SECS", 10u64)),
            system_prompt: env::var("AI_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
            audit_max_records: env_or("AUDIT_MAX_RECORDS", defaults.audit_max_records),
        }
    }

    /// External generation needs both a key and a model; otherwise mock mode
    pub fn is_external_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.model.trim().is_empty()
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Unparseable config value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finance_defaults() {
        let config = FinanceConfig::default();
        assert_eq!(config.max_dti_ratio, 0.40);
        assert_eq!(config.fun_ratio, 0.15);
        assert_eq!(config.search_max_iterations, 50);
        assert_eq!(config.payoff_max_months, 600);
    }

    #[test]
    fn test_mock_mode_without_key() {
        let config = AdvisorConfig {
            model: "gpt-4o-mini".into(),
            ..AdvisorConfig::default()
        };
        assert!(!config.is_external_configured());

        let config = AdvisorConfig {
            api_key: "sk-test".into(),
            model: "gpt-4o-mini".into(),
            ..AdvisorConfig::default()
        };
        assert!(config.is_external_configured());
    }

    #[test]
    fn test_default_timeout_is_ten_seconds() {
        assert_eq!(AdvisorConfig::default().timeout, Duration::from_secs(10));
    }
}
