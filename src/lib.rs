//! Peak Finance Core
//!
//! Deterministic personal-finance calculators plus a guarded advisor:
//! - EMI, DTI, disposable income, fun budget, inflation-adjusted value
//! - Loan pre-assessment with break-even principal search and stress tests
//! - Multi-debt payoff simulation (snowball)
//! - Dashboard summary and rule-based insights
//! - Advisor that refuses regulated requests before any generation runs
//!
//! ADVISOR LOOP:
//! QUESTION → CLASSIFY → (REFUSE | REDACT → GENERATE → FALLBACK?) → AUDIT

pub mod advisor;
pub mod api;
pub mod audit;
pub mod calculators;
pub mod classifier;
pub mod config;
pub mod error;
pub mod insights;
pub mod llm;
pub mod models;
pub mod privacy;

pub use error::{FinanceError, Result};

// Re-export common types
pub use advisor::Advisor;
pub use classifier::IntentClassifier;
pub use config::{AdvisorConfig, FinanceConfig};
pub use models::*;
