//! Intent Classifier
//!
//! Maps a free-text advisor query onto an `AdvisorIntent` with an ordered rule
//! table. Blocked (regulated) intents are checked first with substring matching
//! on both the raw and the separator-normalized text, so any hit wins over every
//! allowed intent. Allowed intents use
//! token-prefix / phrase matching and are tried in priority order:
//! loan_question > budget_help > goal_planning > spending_query > general_advice.

use crate::models::AdvisorIntent;

/// One row of the rule table
pub struct IntentRule {
    pub intent: AdvisorIntent,
    pub keywords: &'static [&'static str],
}

/// Static keyword tables, zero allocation
pub const BLOCKED_RULES: &[IntentRule] = &[
    IntentRule {
        intent: AdvisorIntent::LoanApproval,
        keywords: &[
            "approve",
            "approval",
            "grant loan",
            "grant me a loan",
            "give me loan",
            "give me a loan",
            "sanction my loan",
            "disburse",
        ],
    },
    IntentRule {
        intent: AdvisorIntent::Ekyc,
        keywords: &[
            "ekyc",
            "e-kyc",
            "kyc",
            "verify identity",
            "verify my identity",
            "id verification",
            "identity verification",
        ],
    },
    IntentRule {
        intent: AdvisorIntent::CreditBureauAccess,
        keywords: &[
            "cib",
            "credit bureau",
            "credit report",
            "credit score",
            "credit history",
        ],
    },
];

pub const ALLOWED_RULES: &[IntentRule] = &[
    IntentRule {
        intent: AdvisorIntent::LoanQuestion,
        keywords: &[
            "loan", "emi", "debt", "borrow", "mortgage", "repay", "interest rate", "dti",
        ],
    },
    IntentRule {
        intent: AdvisorIntent::BudgetHelp,
        keywords: &["budget", "expense", "bill", "cash flow", "overspend"],
    },
    IntentRule {
        intent: AdvisorIntent::GoalPlanning,
        keywords: &["goal", "save", "saving", "emergency fund", "retire", "target"],
    },
    IntentRule {
        intent: AdvisorIntent::SpendingQuery,
        keywords: &["spend", "afford", "safe to spend", "purchase", "can i buy"],
    },
    IntentRule {
        intent: AdvisorIntent::GeneralAdvice,
        keywords: &["advice", "help", "suggest", "tip", "recommend"],
    },
];

/// Intent classifier
pub struct IntentClassifier;

impl IntentClassifier {
    /// Classify a query. Queries matching no rule are general advice.
    pub fn classify(query: &str) -> AdvisorIntent {
        let lower = query.to_lowercase();
        let tokens = tokenize(&lower);
        let normalized = tokens.join(" ");

        // raw text catches "e-kyc"; normalized text catches "credit-score", "grant\nloan"
        if let Some(rule) = BLOCKED_RULES.iter().find(|rule| {
            rule.keywords
                .iter()
                .any(|kw| lower.contains(kw) || normalized.contains(kw))
        }) {
            return rule.intent;
        }

        ALLOWED_RULES
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|kw| matches_keyword(kw, &tokens, &normalized))
            })
            .map(|rule| rule.intent)
            .unwrap_or(AdvisorIntent::GeneralAdvice)
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Phrases match on the normalized text; single words match a token prefix,
/// so "expense" hits "expenses" but "emi" does not hit "premium".
fn matches_keyword(keyword: &str, tokens: &[&str], normalized: &str) -> bool {
    if keyword.contains(' ') {
        normalized.contains(keyword)
    } else {
        tokens.iter().any(|token| token.starts_with(keyword))
    }
}
