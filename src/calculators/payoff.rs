//! Debt payoff planning
//!
//! Month-by-month snowball simulation across all accounts, plus the single-loan
//! payoff summary.

use super::{emi, ensure_non_negative, monthly_rate};
use crate::config::FinanceConfig;
use crate::error::FinanceError;
use crate::models::{DebtAccount, LoanPayoffSummary, PayoffEntry, PayoffPlan, PayoffStrategy};
use crate::Result;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Balances at or below this are treated as settled
const SETTLED_EPSILON: f64 = 1e-6;

struct Ledger<'a> {
    account: &'a DebtAccount,
    balance: f64,
    interest_paid: f64,
    settled_in: Option<u32>,
}

impl Ledger<'_> {
    fn is_open(&self) -> bool {
        self.settled_in.is_none()
    }

    /// Applies up to `amount`, returns what was not needed
    fn pay(&mut self, amount: f64, month: u32) -> f64 {
        let applied = amount.min(self.balance);
        self.balance -= applied;
        if self.balance <= SETTLED_EPSILON {
            self.balance = 0.0;
            self.settled_in = Some(month);
        }
        amount - applied
    }
}

/// Snowball payoff: smallest starting balance first, ties kept in input order.
///
/// Each month interest accrues on every open account, then every open account
/// receives its minimum payment. The extra payment, the minimums of accounts
/// settled in earlier months, and any minimum an account no longer needed form
/// a pool that goes entirely to the highest-priority open account, cascading to
/// the next one in the same month when an account settles.
///
/// Fails with `NonConverging` if balance remains after `payoff_max_months`.
pub fn payoff_plan(
    accounts: &[DebtAccount],
    extra_monthly_payment: f64,
    config: &FinanceConfig,
) -> Result<PayoffPlan> {
    ensure_non_negative("extra_monthly_payment", extra_monthly_payment)?;
    for account in accounts {
        validate_account(account)?;
    }

    let mut order: Vec<usize> = (0..accounts.len()).collect();
    order.sort_by(|&a, &b| {
        accounts[a]
            .balance
            .partial_cmp(&accounts[b].balance)
            .unwrap_or(Ordering::Equal)
    });

    let mut ledgers: Vec<Ledger<'_>> = order
        .iter()
        .map(|&i| {
            let account = &accounts[i];
            Ledger {
                account,
                balance: account.balance,
                interest_paid: 0.0,
                settled_in: (account.balance <= SETTLED_EPSILON).then_some(0),
            }
        })
        .collect();

    let mut month = 0u32;

    while ledgers.iter().any(Ledger::is_open) {
        if month >= config.payoff_max_months {
            let remaining_balance: f64 = ledgers.iter().map(|l| l.balance).sum();
            warn!(
                months = month,
                remaining_balance, "Payoff simulation hit the safety cap"
            );
            return Err(FinanceError::NonConverging {
                months: month,
                remaining_balance,
            });
        }
        month += 1;

        let mut pool = extra_monthly_payment
            + ledgers
                .iter()
                .filter(|l| !l.is_open())
                .map(|l| l.account.minimum_payment)
                .sum::<f64>();

        for ledger in ledgers.iter_mut().filter(|l| l.is_open()) {
            let interest = ledger.balance * monthly_rate(ledger.account.annual_rate_pct);
            ledger.balance += interest;
            ledger.interest_paid += interest;
        }

        for ledger in ledgers.iter_mut().filter(|l| l.is_open()) {
            pool += ledger.pay(ledger.account.minimum_payment, month);
        }

        for ledger in ledgers.iter_mut() {
            if pool <= 0.0 {
                break;
            }
            if ledger.is_open() {
                pool = ledger.pay(pool, month);
            }
        }
    }

    let entries: Vec<PayoffEntry> = ledgers
        .iter()
        .enumerate()
        .map(|(priority, ledger)| PayoffEntry {
            account: ledger.account.name.clone(),
            priority,
            months_to_payoff: ledger.settled_in.unwrap_or(month),
            total_interest_paid: ledger.interest_paid,
        })
        .collect();

    let total_interest = entries.iter().map(|e| e.total_interest_paid).sum();

    debug!(
        accounts = entries.len(),
        total_months = month,
        total_interest,
        "Payoff plan simulated"
    );

    Ok(PayoffPlan {
        strategy: PayoffStrategy::Snowball,
        entries,
        total_months: month,
        total_interest,
    })
}

/// EMI needed to clear `principal` in `months_remaining`, with totals
pub fn loan_payoff_summary(
    principal: f64,
    annual_rate_pct: f64,
    months_remaining: u32,
) -> Result<LoanPayoffSummary> {
    let required_emi = emi(principal, annual_rate_pct, months_remaining)?;
    let total_payment = required_emi * f64::from(months_remaining);

    Ok(LoanPayoffSummary {
        required_emi,
        total_interest: total_payment - principal,
        total_payment,
    })
}

fn validate_account(account: &DebtAccount) -> Result<()> {
    let field = |name: &str| format!("{}.{}", account.name, name);

    ensure_non_negative(&field("balance"), account.balance)?;
    ensure_non_negative(&field("annual_rate_pct"), account.annual_rate_pct)?;
    ensure_non_negative(&field("minimum_payment"), account.minimum_payment)?;
    Ok(())
}
