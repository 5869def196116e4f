//! Normalized transaction records and the externally visible extraction result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of money flow, derived from the resolved amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKind {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
}

impl FlowKind {
    /// Income iff money came in.
    pub fn from_credit(credit: f64) -> Self {
        if credit > 0.0 {
            FlowKind::Income
        } else {
            FlowKind::Expense
        }
    }
}

/// One normalized statement transaction (issuer-agnostic).
///
/// Exactly one of `debit`/`credit` is positive. `balance` is the running
/// balance after this transaction; `None` means the statement never showed
/// one and reconciliation could not derive it, which is distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Money out. Zero when the transaction is a credit.
    pub debit: f64,
    /// Money in. Zero when the transaction is a debit.
    pub credit: f64,
    pub balance: Option<f64>,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: FlowKind,
}

impl Transaction {
    /// Magnitude of the transaction, whichever direction it flows.
    pub fn amount(&self) -> f64 {
        self.debit + self.credit
    }

    pub fn is_income(&self) -> bool {
        self.kind == FlowKind::Income
    }
}

/// The externally visible artifact of one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub transactions: Vec<Transaction>,
    /// Balance mismatches found during reconciliation.
    pub validation_errors: Vec<String>,
    /// Non-fatal observations (e.g. nothing extracted).
    pub validation_warnings: Vec<String>,
    /// 0..100 confidence derived from the error count.
    pub accuracy_score: f64,
}

impl ExtractionResult {
    /// A degraded outcome: nothing extracted, one warning, zero confidence.
    pub fn empty_with_warning(warning: impl Into<String>) -> Self {
        Self {
            transactions: Vec::new(),
            validation_errors: Vec::new(),
            validation_warnings: vec![warning.into()],
            accuracy_score: 0.0,
        }
    }

    pub fn count(&self) -> usize {
        self.transactions.len()
    }
}
