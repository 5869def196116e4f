//! Removes structurally identical transactions.
//!
//! Overlapping extraction strategies (rows and text) and repeated page
//! headers can surface the same real transaction twice; the first
//! occurrence wins.

use std::collections::HashSet;

use sterling_core::Transaction;

/// Drop repeats keyed on (date, amount to the penny, lowercased 30-char
/// description prefix). Idempotent.
pub fn dedupe(transactions: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(transactions.len());

    for txn in transactions {
        let prefix: String = txn
            .description
            .to_lowercase()
            .chars()
            .take(30)
            .collect();
        let pennies = (txn.amount() * 100.0).round() as i64;
        if seen.insert((txn.date, pennies, prefix)) {
            unique.push(txn);
        }
    }

    unique
}
