//! Running-balance reconciliation: fill the balances the statement leaves
//! out, and flag the ones it shows that don't add up.
//!
//! Both walks reset their running total at every recorded balance, so one
//! wrong statement figure yields one error instead of cascading through
//! the rest of the sequence. Filled values are consistent by construction
//! and never produce mismatches of their own.

use sterling_core::Transaction;

/// One minor currency unit.
pub const BALANCE_TOLERANCE: f64 = 0.01;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compare each recorded balance against the running total implied by the
/// previous one. The sequence must be in chronological order.
pub fn validate(transactions: &[Transaction]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut running: Option<f64> = None;

    for (i, txn) in transactions.iter().enumerate() {
        if let Some(previous) = running {
            let expected = previous + txn.credit - txn.debit;
            if let Some(observed) = txn.balance {
                let diff = (expected - observed).abs();
                if diff > BALANCE_TOLERANCE {
                    errors.push(format!(
                        "Transaction {} ({}): balance mismatch, expected {:.2}, got {:.2} (diff: {:.2})",
                        i + 1,
                        txn.date,
                        expected,
                        observed,
                        diff
                    ));
                }
                // Observed values re-anchor the walk either way.
                running = Some(observed);
            } else {
                running = Some(expected);
            }
        } else {
            running = txn.balance;
        }
    }

    errors
}

/// Fill unknown balances forward and backward from the first observed one
/// (the anchor). Later observed balances reset the running total rather
/// than compounding earlier error. Without an anchor this is a no-op.
pub fn reconcile(transactions: &mut [Transaction]) {
    let Some(anchor) = transactions.iter().position(|t| t.balance.is_some()) else {
        return;
    };
    let Some(anchor_balance) = transactions[anchor].balance else {
        return;
    };

    let mut running = anchor_balance;
    for i in anchor + 1..transactions.len() {
        running = running + transactions[i].credit - transactions[i].debit;
        match transactions[i].balance {
            Some(observed) => running = observed,
            None => transactions[i].balance = Some(round2(running)),
        }
    }

    let mut running = anchor_balance;
    for i in (0..anchor).rev() {
        running = running - transactions[i + 1].credit + transactions[i + 1].debit;
        match transactions[i].balance {
            Some(observed) => running = observed,
            None => transactions[i].balance = Some(round2(running)),
        }
    }
}
