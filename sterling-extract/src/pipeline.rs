//! End-to-end extraction: the state machine tying every stage together.
//!
//! Detecting → ProfileLoaded → Segmenting → Resolving → Reconciling →
//! Scoring → Done, with Failed reachable from every state. Unreadable
//! input and an unidentified source abort; everything else degrades to a
//! partial or empty result.

use serde::{Deserialize, Serialize};
use sterling_core::{
    EventSink, ExtractError, ExtractEvent, ExtractionMethod, ExtractionResult, PipelineState,
    Profile, Transaction, classify_with_profile, profile,
};

use crate::amount;
use crate::date::{self, YearTracker};
use crate::dedupe::dedupe;
use crate::normalize::normalize;
use crate::reconcile;
use crate::score::score;
use crate::segment::{self, RawBlock};

/// Everything the collaborators hand the engine for one statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementInput {
    /// Issuer id naming the profile, from the external detector.
    pub source: String,
    /// Plain text per page, newline-delimited.
    pub pages: Vec<String>,
    /// Pre-segmented table rows, when layout detection found any.
    pub rows: Option<Vec<Vec<String>>>,
    /// Statement year for layouts whose row dates omit it.
    pub year_hint: Option<i32>,
}

/// Run the whole pipeline over one statement.
pub fn extract(
    input: &StatementInput,
    sink: &mut dyn EventSink,
) -> Result<ExtractionResult, ExtractError> {
    sink.emit(ExtractEvent::StateChanged(PipelineState::Detecting));

    let text = input.pages.join("\n");
    let rows = input.rows.as_deref().unwrap_or(&[]);
    if text.trim().is_empty() && rows.is_empty() {
        sink.emit(ExtractEvent::StateChanged(PipelineState::Failed));
        return Err(ExtractError::UnreadableInput);
    }

    let source = input.source.trim();
    if source.is_empty() || source.eq_ignore_ascii_case("unknown") {
        sink.emit(ExtractEvent::StateChanged(PipelineState::Failed));
        return Err(ExtractError::SourceUnidentified);
    }

    let Some(profile) = profile(source) else {
        sink.emit(ExtractEvent::StateChanged(PipelineState::Failed));
        return Ok(ExtractionResult::empty_with_warning(format!(
            "Statements from '{source}' are not supported yet"
        )));
    };
    sink.emit(ExtractEvent::StateChanged(PipelineState::ProfileLoaded));

    let year_hint = input
        .year_hint
        .or_else(|| date::infer_year(input.pages.first().map(String::as_str).unwrap_or(&text)));

    sink.emit(ExtractEvent::StateChanged(PipelineState::Segmenting));
    let lines: Vec<&str> = text.lines().collect();
    if let Some(line) = segment::header_line(&lines, profile) {
        sink.emit(ExtractEvent::HeaderLocated { line });
    }
    let text_blocks = segment::segment(&lines, profile);
    let row_blocks = segment::segment_rows(rows, profile);
    if text_blocks.is_empty() && row_blocks.is_empty() {
        sink.emit(ExtractEvent::StateChanged(PipelineState::Failed));
        return Ok(ExtractionResult::empty_with_warning(
            "No transactions found in statement",
        ));
    }

    sink.emit(ExtractEvent::StateChanged(PipelineState::Resolving));
    let from_text = resolve_blocks(&text_blocks, profile, year_hint, sink);
    let from_rows = resolve_blocks(&row_blocks, profile, year_hint, sink);

    let text_confidence = extraction_confidence(&from_text);
    let rows_confidence = extraction_confidence(&from_rows);
    let (method, mut transactions, confidence) = if rows_confidence > text_confidence {
        (ExtractionMethod::Rows, from_rows, rows_confidence)
    } else {
        (ExtractionMethod::Text, from_text, text_confidence)
    };
    sink.emit(ExtractEvent::StrategySelected {
        method,
        confidence,
        count: transactions.len(),
    });

    if transactions.is_empty() {
        sink.emit(ExtractEvent::StateChanged(PipelineState::Failed));
        return Ok(ExtractionResult::empty_with_warning(
            "No transactions found in statement",
        ));
    }

    sink.emit(ExtractEvent::StateChanged(PipelineState::Reconciling));
    if profile.reverse_chronological {
        // The balance recurrence only holds oldest-first.
        transactions.reverse();
    }
    reconcile::reconcile(&mut transactions);

    let mut transactions = dedupe(transactions);
    transactions.sort_by_key(|t| t.date);

    let validation_errors = if profile.has_running_balance {
        reconcile::validate(&transactions)
    } else {
        Vec::new()
    };
    for error in &validation_errors {
        sink.emit(ExtractEvent::BalanceMismatch {
            detail: error.clone(),
        });
    }

    sink.emit(ExtractEvent::StateChanged(PipelineState::Scoring));
    let accuracy_score = score(transactions.len(), validation_errors.len());

    sink.emit(ExtractEvent::StateChanged(PipelineState::Done));
    sink.emit(ExtractEvent::Finished {
        count: transactions.len(),
        accuracy: accuracy_score,
    });

    Ok(ExtractionResult {
        transactions,
        validation_errors,
        validation_warnings: Vec::new(),
        accuracy_score,
    })
}

/// Resolve each block to a transaction, dropping malformed blocks alone.
fn resolve_blocks(
    blocks: &[RawBlock],
    profile: &Profile,
    year_hint: Option<i32>,
    sink: &mut dyn EventSink,
) -> Vec<Transaction> {
    let mut tracker = year_hint.map(|y| YearTracker::new(y, profile.reverse_chronological));
    let mut last_date = None;
    let mut transactions = Vec::new();

    for block in blocks {
        let text = block.text();

        let Some(amounts) = amount::resolve(&text, profile) else {
            sink.emit(ExtractEvent::BlockDiscarded {
                line: block.start_line,
                reason: "no amount tokens",
            });
            continue;
        };

        let date = match &block.date_text {
            Some(date_text) => {
                let parsed = match tracker.as_mut() {
                    Some(tracker) => date::parse_tracked(date_text, profile, tracker),
                    None => date::parse(date_text, profile, None),
                };
                match parsed {
                    Some(date) => date,
                    None => {
                        sink.emit(ExtractEvent::BlockDiscarded {
                            line: block.start_line,
                            reason: "unparseable date",
                        });
                        continue;
                    }
                }
            }
            None => match last_date {
                Some(date) => date,
                None => {
                    sink.emit(ExtractEvent::BlockDiscarded {
                        line: block.start_line,
                        reason: "no date context",
                    });
                    continue;
                }
            },
        };
        last_date = Some(date);

        let classification = classify_with_profile(&text, profile);
        transactions.push(normalize(block, date, &amounts, &classification, profile));
    }

    transactions
}

/// Completeness confidence for one candidate transaction set: weighted
/// mix of how many rows surfaced, how many carry a usable amount, and how
/// many carry a balance.
fn extraction_confidence(transactions: &[Transaction]) -> f64 {
    if transactions.is_empty() {
        return 0.0;
    }

    let total = transactions.len() as f64;
    let mut confidence = (total / 10.0).min(1.0) * 0.3;

    let complete = transactions
        .iter()
        .filter(|t| !t.description.is_empty() && (t.debit > 0.0 || t.credit > 0.0))
        .count() as f64;
    confidence += (complete / total) * 0.4;

    let with_balance = transactions.iter().filter(|t| t.balance.is_some()).count() as f64;
    confidence += (with_balance / total) * 0.3;

    confidence.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sterling_core::{FlowKind, NullSink};

    fn txn(balance: Option<f64>) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
            description: "Tesco".to_string(),
            debit: 5.0,
            credit: 0.0,
            balance,
            category: "other".to_string(),
            kind: FlowKind::Expense,
        }
    }

    #[test]
    fn test_confidence_rewards_balances() {
        let without = vec![txn(None), txn(None)];
        let with = vec![txn(Some(10.0)), txn(Some(5.0))];
        assert!(extraction_confidence(&with) > extraction_confidence(&without));
        assert_eq!(extraction_confidence(&[]), 0.0);
    }

    #[test]
    fn test_unreadable_input_aborts() {
        let input = StatementInput {
            source: "barclays".to_string(),
            ..Default::default()
        };
        let result = extract(&input, &mut NullSink);
        assert_eq!(result, Err(ExtractError::UnreadableInput));
    }

    #[test]
    fn test_unidentified_source_aborts() {
        let input = StatementInput {
            source: "unknown".to_string(),
            pages: vec!["some statement text".to_string()],
            ..Default::default()
        };
        let result = extract(&input, &mut NullSink);
        assert_eq!(result, Err(ExtractError::SourceUnidentified));
    }

    #[test]
    fn test_unsupported_source_degrades() {
        let input = StatementInput {
            source: "first-direct".to_string(),
            pages: vec!["some statement text".to_string()],
            ..Default::default()
        };
        let result = extract(&input, &mut NullSink).unwrap();
        assert!(result.transactions.is_empty());
        assert_eq!(result.accuracy_score, 0.0);
        assert!(result.validation_warnings[0].contains("not supported"));
    }
}
