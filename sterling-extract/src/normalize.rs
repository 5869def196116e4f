//! Assembles resolved block parts into canonical transactions, with the
//! description cleanup the raw statement text needs: reference noise,
//! continuation markers, repeated phrases from merged columns, issuer
//! boilerplate.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use sterling_core::{
    Classification, DescriptionPolicy, FlowKind, Profile, Transaction, type_code_name,
};

use crate::amount::AmountSet;
use crate::segment::RawBlock;

/// Descriptions are truncated to fit tabular display.
pub const MAX_DESCRIPTION_LEN: usize = 50;

static AMOUNT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d{1,5}(?:,\d{3})*\.\d{2}").expect("amount token pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

static NOISE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Ref:\s*[A-Za-z0-9\-_/\.]+",
        r"(?i)Card:\s*\d+",
        // "On 03 Apr" date-continuation markers
        r"(?i)\bOn\s+\d{1,2}(\s+[A-Za-z]{3})?(\s+\d{4})?\b",
        // Foreign-exchange boilerplate
        r"(?i)EUR\s+[\d.,]+\s+at\s+VISA\s+Exchange\s+Rate[^.]*\.?",
        r"(?i)The\s+Final\s+GBP\s+Amount\s+Includes.*",
        r"(?i)Non-Sterling\s+Transaction\s+Fee.*",
        // Issuer footer text that bleeds into extracted lines
        r"(?i)Authorised by.*",
        r"(?i)Registered.*",
        r"(?i)Continued.*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("noise pattern"))
    .collect()
});

static TYPE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(card payment to|direct debit to|payment to|card purchase)\s*")
        .expect("type prefix pattern")
});

/// Build the canonical record for one resolved block.
pub fn normalize(
    block: &RawBlock,
    date: NaiveDate,
    amounts: &AmountSet,
    classification: &Classification,
    profile: &Profile,
) -> Transaction {
    let (debit, credit) = if classification.is_income {
        (0.0, amounts.amount)
    } else {
        (amounts.amount, 0.0)
    };

    let mut description = clean_description(
        &description_source(block),
        profile.description_policy,
        MAX_DESCRIPTION_LEN,
    );
    if let Some(name) = bare_code_name(&description) {
        description = name.to_string();
    }
    if description.is_empty() {
        description = format!("{} transaction", profile.display_name);
    }

    Transaction {
        date,
        description,
        debit,
        credit,
        balance: amounts.balance,
        category: classification.category.clone(),
        kind: FlowKind::from_credit(credit),
    }
}

/// Block text minus the date anchor and the numeric tokens.
fn description_source(block: &RawBlock) -> String {
    let mut text = block.text();
    if let Some(anchor) = &block.date_text {
        if let Some(stripped) = text.strip_prefix(anchor.as_str()) {
            text = stripped.to_string();
        } else {
            text = text.replacen(anchor.as_str(), " ", 1);
        }
    }
    AMOUNT_TOKEN.replace_all(&text, " ").into_owned()
}

/// Strip noise, collapse whitespace, drop repeated phrases, truncate at a
/// word boundary.
pub fn clean_description(text: &str, policy: DescriptionPolicy, max_len: usize) -> String {
    let mut cleaned = text.to_string();

    for pattern in NOISE_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    if policy == DescriptionPolicy::StripTypePrefix {
        cleaned = TYPE_PREFIX.replace(cleaned.trim(), "").into_owned();
    }

    cleaned = WHITESPACE.replace_all(&cleaned, " ").trim().to_string();
    cleaned = dedupe_phrases(&cleaned);
    cleaned = cleaned
        .trim_matches(|c: char| ".,;:- ".contains(c))
        .to_string();

    truncate_at_word(&cleaned, max_len)
}

/// Remove the second occurrence of any phrase of three or more words.
/// Column-merged extractions routinely repeat the leading phrase
/// ("Direct Debit to V12 Finance Direct Debit to").
fn dedupe_phrases(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();

    'scan: loop {
        let n = words.len();
        for phrase_len in 3..=n / 2 {
            for i in 0..=n - phrase_len * 2 {
                for j in (i + phrase_len)..=(n - phrase_len) {
                    if words[i..i + phrase_len] == words[j..j + phrase_len] {
                        words.drain(j..j + phrase_len);
                        continue 'scan;
                    }
                }
            }
        }
        break;
    }

    words.join(" ")
}

fn truncate_at_word(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_len).collect();
    match truncated.rfind(' ') {
        // Break at the last space unless that loses too much of the text.
        Some(pos) if pos * 10 > max_len * 6 => format!("{}...", &truncated[..pos]),
        _ => format!("{truncated}..."),
    }
}

/// A description that is nothing but a known type code reads better as the
/// code's full name.
fn bare_code_name(description: &str) -> Option<&'static str> {
    let mut tokens = description.split_whitespace();
    let first = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    type_code_name(first)
}
