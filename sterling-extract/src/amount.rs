//! Currency token extraction and (amount, balance) assignment.
//!
//! Statement text is full of things shaped like amounts that aren't:
//! account numbers, card references, sort codes. Those are stripped before
//! token extraction, and the surviving tokens are assigned by count and
//! magnitude. Getting this wrong either fabricates a balance or drops a
//! legitimate row, so the 2-token ambiguous case deliberately withholds
//! judgment instead of guessing.

use once_cell::sync::Lazy;
use regex::Regex;
use sterling_core::{AmountPick, Profile};

static AMOUNT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,5}(?:,\d{3})*\.\d{2}").expect("amount token pattern"));

// Shapes that contain amount-like digit runs but are never amounts.
static LONG_DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{10,}\b").expect("digit run pattern"));
static CARD_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bCD\s+\d+").expect("card ref pattern"));
static SORT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{2}-\d{2}-\d{2}\b").expect("sort code pattern"));
static REF_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,}\d{8,}\b").expect("ref code pattern"));

/// Resolved numeric tokens for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountSet {
    /// The transaction amount (always positive; direction comes from
    /// classification).
    pub amount: f64,
    /// Observed running balance, when one could be attributed safely.
    pub balance: Option<f64>,
}

/// Remove noise subsequences that would otherwise read as amounts.
pub fn strip_noise(text: &str) -> String {
    let text = LONG_DIGIT_RUN.replace_all(text, " ");
    let text = CARD_REF.replace_all(&text, " ");
    let text = SORT_CODE.replace_all(&text, " ");
    REF_CODE.replace_all(&text, " ").into_owned()
}

/// Currency-shaped tokens within the profile's plausible range, in order.
pub fn extract_amounts(text: &str, profile: &Profile) -> Vec<f64> {
    let cleaned = strip_noise(text);
    AMOUNT_TOKEN
        .find_iter(&cleaned)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .filter(|v| *v >= profile.min_amount && *v <= profile.max_amount)
        .collect()
}

/// Assign extracted tokens to transaction amount and balance.
///
/// Returns `None` when the block holds no usable token at all.
pub fn resolve(block_text: &str, profile: &Profile) -> Option<AmountSet> {
    let tokens = extract_amounts(block_text, profile);

    if !profile.has_running_balance {
        let amount = *tokens.first()?;
        return Some(AmountSet {
            amount,
            balance: None,
        });
    }

    match tokens.as_slice() {
        [] => None,
        [amount] => Some(AmountSet {
            amount: *amount,
            balance: None,
        }),
        [a, b] => {
            if *b > *a * 10.0 {
                Some(AmountSet {
                    amount: *a,
                    balance: Some(*b),
                })
            } else if *a > *b * 10.0 {
                Some(AmountSet {
                    amount: *b,
                    balance: Some(*a),
                })
            } else {
                // Similar magnitudes: the second token may belong to an
                // adjacent transaction. Take the first as the amount and
                // withhold the balance; reconciliation fills the gap.
                Some(AmountSet {
                    amount: *a,
                    balance: None,
                })
            }
        }
        tokens => {
            let balance = tokens[tokens.len() - 1];
            let amount = match profile.amount_pick {
                AmountPick::First => tokens[0],
                AmountPick::BeforeBalance => tokens[tokens.len() - 2],
            };
            Some(AmountSet {
                amount,
                balance: Some(balance),
            })
        }
    }
}

/// Parse one explicit amount string: `£1,234.56`, `(12.34)` for negative,
/// `-12.34`. Returns 0.0 for anything unparseable.
pub fn parse_amount(text: &str) -> f64 {
    let mut clean = text.trim().to_string();

    let mut negative = false;
    if clean.starts_with('(') && clean.ends_with(')') {
        clean = clean[1..clean.len() - 1].to_string();
        negative = true;
    }

    clean = clean.replace('£', "").replace(',', "").replace(' ', "");

    if let Some(rest) = clean.strip_prefix('-') {
        negative = true;
        clean = rest.to_string();
    }

    match clean.parse::<f64>() {
        Ok(v) if negative => -v,
        Ok(v) => v,
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sterling_core::profile;

    fn barclays() -> &'static Profile {
        profile("barclays").unwrap()
    }

    #[test]
    fn test_fee_and_balance_split_by_ratio() {
        let set = resolve("Fee 5.00 1023.40", barclays()).unwrap();
        assert_eq!(set.amount, 5.00);
        assert_eq!(set.balance, Some(1023.40));
    }

    #[test]
    fn test_single_token_has_no_balance() {
        let set = resolve("Direct Debit to Acme Ltd 42.00", barclays()).unwrap();
        assert_eq!(set.amount, 42.00);
        assert_eq!(set.balance, None);
    }

    #[test]
    fn test_similar_magnitudes_withhold_balance() {
        // 38.70 vs 45.20 could be two adjacent transactions; never guess.
        let set = resolve("Card Payment Tesco 38.70 45.20", barclays()).unwrap();
        assert_eq!(set.amount, 38.70);
        assert_eq!(set.balance, None);
    }

    #[test]
    fn test_reversed_pair_still_finds_balance() {
        let set = resolve("1023.40 Fee 5.00", barclays()).unwrap();
        assert_eq!(set.amount, 5.00);
        assert_eq!(set.balance, Some(1023.40));
    }

    #[test]
    fn test_three_tokens_rightmost_is_balance() {
        let set = resolve("Card Payment 12.40 1.50 1023.40", barclays()).unwrap();
        assert_eq!(set.amount, 12.40);
        assert_eq!(set.balance, Some(1023.40));
    }

    #[test]
    fn test_before_balance_pick() {
        let monzo = profile("monzo").unwrap();
        let set = resolve("SHOP 24 7 1.50 4.20 95.50", monzo).unwrap();
        assert_eq!(set.amount, 4.20);
        assert_eq!(set.balance, Some(95.50));
    }

    #[test]
    fn test_no_tokens_rejects_block() {
        assert_eq!(resolve("Statement period April 2023", barclays()), None);
    }

    #[test]
    fn test_noise_is_stripped() {
        // Sort code and account number must not read as amounts.
        let cleaned = strip_noise("20-45-67 12345678901234 CD 4401 balance 1,250.00");
        assert!(!cleaned.contains("20-45-67"));
        assert!(!cleaned.contains("4401"));
        assert!(cleaned.contains("1,250.00"));

        let amounts = extract_amounts("Sort code 20-45-67 paid 38.70", barclays());
        assert_eq!(amounts, vec![38.70]);
    }

    #[test]
    fn test_reference_codes_are_stripped() {
        let amounts = extract_amounts("Ref AB12345678 FPO9912345678 10.00", barclays());
        assert_eq!(amounts, vec![10.00]);
    }

    #[test]
    fn test_out_of_range_tokens_dropped() {
        // Above the plausible ceiling.
        let amounts = extract_amounts("transfer 99999,999.00 10.00", barclays());
        assert_eq!(amounts, vec![10.00]);
    }

    #[test]
    fn test_parse_amount_forms() {
        assert_eq!(parse_amount("£1,234.56"), 1234.56);
        assert_eq!(parse_amount("(12.34)"), -12.34);
        assert_eq!(parse_amount("-12.34"), -12.34);
        assert_eq!(parse_amount("38.70"), 38.70);
        assert_eq!(parse_amount("n/a"), 0.0);
    }
}
