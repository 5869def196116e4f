//! Income/expense classification from free statement text.
//!
//! Ordered rule tables, income before expense, first match wins. Ordering
//! matters: "payment from X" is income while bare "payment" defaults to
//! expense, so the qualified phrase must be tried first.

use serde::{Deserialize, Serialize};

use crate::profile::{Profile, type_code_name};

/// Direction verdict for one block of statement text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub is_income: bool,
    pub category: String,
    /// Heuristic certainty, 0..1.
    pub confidence: f64,
}

struct Rule {
    keywords: &'static [&'static str],
    category: &'static str,
    confidence: f64,
}

const INCOME_RULES: &[Rule] = &[
    Rule {
        keywords: &["bill payment from"],
        category: "credit",
        confidence: 0.98,
    },
    Rule {
        keywords: &["received from", "received"],
        category: "credit",
        confidence: 0.95,
    },
    Rule {
        keywords: &["payment from"],
        category: "credit",
        confidence: 0.90,
    },
    Rule {
        keywords: &["transfer from"],
        category: "transfer",
        confidence: 0.90,
    },
    Rule {
        keywords: &["salary", "wages", "wage"],
        category: "salary",
        confidence: 0.95,
    },
    Rule {
        keywords: &["deposit"],
        category: "deposit",
        confidence: 0.90,
    },
    Rule {
        keywords: &["card refund", "refund"],
        category: "refund",
        confidence: 0.95,
    },
    Rule {
        keywords: &["automated credit", "bank giro credit"],
        category: "credit",
        confidence: 0.90,
    },
    Rule {
        keywords: &["credit"],
        category: "credit",
        confidence: 0.75,
    },
];

const EXPENSE_RULES: &[Rule] = &[
    Rule {
        keywords: &["direct debit", "dd "],
        category: "direct_debit",
        confidence: 0.95,
    },
    Rule {
        keywords: &["bill payment to"],
        category: "bill_payment",
        confidence: 0.95,
    },
    Rule {
        keywords: &["bill payment"],
        category: "bill_payment",
        confidence: 0.85,
    },
    Rule {
        keywords: &["card payment", "card purchase", "contactless"],
        category: "card_payment",
        confidence: 0.90,
    },
    Rule {
        keywords: &["standing order"],
        category: "standing_order",
        confidence: 0.95,
    },
    Rule {
        keywords: &["transfer to"],
        category: "transfer",
        confidence: 0.85,
    },
    Rule {
        keywords: &["payment to"],
        category: "payment",
        confidence: 0.85,
    },
    Rule {
        keywords: &["cash withdrawal", "cashpoint", "atm "],
        category: "atm",
        confidence: 0.85,
    },
    Rule {
        keywords: &["debit"],
        category: "debit",
        confidence: 0.70,
    },
];

/// Classify a block of statement text by its wording alone.
pub fn classify(text: &str) -> Classification {
    let lower = text.to_lowercase();

    for rule in INCOME_RULES {
        if rule.keywords.iter().any(|kw| lower.contains(kw)) {
            return Classification {
                is_income: true,
                category: rule.category.to_string(),
                confidence: rule.confidence,
            };
        }
    }

    for rule in EXPENSE_RULES {
        if rule.keywords.iter().any(|kw| lower.contains(kw)) {
            return Classification {
                is_income: false,
                category: rule.category.to_string(),
                confidence: rule.confidence,
            };
        }
    }

    // Statements are mostly spending; an unrecognized block is far more
    // likely an expense than income.
    Classification {
        is_income: false,
        category: "other".to_string(),
        confidence: 0.6,
    }
}

/// Classify with the issuer's printed type codes consulted first.
///
/// A type code (FPI, DD, SO...) is a stronger signal than the free text
/// around it, so a code hit short-circuits the keyword tables. Phrase-style
/// entries in the profile lists ("payment from") already exist in the
/// keyword tables with their proper categories, so only the short code
/// tokens are checked here.
pub fn classify_with_profile(text: &str, profile: &Profile) -> Classification {
    if let Some(code) = find_code_token(text, profile.credit_codes) {
        return Classification {
            is_income: true,
            category: code_label(code),
            confidence: 0.95,
        };
    }
    if let Some(code) = find_code_token(text, profile.debit_codes) {
        return Classification {
            is_income: false,
            category: code_label(code),
            confidence: 0.95,
        };
    }
    classify(text)
}

/// First short all-caps code from `codes` appearing as a standalone token.
fn find_code_token(text: &str, codes: &'static [&'static str]) -> Option<&'static str> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .find_map(|token| {
            codes
                .iter()
                .find(|code| {
                    code.len() <= 4
                        && code.chars().all(|c| c.is_ascii_uppercase())
                        && token == **code
                })
                .copied()
        })
}

/// "DD" -> "direct_debit", unknown codes fall back to the code itself.
fn code_label(code: &str) -> String {
    type_code_name(code)
        .unwrap_or(code)
        .to_lowercase()
        .replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile;

    #[test]
    fn test_direct_debit_is_expense() {
        let c = classify("Direct Debit to Acme Ltd 42.00");
        assert!(!c.is_income);
        assert_eq!(c.category, "direct_debit");
        assert_eq!(c.confidence, 0.95);
    }

    #[test]
    fn test_payment_from_beats_bare_payment() {
        let c = classify("Payment From J Smith rent");
        assert!(c.is_income);
        assert_eq!(c.category, "credit");

        let c = classify("Payment to J Smith rent");
        assert!(!c.is_income);
        assert_eq!(c.category, "payment");
    }

    #[test]
    fn test_bill_payment_from_is_income() {
        let c = classify("Bill Payment From Acme Ltd");
        assert!(c.is_income);
        assert_eq!(c.confidence, 0.98);
    }

    #[test]
    fn test_refund_is_income() {
        let c = classify("Card Refund Amazon Marketplace");
        assert!(c.is_income);
        assert_eq!(c.category, "refund");
    }

    #[test]
    fn test_unmatched_defaults_to_expense() {
        let c = classify("TESCO STORES 3512");
        assert!(!c.is_income);
        assert_eq!(c.category, "other");
        assert_eq!(c.confidence, 0.6);
    }

    #[test]
    fn test_profile_codes_win() {
        let lloyds = profile("lloyds").unwrap();
        let c = classify_with_profile("02 JAN 23 FPI J SMITH 250.00", lloyds);
        assert!(c.is_income);
        assert_eq!(c.category, "faster_payment_in");

        let c = classify_with_profile("03 JAN 23 SO Rent 750.00", lloyds);
        assert!(!c.is_income);
        assert_eq!(c.category, "standing_order");
    }

    #[test]
    fn test_falls_back_to_keywords_without_codes() {
        let monzo = profile("monzo").unwrap();
        let c = classify_with_profile("01/02/2023 PRET A MANGER", monzo);
        assert!(!c.is_income);
        assert_eq!(c.category, "other");
    }
}
