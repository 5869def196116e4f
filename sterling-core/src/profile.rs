//! Per-issuer statement profiles: the declarative data driving every
//! heuristic stage of the extraction engine.
//!
//! One profile per supported issuer, loaded once and shared process-wide.
//! Layout differences between issuers live entirely in this data plus two
//! named hook strategies; the engine itself is issuer-agnostic.

use once_cell::sync::Lazy;
use regex::Regex;

/// Which token among the non-balance candidates is the transaction amount
/// when a block yields three or more currency tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountPick {
    /// Leftmost token, for columnar money-out/money-in layouts where the
    /// amount column precedes everything else.
    First,
    /// Token immediately left of the balance, for layouts printing the
    /// amount and balance as an adjacent pair at the line end.
    BeforeBalance,
}

/// How aggressively the normalizer rewrites descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionPolicy {
    /// Keep the full cleaned text.
    Full,
    /// Also strip leading type phrases ("card payment to", ...), leaving
    /// the counterparty.
    StripTypePrefix,
}

/// Read-only configuration for one statement issuer.
pub struct Profile {
    pub id: &'static str,
    pub display_name: &'static str,
    /// chrono format strings, tried in order. Formats without a year get
    /// the caller's year hint appended.
    pub date_formats: &'static [&'static str],
    /// Matches the date that opens a transaction block. Only a match at
    /// the start of a line (or cell) counts.
    pub date_anchor: Regex,
    /// Type codes / phrases indicating money in.
    pub credit_codes: &'static [&'static str],
    /// Type codes / phrases indicating money out.
    pub debit_codes: &'static [&'static str],
    pub header_keywords: &'static [&'static str],
    /// How many lines before a date anchor may hold the merchant name.
    pub max_lookback: usize,
    /// How many lines one block may absorb before being force-closed.
    pub max_lookahead: usize,
    /// Lowercase substrings marking footer/summary lines that terminate a
    /// block without joining it.
    pub ignore_patterns: &'static [&'static str],
    pub min_amount: f64,
    pub max_amount: f64,
    /// Newest transaction printed first.
    pub reverse_chronological: bool,
    /// Statement prints a running balance column.
    pub has_running_balance: bool,
    /// Merchant name printed on the line(s) before the date line.
    pub merchant_before_date: bool,
    pub amount_pick: AmountPick,
    pub description_policy: DescriptionPolicy,
}

impl Profile {
    /// The anchor text when `line` begins with this profile's date shape.
    pub fn anchor_match<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.date_anchor
            .find(line)
            .filter(|m| m.start() == 0)
            .map(|m| m.as_str())
    }

    /// True when the line is a header row: at least two header keywords.
    pub fn is_header_line(&self, line: &str) -> bool {
        self.header_keywords
            .iter()
            .filter(|kw| line.contains(*kw))
            .count()
            >= 2
    }

    /// True when the line is footer/summary noise the segmenter must not
    /// absorb into a block.
    pub fn should_ignore(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.ignore_patterns.iter().any(|p| lower.contains(p))
    }

    pub fn is_credit_code(&self, text: &str) -> bool {
        Self::matches_code_list(text, self.credit_codes)
    }

    pub fn is_debit_code(&self, text: &str) -> bool {
        Self::matches_code_list(text, self.debit_codes)
    }

    /// Phrase codes match as lowercase substrings; short all-caps codes
    /// (PI, DD, FPI...) must appear as standalone uppercase tokens, or a
    /// code like "PI" would fire inside ordinary words.
    fn matches_code_list(text: &str, codes: &[&str]) -> bool {
        let lower = text.to_lowercase();
        codes.iter().any(|code| {
            if code.len() <= 4 && code.chars().all(|c| c.is_ascii_uppercase()) {
                text.split(|c: char| !c.is_ascii_alphanumeric())
                    .any(|token| token == *code)
            } else {
                lower.contains(&code.to_lowercase())
            }
        })
    }
}

fn anchor(pattern: &str) -> Regex {
    Regex::new(pattern).expect("date anchor pattern compiles")
}

static PROFILES: Lazy<Vec<Profile>> = Lazy::new(|| {
    vec![
        Profile {
            id: "barclays",
            display_name: "Barclays",
            date_formats: &["%d %b %Y", "%d %b"],
            date_anchor: anchor(r"^\d{1,2}\s+[A-Za-z]{3}\b"),
            credit_codes: &[
                "received",
                "payment from",
                "transfer from",
                "deposit",
                "refund",
                "credit",
            ],
            debit_codes: &[
                "direct debit",
                "card payment",
                "bill payment",
                "transfer to",
                "standing order",
            ],
            header_keywords: &["Date", "Description", "Money out", "Money in", "Balance"],
            max_lookback: 3,
            max_lookahead: 25,
            ignore_patterns: &[
                "start balance",
                "end balance",
                "continued",
                "barclays bank uk plc",
            ],
            min_amount: 0.01,
            max_amount: 100_000.0,
            reverse_chronological: false,
            has_running_balance: true,
            merchant_before_date: false,
            amount_pick: AmountPick::First,
            description_policy: DescriptionPolicy::StripTypePrefix,
        },
        Profile {
            id: "monzo",
            display_name: "Monzo",
            date_formats: &["%d/%m/%Y"],
            date_anchor: anchor(r"^\d{1,2}/\d{1,2}/\d{4}"),
            credit_codes: &["deposit", "received", "transfer in"],
            debit_codes: &["payment", "transfer out", "withdrawal"],
            header_keywords: &["Date", "Description", "Amount", "Balance"],
            max_lookback: 4,
            max_lookahead: 3,
            ignore_patterns: &["reference:", "this relates to"],
            min_amount: 0.01,
            max_amount: 100_000.0,
            reverse_chronological: true,
            has_running_balance: true,
            merchant_before_date: true,
            amount_pick: AmountPick::BeforeBalance,
            description_policy: DescriptionPolicy::Full,
        },
        Profile {
            id: "lloyds",
            display_name: "Lloyds Bank",
            date_formats: &["%d %b %y", "%d %B %y"],
            date_anchor: anchor(r"^\d{2}\s+[A-Z]{3}\s+\d{2}\b"),
            credit_codes: &["PI", "FPI", "MPI", "BGC", "DEP", "TFR"],
            debit_codes: &[
                "PO", "FPO", "MPO", "EB", "DEB", "DD", "CHQ", "CPT", "SO", "BP",
            ],
            header_keywords: &[
                "Date",
                "Description",
                "Type",
                "Money In",
                "Money Out",
                "Balance",
            ],
            max_lookback: 2,
            max_lookahead: 5,
            ignore_patterns: &["balance brought forward", "balance carried forward"],
            min_amount: 0.01,
            max_amount: 100_000.0,
            reverse_chronological: false,
            has_running_balance: true,
            merchant_before_date: false,
            amount_pick: AmountPick::First,
            description_policy: DescriptionPolicy::StripTypePrefix,
        },
        Profile {
            id: "hsbc",
            display_name: "HSBC",
            date_formats: &["%d %b %y"],
            date_anchor: anchor(r"^\d{2}\s+[A-Z][a-z]{2}\s+\d{2}\b"),
            credit_codes: &[
                "CR",
                "wages",
                "salary",
                "deposit",
                "transfer in",
                "credit",
                "BGC",
                "FPI",
            ],
            debit_codes: &[
                "DD", "SO", "ATM", "VIS", "BP", "FPO", "CHQ", "CPT", "TFR",
            ],
            header_keywords: &["Date", "Payment type", "Paid out", "Paid in", "Balance"],
            max_lookback: 2,
            max_lookahead: 5,
            ignore_patterns: &["balance forward", "balance carried"],
            min_amount: 0.01,
            max_amount: 100_000.0,
            reverse_chronological: false,
            has_running_balance: true,
            merchant_before_date: false,
            amount_pick: AmountPick::First,
            description_policy: DescriptionPolicy::StripTypePrefix,
        },
        Profile {
            id: "revolut",
            display_name: "Revolut",
            date_formats: &["%d %b %Y"],
            date_anchor: anchor(r"^\d{1,2}\s+[A-Z][a-z]{2}\s+\d{4}\b"),
            credit_codes: &["transfer from", "received", "refund"],
            debit_codes: &["transfer to", "payment", "purchase"],
            header_keywords: &["Date", "Description", "Money in", "Money out", "Balance"],
            max_lookback: 2,
            max_lookahead: 3,
            ignore_patterns: &["from:", "to:"],
            min_amount: 0.01,
            max_amount: 100_000.0,
            reverse_chronological: false,
            has_running_balance: true,
            merchant_before_date: false,
            amount_pick: AmountPick::First,
            description_policy: DescriptionPolicy::StripTypePrefix,
        },
        Profile {
            id: "natwest",
            display_name: "NatWest",
            date_formats: &["%d %b %Y"],
            date_anchor: anchor(r"^\d{1,2}\s+[A-Z][a-z]{2}\s+\d{4}\b"),
            credit_codes: &["automated credit", "refund"],
            debit_codes: &[
                "debit card",
                "mobile/online",
                "direct debit",
                "standing order",
            ],
            header_keywords: &["Date", "Type", "Description", "Paid in", "Paid out", "Balance"],
            max_lookback: 2,
            max_lookahead: 4,
            ignore_patterns: &["brought forward"],
            min_amount: 0.01,
            max_amount: 100_000.0,
            reverse_chronological: false,
            has_running_balance: true,
            merchant_before_date: false,
            amount_pick: AmountPick::First,
            description_policy: DescriptionPolicy::StripTypePrefix,
        },
        Profile {
            id: "santander",
            display_name: "Santander",
            // Ordinal suffixes (3rd Dec) are stripped before these apply.
            date_formats: &["%d %b %Y", "%d %b"],
            date_anchor: anchor(r"^\d{1,2}(?:st|nd|rd|th)\s+[A-Z][a-z]{2}\b"),
            credit_codes: &[
                "receipt",
                "transfer from",
                "bank giro credit",
                "credit ref",
            ],
            debit_codes: &[
                "payment to",
                "direct debit",
                "card payment",
                "bill payment",
            ],
            header_keywords: &["Date", "Description", "Credits", "Debits", "Balance"],
            max_lookback: 2,
            max_lookahead: 4,
            ignore_patterns: &[
                "previous statement balance",
                "total credits",
                "total debits",
                "current statement balance",
            ],
            min_amount: 0.01,
            max_amount: 100_000.0,
            reverse_chronological: false,
            has_running_balance: true,
            merchant_before_date: false,
            amount_pick: AmountPick::First,
            description_policy: DescriptionPolicy::StripTypePrefix,
        },
        Profile {
            id: "anna",
            display_name: "ANNA Money",
            date_formats: &["%d %b %Y"],
            date_anchor: anchor(r"^\d{1,2}\s+[A-Z][a-z]{2}\s+\d{4}\b"),
            credit_codes: &["FP", "P2P", "TFR"],
            debit_codes: &["POS", "FEE", "DD", "ATM", "SO"],
            header_keywords: &[
                "Processed on",
                "Created on",
                "Type",
                "Paid out",
                "Paid in",
                "Balance",
            ],
            max_lookback: 2,
            max_lookahead: 4,
            ignore_patterns: &["anna is an electronic money", "page"],
            min_amount: 0.01,
            max_amount: 100_000.0,
            reverse_chronological: false,
            has_running_balance: true,
            merchant_before_date: false,
            amount_pick: AmountPick::First,
            description_policy: DescriptionPolicy::StripTypePrefix,
        },
        Profile {
            id: "wise",
            display_name: "Wise",
            date_formats: &["%d %B %Y", "%d %b %Y"],
            date_anchor: anchor(r"^\d{1,2}\s+[A-Za-z]+\s+\d{4}\b"),
            credit_codes: &["received", "incoming"],
            debit_codes: &["sent", "outgoing", "converted"],
            header_keywords: &["Description", "Incoming", "Outgoing", "Balance"],
            max_lookback: 2,
            max_lookahead: 4,
            ignore_patterns: &[
                "description",
                "total",
                "summary",
                "balance on",
                "generated on",
            ],
            min_amount: 0.01,
            max_amount: 100_000.0,
            reverse_chronological: true,
            has_running_balance: true,
            merchant_before_date: false,
            amount_pick: AmountPick::BeforeBalance,
            description_policy: DescriptionPolicy::Full,
        },
    ]
});

/// Look up a profile by issuer id (case-insensitive).
pub fn profile(id: &str) -> Option<&'static Profile> {
    PROFILES.iter().find(|p| p.id.eq_ignore_ascii_case(id.trim()))
}

/// Every registered profile.
pub fn all_profiles() -> &'static [Profile] {
    &PROFILES
}

/// Human-readable name for a statement type code, when known.
pub fn type_code_name(code: &str) -> Option<&'static str> {
    let name = match code.to_ascii_uppercase().as_str() {
        "PO" => "Payment Out",
        "PI" => "Payment In",
        "FPO" => "Faster Payment Out",
        "FPI" => "Faster Payment In",
        "MPO" => "Mobile Payment Out",
        "MPI" => "Mobile Payment In",
        "DD" => "Direct Debit",
        "SO" => "Standing Order",
        "BGC" => "Bank Giro Credit",
        "DEB" => "Debit",
        "CHQ" => "Cheque",
        "CPT" => "Card Payment",
        "TFR" => "Transfer",
        "ATM" => "ATM Withdrawal",
        "VIS" => "Visa Transaction",
        "EB" => "Electronic Banking",
        "BP" => "Bill Payment",
        "CR" => "Credit",
        "POS" => "Point of Sale",
        "FEE" => "Fee",
        "P2P" => "Peer to Peer Transfer",
        _ => return None,
    };
    Some(name)
}
