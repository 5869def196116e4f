//! Statement date parsing: per-profile format lists, year hints for
//! formats that omit the year, and rollover tracking across a statement
//! that spans a December/January boundary.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use sterling_core::Profile;

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,2})(st|nd|rd|th)\b").expect("ordinal pattern"));

// A parsed year implausibly far from the statement's own year is a
// misparse, not a transaction from another era.
const MAX_YEAR_DRIFT: i32 = 3;

/// Parse anchor text with the profile's format list.
///
/// Returns `None` when every format fails; callers drop the block rather
/// than aborting the run.
pub fn parse(date_text: &str, profile: &Profile, year_hint: Option<i32>) -> Option<NaiveDate> {
    parse_inner(date_text, profile, year_hint).map(|(date, _)| date)
}

/// Like [`parse`], additionally yielding whether the text carried its own
/// year (as opposed to borrowing the hint).
fn parse_inner(
    date_text: &str,
    profile: &Profile,
    year_hint: Option<i32>,
) -> Option<(NaiveDate, bool)> {
    let cleaned = ORDINAL_SUFFIX.replace_all(date_text.trim(), "$1");
    let cleaned = cleaned.trim();

    for fmt in profile.date_formats {
        let has_year = fmt.contains("%Y") || fmt.contains("%y");

        let parsed = if has_year {
            NaiveDate::parse_from_str(cleaned, fmt).ok()
        } else {
            let Some(hint) = year_hint else { continue };
            NaiveDate::parse_from_str(&format!("{cleaned} {hint}"), &format!("{fmt} %Y")).ok()
        };

        if let Some(date) = parsed {
            if let Some(hint) = year_hint {
                if (date.year() - hint).abs() > MAX_YEAR_DRIFT {
                    continue;
                }
            }
            return Some((date, has_year));
        }
    }

    None
}

/// Working year for statements whose rows omit it.
///
/// Reading a forward-chronological statement, a December row followed by a
/// January row means the year advanced; reading newest-first, a January
/// row followed by a December row means the rest of the page is the prior
/// year.
#[derive(Debug, Clone)]
pub struct YearTracker {
    year: i32,
    last_month: Option<u32>,
    reverse: bool,
}

impl YearTracker {
    pub fn new(year: i32, reverse: bool) -> Self {
        Self {
            year,
            last_month: None,
            reverse,
        }
    }

    pub fn current(&self) -> i32 {
        self.year
    }

    /// Feed the month of the next row in reading order; returns the year
    /// that row belongs to.
    pub fn observe(&mut self, month: u32) -> i32 {
        if let Some(last) = self.last_month {
            if !self.reverse && last == 12 && month == 1 {
                self.year += 1;
            }
            if self.reverse && last == 1 && month == 12 {
                self.year -= 1;
            }
        }
        self.last_month = Some(month);
        self.year
    }
}

/// Parse the next row's date in reading order, adjusting hint-borrowed
/// years across a statement year boundary.
pub fn parse_tracked(
    date_text: &str,
    profile: &Profile,
    tracker: &mut YearTracker,
) -> Option<NaiveDate> {
    let (date, had_year) = parse_inner(date_text, profile, Some(tracker.current()))?;
    let year = tracker.observe(date.month());
    if had_year {
        Some(date)
    } else {
        date.with_year(year)
    }
}

/// Recover the statement year from header text, for callers that cannot
/// supply a hint. Patterns in decreasing specificity.
pub fn infer_year(text: &str) -> Option<i32> {
    static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            // "01 - 28 Apr 2023"
            r"\d{1,2}\s+-\s+\d{1,2}\s+[A-Za-z]{3}\s+(\d{4})",
            // "Statement date: 28 Apr 2023"
            r"(?i)statement\s+date[:\s]+\d{1,2}\s+[A-Za-z]{3}\s+(\d{4})",
            // "2023-04-28"
            r"(\d{4})[-/]\d{2}[-/]\d{2}",
            // "28/04/2023"
            r"\d{1,2}[-/]\d{1,2}[-/](\d{4})",
            // any plausible year
            r"\b(20\d{2})\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("year pattern"))
        .collect()
    });

    PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps[1].parse().ok())
}
