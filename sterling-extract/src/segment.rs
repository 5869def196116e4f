//! Groups statement text lines (or table rows) into candidate transaction
//! blocks.
//!
//! A block opens at a date-anchor match and absorbs following lines until
//! another anchor, a terminator (footer, carried-balance marker, repeated
//! header) or the profile's lookahead bound. Blocks with no recognizable
//! amount token are discarded. A dateless line right after a completed
//! block that carries its own trailing amount opens a new block inheriting
//! the previous date: same-day postings, not continuation text.

use once_cell::sync::Lazy;
use regex::Regex;
use sterling_core::Profile;

use crate::amount;

static TRAILING_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,5}(?:,\d{3})*\.\d{2})\s*$").expect("trailing amount pattern"));
static TYPE_PHRASE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(card payment|card purchase|direct debit|transfer|bill payment|standing order|payment)")
        .expect("type phrase pattern")
});

/// Contiguous lines hypothesized to encode one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    pub lines: Vec<String>,
    /// Text matched by the date anchor, or `None` when the block inherits
    /// the previous block's date (same-day postings).
    pub date_text: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
}

impl RawBlock {
    /// The block as one whitespace-joined string.
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

/// Segment extracted statement text into candidate blocks.
pub fn segment(lines: &[&str], profile: &Profile) -> Vec<RawBlock> {
    let start = header_line(lines, profile)
        .map(|i| i + 1)
        .or_else(|| first_anchor(lines, profile))
        .unwrap_or(lines.len());

    let mut blocks: Vec<RawBlock> = Vec::new();
    let mut open: Option<RawBlock> = None;
    // One past the last line consumed into a block; lines between here and
    // the next anchor stay available for backward merchant lookup.
    let mut consumed_to = start;

    for i in start..lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            continue;
        }

        // Terminators close the open block without joining it.
        if profile.should_ignore(line) || profile.is_header_line(line) {
            close(&mut blocks, &mut open, &mut consumed_to, profile);
            consumed_to = consumed_to.max(i + 1);
            continue;
        }

        if let Some(anchor) = profile.anchor_match(line) {
            close(&mut blocks, &mut open, &mut consumed_to, profile);
            let mut block = RawBlock {
                lines: vec![line.to_string()],
                date_text: Some(anchor.to_string()),
                start_line: i,
                end_line: i,
            };
            if profile.merchant_before_date {
                attach_lookback(&mut block, lines, i, consumed_to, profile);
            }
            open = Some(block);
            continue;
        }

        let (block_complete, block_start) = match open.as_ref() {
            Some(block) => (
                !amount::extract_amounts(&block.text(), profile).is_empty(),
                block.start_line,
            ),
            None => continue,
        };

        if block_complete && starts_same_day_posting(line, profile) {
            close(&mut blocks, &mut open, &mut consumed_to, profile);
            open = Some(RawBlock {
                lines: vec![line.to_string()],
                date_text: None,
                start_line: i,
                end_line: i,
            });
        } else if profile.merchant_before_date && block_complete {
            // Everything after the amount belongs to the next transaction's
            // merchant header; leave it unconsumed for lookback.
            close(&mut blocks, &mut open, &mut consumed_to, profile);
        } else if i - block_start >= profile.max_lookahead {
            close(&mut blocks, &mut open, &mut consumed_to, profile);
        } else if let Some(block) = open.as_mut() {
            block.lines.push(line.to_string());
            block.end_line = i;
        }
    }

    close(&mut blocks, &mut open, &mut consumed_to, profile);
    blocks
}

/// Segment pre-extracted table rows: one block per row, the first
/// anchor-matching cell supplying the date. Rows without one inherit the
/// running date the same way dateless text lines do.
pub fn segment_rows(rows: &[Vec<String>], profile: &Profile) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    let mut have_date_context = false;

    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<&str> = row
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if cells.is_empty() {
            continue;
        }

        let joined = cells.join(" ");
        if profile.is_header_line(&joined) || profile.should_ignore(&joined) {
            continue;
        }

        let date_text = cells
            .iter()
            .find_map(|c| profile.anchor_match(c))
            .map(str::to_string);
        if date_text.is_none() && !have_date_context {
            continue;
        }
        if amount::extract_amounts(&joined, profile).is_empty() {
            continue;
        }

        have_date_context = have_date_context || date_text.is_some();
        blocks.push(RawBlock {
            lines: cells.iter().map(|c| c.to_string()).collect(),
            date_text,
            start_line: i,
            end_line: i,
        });
    }

    blocks
}

/// Index of the table header line, when the page has one.
pub fn header_line(lines: &[&str], profile: &Profile) -> Option<usize> {
    lines.iter().position(|l| profile.is_header_line(l))
}

fn first_anchor(lines: &[&str], profile: &Profile) -> Option<usize> {
    lines.iter().position(|l| {
        let t = l.trim();
        profile.anchor_match(t).is_some() && !profile.should_ignore(t)
    })
}

/// Push the open block if it earned survival (at least one amount token).
fn close(
    blocks: &mut Vec<RawBlock>,
    open: &mut Option<RawBlock>,
    consumed_to: &mut usize,
    profile: &Profile,
) {
    if let Some(block) = open.take() {
        *consumed_to = (*consumed_to).max(block.end_line + 1);
        if !amount::extract_amounts(&block.text(), profile).is_empty() {
            blocks.push(block);
        }
    }
}

/// Prepend the merchant line(s) printed above the anchor, for layouts
/// that name the counterparty before the date. Stops at anchors, headers
/// and terminators; skips fragments and bare numbers; never reaches past
/// `consumed_to` into an earlier block.
fn attach_lookback(
    block: &mut RawBlock,
    lines: &[&str],
    anchor_idx: usize,
    consumed_to: usize,
    profile: &Profile,
) {
    let floor = consumed_to.max(anchor_idx.saturating_sub(profile.max_lookback));
    let mut collected = Vec::new();

    for j in (floor..anchor_idx).rev() {
        let prev = lines[j].trim();
        if prev.is_empty() {
            continue;
        }
        if profile.anchor_match(prev).is_some()
            || profile.is_header_line(prev)
            || profile.should_ignore(prev)
        {
            break;
        }
        if prev.len() < 3 || prev.chars().all(|c| c.is_ascii_digit() || ".,- ".contains(c)) {
            continue;
        }
        collected.push(prev.to_string());
    }

    collected.reverse();
    for (k, line) in collected.into_iter().enumerate() {
        block.lines.insert(k, line);
    }
}

/// A dateless line that is itself a transaction: trailing in-range amount
/// plus a type-code or merchant-looking start.
fn starts_same_day_posting(line: &str, profile: &Profile) -> bool {
    let Some(caps) = TRAILING_AMOUNT.captures(line) else {
        return false;
    };
    let value = amount::parse_amount(&caps[1]);
    if value < profile.min_amount || value > profile.max_amount {
        return false;
    }

    let desc = line[..caps.get(1).map(|m| m.start()).unwrap_or(0)].trim();
    if desc.len() < 3 {
        return false;
    }
    let lower = desc.to_lowercase();
    if lower.starts_with("ref:") || lower.starts_with("on ") {
        return false;
    }

    TYPE_PHRASE_START.is_match(desc)
        || profile.is_credit_code(desc)
        || profile.is_debit_code(desc)
        || desc.starts_with(|c: char| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sterling_core::profile;

    fn barclays() -> &'static Profile {
        profile("barclays").unwrap()
    }

    #[test]
    fn test_two_anchors_two_blocks() {
        let lines = vec![
            "Date Description Money out Money in Balance",
            "01 Apr Card Payment to Tesco Stores",
            "Ref: 3512XY",
            "12.40",
            "02 Apr Fee 5.00 1023.40",
        ];
        let blocks = segment(&lines, barclays());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines.len(), 3);
        assert!(!blocks[0].text().contains("Fee"));
        assert!(!blocks[1].text().contains("Tesco"));
        assert_eq!(blocks[1].date_text.as_deref(), Some("02 Apr"));
    }

    #[test]
    fn test_segmentation_starts_after_header() {
        let lines = vec![
            "Barclays Bank UK PLC",
            "Statement 01 - 28 Apr 2023",
            "Date Description Money out Money in Balance",
            "03 Apr Direct Debit to Acme Ltd 42.00",
        ];
        let blocks = segment(&lines, barclays());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 3);
    }

    #[test]
    fn test_terminator_closes_without_consuming() {
        let lines = vec![
            "Date Description Money out Money in Balance",
            "03 Apr Card Payment to Boots 8.99",
            "Balance carried forward: continued overleaf",
            "trailing footer text",
        ];
        let blocks = segment(&lines, barclays());
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].text().contains("continued"));
        assert!(!blocks[0].text().contains("footer"));
    }

    #[test]
    fn test_repeated_header_terminates_block() {
        let lines = vec![
            "Date Description Money out Money in Balance",
            "03 Apr Card Payment to Boots 8.99",
            "Date Description Money out Money in Balance",
            "04 Apr Card Payment to Pret 4.20",
        ];
        let blocks = segment(&lines, barclays());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines.len(), 1);
    }

    #[test]
    fn test_blocks_without_amounts_are_discarded() {
        let lines = vec![
            "Date Description Money out Money in Balance",
            "03 Apr Interest rate change notice",
            "04 Apr Card Payment to Pret 4.20",
        ];
        let blocks = segment(&lines, barclays());
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text().contains("Pret"));
    }

    #[test]
    fn test_lookahead_bound_force_closes() {
        let revolut = profile("revolut").unwrap();
        let lines = vec![
            "Date Description Money out Money in Balance",
            "05 Apr 2023 Card payment",
            "wrapped description text",
            "more wrapped text",
            "yet more text",
            "4.50",
        ];
        // The amount sits past the lookahead bound, so the block is
        // force-closed before reaching it and then discarded for having
        // no amount token.
        let blocks = segment(&lines, revolut);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_dateless_posting_inherits_same_day() {
        let lines = vec![
            "Date Description Money out Money in Balance",
            "03 Apr Card Payment to Tesco 12.40",
            "Card Payment to Amazon 8.99",
        ];
        let blocks = segment(&lines, barclays());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].date_text.as_deref(), Some("03 Apr"));
        assert_eq!(blocks[1].date_text, None);
        assert!(blocks[1].text().contains("Amazon"));
    }

    #[test]
    fn test_ref_line_is_not_a_posting() {
        let lines = vec![
            "Date Description Money out Money in Balance",
            "03 Apr Card Payment to Tesco 12.40",
            "Ref: 100012.99",
        ];
        let blocks = segment(&lines, barclays());
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_merchant_lookback_attaches_previous_line() {
        let monzo = profile("monzo").unwrap();
        let lines = vec![
            "Date Description Amount Balance",
            "TESCO STORES",
            "28/02/2023 Card payment 4.50 1,295.50",
            "ACME LTD",
            "27/02/2023 Payment from Acme Ltd 1,200.00 1,300.00",
        ];
        let blocks = segment(&lines, monzo);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].text().contains("TESCO STORES"));
        assert!(blocks[1].text().contains("ACME LTD"));
        // The merchant header never bleeds into the neighbouring block.
        assert!(!blocks[0].text().contains("ACME"));
    }

    #[test]
    fn test_row_segmentation() {
        let natwest = profile("natwest").unwrap();
        let rows = vec![
            vec![
                "Date".to_string(),
                "Description".to_string(),
                "Paid out".to_string(),
                "Balance".to_string(),
            ],
            vec![
                "01 Apr 2023".to_string(),
                "Direct Debit British Gas".to_string(),
                "85.00".to_string(),
                "915.00".to_string(),
            ],
            vec![
                "".to_string(),
                "Card Payment Boots".to_string(),
                "8.99".to_string(),
                "906.01".to_string(),
            ],
        ];
        let blocks = segment_rows(&rows, natwest);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].date_text.as_deref(), Some("01 Apr 2023"));
        assert_eq!(blocks[1].date_text, None);
    }

    #[test]
    fn test_rows_without_date_context_are_skipped() {
        let natwest = profile("natwest").unwrap();
        let rows = vec![vec!["Card Payment Boots".to_string(), "8.99".to_string()]];
        assert!(segment_rows(&rows, natwest).is_empty());
    }
}
