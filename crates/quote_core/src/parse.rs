use thiserror::Error;

use crate::NewItem;

/// Text offered to users as a starting point for their own lists.
pub const INPUT_TEMPLATE: &str = "\
# StealthQuote CSV Template
# Format: URL <space> Quantity
https://example.com/product1 2
https://example.com/product2 1
https://example.com/product3 5
";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Invalid URL: expected http:// or https:// address")]
    InvalidUrl,
    #[error("Invalid quantity `{0}`: expected a positive integer")]
    InvalidQuantity(String),
}

/// One line of user input, valid or not. Invalid rows are still shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub url: String,
    pub quantity: u32,
    pub error: Option<RowError>,
}

impl ParsedInput {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseSummary {
    pub valid: usize,
    pub invalid: usize,
}

/// Parses freeform text into one record per non-blank line.
pub fn parse_input(text: &str) -> Vec<ParsedInput> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> ParsedInput {
    let mut tokens = line.split_whitespace();
    let url = tokens.next().unwrap_or_default().to_string();

    // URL problems are reported first; the quantity is still parsed for display.
    let (quantity, quantity_error) = match tokens.next() {
        None => (1, None),
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n > 0 => (n, None),
            _ => (0, Some(RowError::InvalidQuantity(raw.to_string()))),
        },
    };

    let error = if !is_http_url(&url) {
        Some(RowError::InvalidUrl)
    } else {
        quantity_error
    };

    ParsedInput {
        url,
        quantity,
        error,
    }
}

/// Matches `^https?://.+`, scheme case-insensitive.
pub fn is_http_url(candidate: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        candidate.len() > scheme.len()
            && candidate
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

pub fn summarize(rows: &[ParsedInput]) -> ParseSummary {
    let valid = rows.iter().filter(|row| row.is_valid()).count();
    ParseSummary {
        valid,
        invalid: rows.len() - valid,
    }
}

/// Rows eligible for job creation, in input order.
pub fn submittable_items(rows: &[ParsedInput]) -> Vec<NewItem> {
    rows.iter()
        .filter(|row| row.is_valid())
        .map(|row| NewItem {
            url: row.url.clone(),
            quantity: row.quantity,
        })
        .collect()
}
