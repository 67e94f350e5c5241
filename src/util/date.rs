use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// The one date format tasks use: `2026-02-13`. No other shapes parse.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Parse a `YYYY-MM-DD` token. Requires exactly 4-2-2 digit groups;
/// chrono alone would accept unpadded fields like `2026-2-3`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if !DATE_RE.is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Format a date back to the canonical `YYYY-MM-DD` form.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Today in local time.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Urgency bucket of a due date relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DueGroup {
    Overdue,
    Today,
    Other,
}

impl DueGroup {
    pub fn rank(self) -> u8 {
        match self {
            DueGroup::Overdue => 0,
            DueGroup::Today => 1,
            DueGroup::Other => 2,
        }
    }
}

/// Classify an optional due date. Undated tasks land in `Other` with
/// the future-dated ones.
pub fn due_group(due: Option<NaiveDate>, today: NaiveDate) -> DueGroup {
    match due {
        Some(d) if d < today => DueGroup::Overdue,
        Some(d) if d == today => DueGroup::Today,
        _ => DueGroup::Other,
    }
}
