use std::ops::Range;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::task::Priority;
use crate::util::date::parse_date;

/// Inline date markers: glyph, one space, `YYYY-MM-DD` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    Due,
    Done,
    Created,
    Scheduled,
    Start,
    Cancelled,
}

impl DateKind {
    pub const ALL: [DateKind; 6] = [
        DateKind::Due,
        DateKind::Done,
        DateKind::Created,
        DateKind::Scheduled,
        DateKind::Start,
        DateKind::Cancelled,
    ];

    pub fn glyph(self) -> char {
        match self {
            DateKind::Due => '📅',
            DateKind::Done => '✅',
            DateKind::Created => '➕',
            DateKind::Scheduled => '⏳',
            DateKind::Start => '🛫',
            DateKind::Cancelled => '❌',
        }
    }

    fn from_glyph(c: char) -> Option<DateKind> {
        DateKind::ALL.into_iter().find(|k| k.glyph() == c)
    }
}

pub const RECURRENCE_GLYPH: char = '🔁';

/// Priority glyphs in precedence order. Membership is tested in this
/// order, so a line carrying two glyphs resolves to the earlier table
/// entry no matter where the glyphs sit in the text.
pub const PRIORITY_TABLE: [(char, Priority); 4] = [
    ('🔺', Priority::Highest),
    ('⏫', Priority::High),
    ('🔼', Priority::Medium),
    ('🔽', Priority::Low),
];

/// Tag token: `#` or `@`, then word characters or hyphens, at a
/// whitespace boundary.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\s)([#@][\w-]+)").unwrap());

/// Everything extracted from one task line's text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMetadata {
    pub due: Option<NaiveDate>,
    pub done: Option<NaiveDate>,
    pub created: Option<NaiveDate>,
    pub scheduled: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub cancelled: Option<NaiveDate>,
    pub recurrence: Option<String>,
    pub priority: Option<Priority>,
}

impl LineMetadata {
    fn set_date(&mut self, kind: DateKind, date: NaiveDate) {
        let slot = match kind {
            DateKind::Due => &mut self.due,
            DateKind::Done => &mut self.done,
            DateKind::Created => &mut self.created,
            DateKind::Scheduled => &mut self.scheduled,
            DateKind::Start => &mut self.start,
            DateKind::Cancelled => &mut self.cancelled,
        };
        // First occurrence wins
        if slot.is_none() {
            *slot = Some(date);
        }
    }
}

fn is_marker_glyph(c: char) -> bool {
    DateKind::from_glyph(c).is_some()
        || c == RECURRENCE_GLYPH
        || PRIORITY_TABLE.iter().any(|(g, _)| *g == c)
}

enum SpanValue {
    Date(DateKind, NaiveDate),
    Recurrence(String),
    Priority,
}

/// Find every recognized marker token in the text, in byte order.
/// A date marker without a valid `glyph + space + date` shape is not
/// recognized and produces no span, so the cleaner leaves it alone.
fn scan_spans(text: &str) -> Vec<(Range<usize>, SpanValue)> {
    let mut spans = Vec::new();
    for (i, c) in text.char_indices() {
        if let Some(kind) = DateKind::from_glyph(c) {
            let after = i + c.len_utf8();
            if let Some(rest) = text[after..].strip_prefix(' ') {
                let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                if let Some(date) = parse_date(&rest[..token_end]) {
                    spans.push((i..after + 1 + token_end, SpanValue::Date(kind, date)));
                }
            }
        } else if c == RECURRENCE_GLYPH {
            let after = i + c.len_utf8();
            // The rule text runs until the next marker or end of line
            let value_end = text[after..]
                .char_indices()
                .find(|(_, ch)| is_marker_glyph(*ch))
                .map_or(text.len(), |(j, _)| after + j);
            let value = text[after..value_end].trim();
            if !value.is_empty() {
                spans.push((i..value_end, SpanValue::Recurrence(value.to_string())));
            }
        } else if PRIORITY_TABLE.iter().any(|(g, _)| *g == c) {
            spans.push((i..i + c.len_utf8(), SpanValue::Priority));
        }
    }
    spans
}

/// Extract all inline metadata from a task line's text (the part after
/// the checkbox).
pub fn extract(text: &str) -> LineMetadata {
    let mut meta = LineMetadata::default();
    for (_, value) in scan_spans(text) {
        match value {
            SpanValue::Date(kind, date) => meta.set_date(kind, date),
            SpanValue::Recurrence(rule) => {
                if meta.recurrence.is_none() {
                    meta.recurrence = Some(rule);
                }
            }
            SpanValue::Priority => {}
        }
    }
    meta.priority = PRIORITY_TABLE
        .iter()
        .find(|(g, _)| text.contains(*g))
        .map(|(_, p)| *p);
    meta
}

/// Byte offset of the earliest marker glyph in the text, recognized or
/// not. Tag inserts go before this point.
pub fn first_marker_offset(text: &str) -> Option<usize> {
    text.char_indices()
        .find(|(_, c)| is_marker_glyph(*c))
        .map(|(i, _)| i)
}

/// All tag tokens in the text, in text order, marker prefix included.
pub fn line_tags(text: &str) -> Vec<String> {
    TAG_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// The display form of a task line's text: recognized metadata tokens,
/// priority glyphs, the filter tag, column tags, and `@` context tags
/// removed; whitespace collapsed.
pub fn clean_description(text: &str, filter_tag: &str, column_tags: &[String]) -> String {
    let stripped = remove_spans(text, &scan_spans(text));
    let without_tags = TAG_RE.replace_all(&stripped, |caps: &regex::Captures| {
        let tag = &caps[1];
        if tag == filter_tag || tag.starts_with('@') || column_tags.iter().any(|t| t == tag) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn remove_spans(text: &str, spans: &[(Range<usize>, SpanValue)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for (range, _) in spans {
        out.push_str(&text[pos..range.start]);
        pos = range.end;
    }
    out.push_str(&text[pos..]);
    out
}
