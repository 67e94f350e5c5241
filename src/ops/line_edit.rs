//! Line-local task transitions: text in, text out.
//!
//! Every operation takes one checklist line and returns the rewritten
//! line. Input that is not checklist syntax comes back unchanged, so
//! callers can apply an edit to any line index without checking first.
//! Nothing here touches files; the caller owns the read-modify-write.

use chrono::NaiveDate;

use crate::model::column::Column;
use crate::model::task::Status;
use crate::parse::metadata::{self, DateKind};
use crate::parse::task_parser::parse_checklist_line;
use crate::util::date::{format_date, parse_date};

fn rebuild(indent: &str, status: Status, text: &str) -> String {
    format!("{}- [{}] {}", indent, status.marker(), text)
}

/// Insert `tag` into the line. No-op if the tag is already present.
///
/// The tag goes immediately before the earliest metadata or priority
/// glyph, so it stays in description territory; with no glyph on the
/// line it is appended at the end. Only the insertion boundary is
/// re-spaced, the rest of the line is untouched.
pub fn add_tag(line: &str, tag: &str) -> String {
    let Some(parsed) = parse_checklist_line(line) else {
        return line.to_string();
    };
    if metadata::line_tags(parsed.text).iter().any(|t| t == tag) {
        return line.to_string();
    }

    let text = match metadata::first_marker_offset(parsed.text) {
        Some(offset) => {
            let head = parsed.text[..offset].trim_end();
            let tail = &parsed.text[offset..];
            if head.is_empty() {
                format!("{} {}", tag, tail)
            } else {
                format!("{} {} {}", head, tag, tail)
            }
        }
        None => {
            let head = parsed.text.trim_end();
            if head.is_empty() {
                tag.to_string()
            } else {
                format!("{} {}", head, tag)
            }
        }
    };
    rebuild(parsed.indent, parsed.status, &text)
}

/// Remove every whitespace-delimited token equal to `tag`.
///
/// Removal rebuilds the text from its tokens, which collapses any run
/// of whitespace on the line to single spaces. A line without the tag
/// comes back byte-identical.
pub fn remove_tag(line: &str, tag: &str) -> String {
    let Some(parsed) = parse_checklist_line(line) else {
        return line.to_string();
    };
    let tokens: Vec<&str> = parsed.text.split_whitespace().collect();
    if !tokens.iter().any(|t| *t == tag) {
        return line.to_string();
    }
    let body = tokens
        .into_iter()
        .filter(|t| *t != tag)
        .collect::<Vec<_>>()
        .join(" ");
    rebuild(parsed.indent, parsed.status, &body)
}

/// Mark the line done: checkbox to `x`, every supplied column tag
/// stripped, and a `✅ <today>` token appended unless a recognized done
/// date is already present. A bare `✅` with no date after it is text,
/// not a done marker, and does not block the stamp. Whitespace
/// collapses to single spaces.
pub fn complete(line: &str, column_tags: &[String], today: NaiveDate) -> String {
    let Some(parsed) = parse_checklist_line(line) else {
        return line.to_string();
    };
    let mut body = parsed
        .text
        .split_whitespace()
        .filter(|tok| !column_tags.iter().any(|t| t == tok))
        .collect::<Vec<_>>()
        .join(" ");
    if metadata::extract(&body).done.is_none() {
        if !body.is_empty() {
            body.push(' ');
        }
        body.push(DateKind::Done.glyph());
        body.push(' ');
        body.push_str(&format_date(today));
    }
    rebuild(parsed.indent, Status::Done, &body)
}

/// Reopen the line: checkbox to space and the `✅ <date>` pair removed.
/// A `✅` that is not followed by a valid date is not a done marker and
/// stays put. Whitespace collapses to single spaces.
pub fn uncomplete(line: &str) -> String {
    let Some(parsed) = parse_checklist_line(line) else {
        return line.to_string();
    };
    let done_glyph = DateKind::Done.glyph().to_string();
    let mut kept: Vec<&str> = Vec::new();
    let mut tokens = parsed.text.split_whitespace().peekable();
    while let Some(tok) = tokens.next() {
        if tok == done_glyph
            && let Some(next) = tokens.peek()
            && parse_date(next).is_some()
        {
            tokens.next();
            continue;
        }
        kept.push(tok);
    }
    rebuild(parsed.indent, Status::Incomplete, &kept.join(" "))
}

/// The composite transition behind a column move.
///
/// A done target completes the line (stripping every configured column
/// tag). Any other target reopens the line first when its checkbox is
/// `x` (a cancelled checkbox stays cancelled), strips every configured
/// column tag, and then adds the target's tag when the target is a tag
/// column.
pub fn move_to_column(
    line: &str,
    target: &Column,
    column_tags: &[String],
    today: NaiveDate,
) -> String {
    let Some(parsed) = parse_checklist_line(line) else {
        return line.to_string();
    };
    if target.is_done() {
        return complete(line, column_tags, today);
    }

    let mut out = if parsed.status == Status::Done {
        uncomplete(line)
    } else {
        line.to_string()
    };
    for tag in column_tags {
        out = remove_tag(&out, tag);
    }
    if let Some(tag) = target.tag() {
        out = add_tag(&out, tag);
    }
    out
}
