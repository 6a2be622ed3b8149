use std::fmt;

use allocative::Allocative;

use crate::error::ValueError;

/// A time of day with second precision.
///
/// Ordering is lexicographic on (hour, minute, second), which is what the
/// comparison operators and the sort engine rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Allocative)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// The scheduling state of a process entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Allocative)]
pub enum Status {
    Running,
    Ready,
    Paused,
    Blocked,
    Dying,
    Sleeping,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Running,
        Status::Ready,
        Status::Paused,
        Status::Blocked,
        Status::Dying,
        Status::Sleeping,
    ];

    /// The lowercase name used in the text protocol.
    pub fn name(&self) -> &'static str {
        match self {
            Status::Running => "running",
            Status::Ready => "ready",
            Status::Paused => "paused",
            Status::Blocked => "blocked",
            Status::Dying => "dying",
            Status::Sleeping => "sleeping",
        }
    }

    /// Looks up a status by its exact lowercase name.
    pub fn from_name(name: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// A single typed value carried by one of the record fields.
///
/// `Decimal` holds signed hundredths: `12.50` is stored as `1250`, and the
/// representable range is ±999.99.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A 32-bit signed integer (`pid`, `priority`).
    Int(i32),
    /// An owned UTF-8 string (`name`).
    Text(String),
    /// A time of day (`kern_tm`, `file_tm`).
    Time(Time),
    /// A fixed-point decimal in hundredths (`cpu_usage`).
    Decimal(i32),
    /// A process status (`status`).
    Status(Status),
}

/// Parses an integer literal: optional `-`, then one or more decimal digits,
/// nothing else. The result must fit an `i32`.
pub fn parse_int(raw: &str) -> Result<i32, ValueError> {
    let raw = raw.trim();
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValueError::BadInt);
    }
    raw.parse::<i32>().map_err(|_| ValueError::IntOutOfRange)
}

/// Parses a string literal delimited by double quotes.
///
/// `\"` unescapes to `"` and `\\` to `\`. A backslash followed by any other
/// character is preserved together with that character. A missing closing
/// quote, or any text after it, is a failure.
///
/// ```
/// # use procdb::value::parse_text;
/// assert_eq!(parse_text(r#""a\"b""#).unwrap(), "a\"b");
/// assert_eq!(parse_text(r#""a\qb""#).unwrap(), r"a\qb");
/// ```
pub fn parse_text(raw: &str) -> Result<String, ValueError> {
    let mut chars = raw.trim().chars();
    if chars.next() != Some('"') {
        return Err(ValueError::BadString);
    }

    let mut text = String::new();
    loop {
        match chars.next() {
            None => return Err(ValueError::BadString),
            Some('"') => break,
            Some('\\') => match chars.next() {
                None => return Err(ValueError::BadString),
                Some('"') => text.push('"'),
                Some('\\') => text.push('\\'),
                Some(other) => {
                    text.push('\\');
                    text.push(other);
                }
            },
            Some(c) => text.push(c),
        }
    }

    if chars.next().is_some() {
        return Err(ValueError::BadString);
    }
    Ok(text)
}

/// Parses a time literal `'H:M:S'` via numeric scan.
///
/// Each component is one or more digits, so `'1:2:3'` is accepted, and is
/// range-checked (0-23 / 0-59 / 0-59). The closing quote is required.
pub fn parse_time(raw: &str) -> Result<Time, ValueError> {
    let mut chars = raw.trim().chars().peekable();
    if chars.next() != Some('\'') {
        return Err(ValueError::BadTime);
    }

    fn scan_number(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<u32> {
        let mut digits = 0u32;
        let mut n = 0u32;
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            chars.next();
            n = n.saturating_mul(10).saturating_add(d);
            digits += 1;
        }
        if digits == 0 { None } else { Some(n) }
    }

    let hour = scan_number(&mut chars).ok_or(ValueError::BadTime)?;
    if chars.next() != Some(':') {
        return Err(ValueError::BadTime);
    }
    let minute = scan_number(&mut chars).ok_or(ValueError::BadTime)?;
    if chars.next() != Some(':') {
        return Err(ValueError::BadTime);
    }
    let second = scan_number(&mut chars).ok_or(ValueError::BadTime)?;
    if chars.next() != Some('\'') || chars.next().is_some() {
        return Err(ValueError::BadTime);
    }

    if hour > 23 || minute > 59 || second > 59 {
        return Err(ValueError::TimeOutOfRange);
    }
    Ok(Time {
        hour: hour as u8,
        minute: minute as u8,
        second: second as u8,
    })
}

/// Parses a fixed-point decimal with at most 3 integer digits and at most
/// 2 fraction digits, returning signed hundredths.
///
/// One fraction digit scales by ten (`5.1` is 510 hundredths), zero fraction
/// digits after the dot mean a fraction of zero (`1.` is 100 hundredths).
///
/// ```
/// # use procdb::value::parse_decimal;
/// assert_eq!(parse_decimal("5").unwrap(), 500);
/// assert_eq!(parse_decimal("-0.07").unwrap(), -7);
/// ```
pub fn parse_decimal(raw: &str) -> Result<i32, ValueError> {
    let raw = raw.trim();
    let mut chars = raw.chars().peekable();

    let negative = chars.peek() == Some(&'-');
    if negative {
        chars.next();
    }

    let mut int_digits = 0u32;
    let mut int_part = 0i32;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        int_part = int_part * 10 + d as i32;
        int_digits += 1;
        if int_digits > 3 {
            return Err(ValueError::BadDecimal);
        }
    }
    if int_digits == 0 {
        return Err(ValueError::BadDecimal);
    }

    let mut fraction = 0i32;
    if chars.peek() == Some(&'.') {
        chars.next();
        let mut frac_digits = 0u32;
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            chars.next();
            fraction = fraction * 10 + d as i32;
            frac_digits += 1;
            if frac_digits > 2 {
                return Err(ValueError::BadDecimal);
            }
        }
        // a single fraction digit means tenths
        if frac_digits == 1 {
            fraction *= 10;
        }
    }

    if chars.next().is_some() {
        return Err(ValueError::BadDecimal);
    }

    let hundredths = int_part * 100 + fraction;
    Ok(if negative { -hundredths } else { hundredths })
}

/// Parses a status literal `'name'` against the 6 known lowercase names.
pub fn parse_status(raw: &str) -> Result<Status, ValueError> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .ok_or(ValueError::BadStatus)?;
    if inner.contains('\'') {
        return Err(ValueError::BadStatus);
    }
    Status::from_name(inner).ok_or(ValueError::BadStatus)
}

/// Parses a value-list `['a','b',…]` of single-quoted tokens, as used by the
/// `in`/`not_in` operators.
///
/// Returns `None` when the list is malformed; the evaluator turns both `None`
/// and an empty list into "matches nothing" rather than a command rejection.
pub fn parse_quoted_list(raw: &str) -> Option<Vec<String>> {
    let mut chars = raw.trim().chars().peekable();
    if chars.next() != Some('[') {
        return None;
    }

    fn skip_spaces(chars: &mut std::iter::Peekable<std::str::Chars>) {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
    }

    let mut items = Vec::new();
    skip_spaces(&mut chars);
    if chars.peek() == Some(&']') {
        chars.next();
    } else {
        loop {
            skip_spaces(&mut chars);
            if chars.next() != Some('\'') {
                return None;
            }
            let mut item = String::new();
            loop {
                match chars.next() {
                    None => return None,
                    Some('\'') => break,
                    Some(c) => item.push(c),
                }
            }
            items.push(item);
            skip_spaces(&mut chars);
            match chars.next() {
                Some(',') => {}
                Some(']') => break,
                _ => return None,
            }
        }
    }

    if chars.next().is_some() {
        return None;
    }
    Some(items)
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{:02}:{:02}:{:02}'", self.hour, self.minute, self.second)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.name())
    }
}

/// Renders a value back to its exact text form: integers without leading
/// zeros, strings with `"` and `\` re-escaped, times zero-padded, decimals
/// with exactly two fraction digits, statuses single-quoted.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(s) => {
                use fmt::Write;
                f.write_char('"')?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_char('"')
            }
            Value::Time(t) => write!(f, "{t}"),
            Value::Decimal(v) => {
                let abs = v.unsigned_abs();
                let sign = if *v < 0 { "-" } else { "" };
                write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
            }
            Value::Status(s) => write!(f, "{s}"),
        }
    }
}
