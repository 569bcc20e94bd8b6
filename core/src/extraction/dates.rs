//! DA / TM / DT value parsing
//!
//! Values that do not follow the standard layout parse to `None`; callers keep
//! the raw text in that case.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Parses a DA value (`YYYYMMDD`, or the legacy `YYYY.MM.DD`)
pub fn parse_da(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let digits: String = s.chars().filter(|c| *c != '.' && *c != '-').collect();
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(&digits, "%Y%m%d").ok()
}

/// Parses a TM value (`HH[MM[SS[.FFFFFF]]]`, colons tolerated)
pub fn parse_tm(s: &str) -> Option<NaiveTime> {
    let s: String = s.trim().chars().filter(|c| *c != ':').collect();
    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (s.as_str(), None),
    };
    if whole.is_empty() || whole.len() % 2 != 0 || whole.len() > 6 {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let field = |i: usize| -> Option<u32> {
        whole
            .get(i * 2..i * 2 + 2)
            .map(|part| part.parse().ok())
            .unwrap_or(Some(0))
    };
    let hour = field(0)?;
    let minute = field(1)?;
    let second = field(2)?;

    let micros = match fraction {
        Some(f) if !f.is_empty() => {
            if f.len() > 6 || !f.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let padded = format!("{:0<6}", f);
            padded.parse::<u32>().ok()?
        }
        _ => 0,
    };

    NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
}

/// Parses a DT value (`YYYYMMDDHHMMSS[.FFFFFF][&ZZXX]`), ignoring the UTC offset
pub fn parse_dt(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    let s = match s.find(['+', '-']) {
        Some(idx) if idx >= 8 => &s[..idx],
        _ => s,
    };
    if s.len() < 8 {
        return None;
    }
    let date = parse_da(s.get(..8)?)?;
    let rest = &s[8..];
    let time = if rest.is_empty() {
        NaiveTime::MIN
    } else {
        parse_tm(rest)?
    };
    Some(NaiveDateTime::new(date, time))
}
