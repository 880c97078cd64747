//! Time block parsing and readable formatting.
//!
//! A time block is `<day-code> <start>-<end>` with clock times written as three
//! or four digits and no separator: `"MA 945-1115"` is Tuesday 09:45 to 11:15.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static TIME_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{2})\s+(\d{3,4})-(\d{3,4})").expect("Invalid regex: time block")
});

/// Teaching days. Ordering follows the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "LU")]
    Monday,
    #[serde(rename = "MA")]
    Tuesday,
    #[serde(rename = "MI")]
    Wednesday,
    #[serde(rename = "JU")]
    Thursday,
    #[serde(rename = "VI")]
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LU" => Some(Weekday::Monday),
            "MA" => Some(Weekday::Tuesday),
            "MI" => Some(Weekday::Wednesday),
            "JU" => Some(Weekday::Thursday),
            "VI" => Some(Weekday::Friday),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Weekday::Monday => "LU",
            Weekday::Tuesday => "MA",
            Weekday::Wednesday => "MI",
            Weekday::Thursday => "JU",
            Weekday::Friday => "VI",
        }
    }

    /// Full Spanish name
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Lunes",
            Weekday::Tuesday => "Martes",
            Weekday::Wednesday => "Miércoles",
            Weekday::Thursday => "Jueves",
            Weekday::Friday => "Viernes",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A parsed block; times are minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub day: Weekday,
    pub start: u16,
    pub end: u16,
}

impl TimeBlock {
    /// Half-open interval overlap on the same day
    pub fn overlaps(&self, other: &TimeBlock) -> bool {
        self.day == other.day && self.start < other.end && self.end > other.start
    }
}

/// "945" → 585, "1115" → 675. The last two digits are always the minutes.
fn clock_minutes(digits: &str) -> Option<u16> {
    let (hours, minutes) = digits.split_at(digits.len() - 2);
    Some(hours.parse::<u16>().ok()? * 60 + minutes.parse::<u16>().ok()?)
}

/// Parse a raw block. `None` is the "no day" sentinel: unknown day codes and
/// malformed strings contribute no constraint.
pub fn parse_time_block(raw: &str) -> Option<TimeBlock> {
    let caps = TIME_BLOCK.captures(raw)?;
    let day = Weekday::from_code(&caps[1])?;
    Some(TimeBlock {
        day,
        start: clock_minutes(&caps[2])?,
        end: clock_minutes(&caps[3])?,
    })
}

fn readable_day(code: &str) -> &str {
    match code {
        "LU" => "Lun",
        "MA" => "Mar",
        "MI" => "Mié",
        "JU" => "Jue",
        "VI" => "Vie",
        "SA" => "Sáb",
        "DO" => "Dom",
        other => other,
    }
}

fn readable_clock(digits: &str) -> String {
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return digits.to_string();
    }
    match digits.len() {
        3 => format!("0{}:{}", &digits[..1], &digits[1..]),
        4 => format!("{}:{}", &digits[..2], &digits[2..]),
        _ => digits.to_string(),
    }
}

/// Display form: `"LU 645-815"` → `"Lun 06:45-08:15"`. Anything that does not
/// look like `<day> <start>-<end>` is returned unchanged.
pub fn format_readable(raw: &str) -> String {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    let [day, range] = parts.as_slice() else {
        return raw.to_string();
    };
    match range.split_once('-') {
        Some((start, end)) => format!(
            "{} {}-{}",
            readable_day(day),
            readable_clock(start),
            readable_clock(end)
        ),
        None => raw.to_string(),
    }
}
