//! Physical quantities stored as fixed-point integers.
//!
//! Lengths are kept in nanometres and angles in micro-degrees, so that values
//! survive a serialize/deserialize cycle without any floating point drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} value: \"{value}\"")]
pub struct ParseUnitError {
    pub kind: &'static str,
    pub value: String,
}

const FRACTION_DIGITS: u32 = 6;
const SCALE: i64 = 1_000_000;

/// Parse a decimal string with at most six fraction digits into a scaled integer.
fn parse_fixed(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.len() > FRACTION_DIGITS as usize {
        return None;
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }
    let int_value: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let mut frac_value: i64 = if frac_part.is_empty() {
        0
    } else {
        frac_part.parse().ok()?
    };
    frac_value *= 10_i64.pow(FRACTION_DIGITS - frac_part.len() as u32);
    let value = int_value.checked_mul(SCALE)?.checked_add(frac_value)?;
    Some(if negative { -value } else { value })
}

/// Format a scaled integer as the shortest decimal string that parses back
/// to the same value.
fn format_fixed(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let int_part = abs / SCALE as u64;
    let frac_part = abs % SCALE as u64;
    if frac_part == 0 {
        return format!("{sign}{int_part}");
    }
    let frac = format!("{:06}", frac_part);
    format!("{sign}{int_part}.{}", frac.trim_end_matches('0'))
}

/// A length in nanometres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Length(i64);

impl Length {
    pub const fn from_nm(nm: i64) -> Self {
        Self(nm)
    }

    pub fn from_mm(mm: f64) -> Self {
        Self((mm * 1_000_000.0).round() as i64)
    }

    pub fn to_nm(self) -> i64 {
        self.0
    }

    pub fn to_mm(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Parse a millimetre string such as `"2.54"` or `"-0.1"`.
    pub fn parse_mm(text: &str) -> Result<Self, ParseUnitError> {
        parse_fixed(text).map(Self).ok_or_else(|| ParseUnitError {
            kind: "length",
            value: text.to_string(),
        })
    }

    pub fn to_mm_string(self) -> String {
        format_fixed(self.0)
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Self) -> Self::Output {
        Length(self.0 + rhs.0)
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, rhs: Self) -> Self::Output {
        Length(self.0 - rhs.0)
    }
}

impl Neg for Length {
    type Output = Length;

    fn neg(self) -> Self::Output {
        Length(-self.0)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mm", self.to_mm_string())
    }
}

/// An angle in micro-degrees, always normalized to `[0°, 360°)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Angle(i64);

impl Angle {
    const FULL_TURN: i64 = 360 * SCALE;

    pub fn from_micro_deg(udeg: i64) -> Self {
        Self(udeg.rem_euclid(Self::FULL_TURN))
    }

    pub fn from_deg(deg: f64) -> Self {
        Self::from_micro_deg((deg * 1_000_000.0).round() as i64)
    }

    pub fn deg0() -> Self {
        Self(0)
    }

    pub fn deg90() -> Self {
        Self(90 * SCALE)
    }

    pub fn to_micro_deg(self) -> i64 {
        self.0
    }

    pub fn to_deg(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn rotated(self, by: Angle) -> Self {
        Self::from_micro_deg(self.0 + by.0)
    }

    pub fn parse_deg(text: &str) -> Result<Self, ParseUnitError> {
        parse_fixed(text)
            .map(Self::from_micro_deg)
            .ok_or_else(|| ParseUnitError {
                kind: "angle",
                value: text.to_string(),
            })
    }

    pub fn to_deg_string(self) -> String {
        format_fixed(self.0)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.to_deg_string())
    }
}

/// A position on a schematic sheet or board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: Length,
    pub y: Length,
}

impl Point {
    pub const fn new(x: Length, y: Length) -> Self {
        Self { x, y }
    }

    pub fn from_mm(x: f64, y: f64) -> Self {
        Self::new(Length::from_mm(x), Length::from_mm(y))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
