//! Fixed-point rupee amounts and the display helpers built on them.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MINOR_PER_MAJOR: i64 = 100;

/// Largest magnitude accepted from JSON; keeps every amount exactly representable as `f64`.
const MAX_MINOR_UNITS: i64 = (1 << 53) - 1;

/// Signed amount held in minor units (paise).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn from_major(major: i64) -> Self {
        Self(major * MINOR_PER_MAJOR)
    }

    /// Converts a decimal rupee amount to paise. `None` for non-finite or out-of-range
    /// values and for amounts finer than one paisa, which would otherwise be rounded.
    pub fn from_decimal(value: f64) -> Option<Self> {
        exact_scaled(value, MINOR_PER_MAJOR as f64).map(Self)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn checked_neg(self) -> Option<Money> {
        self.0.checked_neg().map(Money)
    }

    /// Renders the amount with Indian digit grouping, e.g. `₹12,34,567.5`.
    pub fn format_inr(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let major = magnitude / MINOR_PER_MAJOR as u64;
        let minor = magnitude % MINOR_PER_MAJOR as u64;

        let fraction = match minor {
            0 => String::new(),
            m if m % 10 == 0 => format!(".{}", m / 10),
            m => format!(".{m:02}"),
        };

        format!("{sign}₹{}{fraction}", group_indian(major))
    }
}

fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// `value * scale` as an integer, or `None` if that loses precision or exceeds the f64-exact range.
pub(crate) fn exact_scaled(value: f64, scale: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let scaled = value * scale;
    let whole = scaled.round();
    // Decimal literals such as 0.29 land a few ulps away from the integer they denote.
    let noise = f64::EPSILON * scaled.abs().max(1.0) * 8.0;
    if (scaled - whole).abs() > noise || whole.abs() > MAX_MINOR_UNITS as f64 {
        return None;
    }
    Some(whole as i64)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_inr())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_PER_MAJOR == 0 {
            serializer.serialize_i64(self.0 / MINOR_PER_MAJOR)
        } else {
            serializer.serialize_f64(self.to_decimal())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Money::from_decimal(raw).ok_or_else(|| {
            serde::de::Error::custom(format!("{raw} is not a representable rupee amount"))
        })
    }
}
