//! Position types for task ordering using fractional indexing.
//!
//! A [`PositionKey`] is a string of base-36 digits (`0-9a-z`) compared
//! byte-by-byte. Reading a key as the fraction `0.d1d2d3...`, string order and
//! numeric order agree as long as no key ends in `'0'`, so every key produced
//! here keeps that invariant. All arithmetic works on the digits themselves;
//! keys are never converted to a fixed-width number, so they stay exact at any
//! length.

use super::column::Column;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const BASE: u8 = 36;
const MIN_DIGIT: u8 = b'0';
const MAX_DIGIT: u8 = b'z';
/// Lowest digit a key may end with
const LOW_DIGIT: u8 = b'1';
/// Key handed out when a column is empty
const MIDDLE: &str = "m";

/// Errors raised for malformed keys or misuse of the codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("position key is empty")]
    Empty,

    #[error("position key {key:?} contains invalid digit {digit:?}")]
    InvalidDigit { key: String, digit: char },

    #[error("position key {key:?} ends with the minimum digit '0'")]
    TrailingZero { key: String },

    #[error("position key {before:?} does not sort before {after:?}")]
    OutOfOrder { before: String, after: String },
}

/// Full position of a task on a board: column + key within that column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub column: Column,
    #[serde(rename = "position_key")]
    pub key: PositionKey,
}

impl Position {
    /// Create a new position
    pub fn new(column: Column, key: PositionKey) -> Self {
        Self { column, key }
    }

    /// Position in a column at the middle key, for a column with no tasks
    pub fn in_column(column: Column) -> Self {
        Self {
            column,
            key: PositionKey::middle(),
        }
    }
}

/// Ordering within a column. Uses fractional indexing.
///
/// Keys sort lexicographically to determine display order, so a task can be
/// placed between two others without touching any other task's key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PositionKey(String);

impl PositionKey {
    /// Validate a key: non-empty, digits `0-9a-z` only, no trailing `'0'`
    pub fn parse(key: impl Into<String>) -> Result<Self, KeyError> {
        let key = key.into();
        if key.is_empty() {
            return Err(KeyError::Empty);
        }
        if let Some(digit) = key.chars().find(|c| !matches!(c, '0'..='9' | 'a'..='z')) {
            return Err(KeyError::InvalidDigit { key, digit });
        }
        if key.ends_with(MIN_DIGIT as char) {
            return Err(KeyError::TrailingZero { key });
        }
        Ok(Self(key))
    }

    /// The key used for the first task of an empty column
    pub fn middle() -> Self {
        Self(MIDDLE.to_string())
    }

    /// A key that sorts after `before` ("append at tail").
    ///
    /// Increments the last digit that is not already `z` and drops what
    /// follows it. When every digit is `z` the key grows by one digit.
    pub fn after(before: &PositionKey) -> Self {
        let digits = before.0.as_bytes();
        match digits.iter().rposition(|&d| d != MAX_DIGIT) {
            Some(i) => {
                let mut out = digits[..i].to_vec();
                out.push(shift(digits[i], 1));
                Self::from_digits(out)
            }
            None => {
                let mut out = digits.to_vec();
                out.push(LOW_DIGIT);
                Self::from_digits(out)
            }
        }
    }

    /// A key that sorts before `after` ("insert at head").
    ///
    /// Decrements the last digit. A `'0'` left at the end is dropped along with
    /// any zeros before it; if that empties the key (`"1"`, `"01"`, ...) the key
    /// is extended below instead, so `"1"` becomes `"0z"`.
    pub fn before(after: &PositionKey) -> Self {
        let digits = after.0.as_bytes();
        let last = digits.len() - 1;
        let lowered = shift(digits[last], -1);

        let mut out = digits[..last].to_vec();
        if lowered != MIN_DIGIT {
            out.push(lowered);
            return Self::from_digits(out);
        }

        while out.last() == Some(&MIN_DIGIT) {
            out.pop();
        }
        if out.is_empty() {
            out = digits[..last].to_vec();
            out.extend([MIN_DIGIT, MAX_DIGIT]);
        }
        Self::from_digits(out)
    }

    /// A key strictly between `before` and `after`.
    ///
    /// Rejects pairs where `before >= after` rather than guessing an order.
    pub fn between(before: &PositionKey, after: &PositionKey) -> Result<Self, KeyError> {
        if before >= after {
            return Err(KeyError::OutOfOrder {
                before: before.0.clone(),
                after: after.0.clone(),
            });
        }
        Ok(Self::from_digits(midpoint(
            before.0.as_bytes(),
            Some(after.0.as_bytes()),
        )))
    }

    /// Whether this key lies strictly inside the open interval `(lower, upper)`;
    /// a missing bound is unbounded on that side.
    pub fn sorts_between(&self, lower: Option<&PositionKey>, upper: Option<&PositionKey>) -> bool {
        lower.is_none_or(|l| l < self) && upper.is_none_or(|u| self < u)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_digits(digits: Vec<u8>) -> Self {
        Self(digits.into_iter().map(char::from).collect())
    }
}

/// Generate a key for a slot between two neighbours, either of which may be
/// absent (an open end of the column).
pub fn generate_between(
    before: Option<&PositionKey>,
    after: Option<&PositionKey>,
) -> Result<PositionKey, KeyError> {
    match (before, after) {
        (None, None) => Ok(PositionKey::middle()),
        (None, Some(after)) => Ok(PositionKey::before(after)),
        (Some(before), None) => Ok(PositionKey::after(before)),
        (Some(before), Some(after)) => PositionKey::between(before, after),
    }
}

/// Digit-wise midpoint of `lower` and `upper` read as base-36 fractions.
///
/// `lower` may be empty (zero); `upper = None` stands for one. The caller
/// guarantees `lower < upper` and that neither ends in `'0'`.
fn midpoint(lower: &[u8], upper: Option<&[u8]>) -> Vec<u8> {
    if let Some(upper) = upper {
        // shared prefix, with `lower` padded by zeros
        let n = upper
            .iter()
            .enumerate()
            .take_while(|&(i, &d)| lower.get(i).copied().unwrap_or(MIN_DIGIT) == d)
            .count();
        if n > 0 {
            let mut out = upper[..n].to_vec();
            out.extend(midpoint(lower.get(n..).unwrap_or(&[]), Some(&upper[n..])));
            return out;
        }
    }

    let low = lower.first().map_or(0, |&d| value(d));
    let high = upper.map_or(BASE, |u| value(u[0]));

    if high - low > 1 {
        return vec![DIGITS[usize::from((low + high + 1) / 2)]];
    }

    match upper {
        // upper's leading digit alone is already above lower and below upper
        Some(upper) if upper.len() > 1 => vec![upper[0]],
        // adjacent digits: keep lower's digit and append after the rest of it
        _ => {
            let mut out = vec![DIGITS[usize::from(low)]];
            out.extend(midpoint(lower.get(1..).unwrap_or(&[]), None));
            out
        }
    }
}

fn value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        _ => digit - b'a' + 10,
    }
}

fn shift(digit: u8, delta: i8) -> u8 {
    DIGITS[usize::from(value(digit).saturating_add_signed(delta))]
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PositionKey {
    type Error = KeyError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        Self::parse(key)
    }
}

impl TryFrom<&str> for PositionKey {
    type Error = KeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::parse(key)
    }
}

impl From<PositionKey> for String {
    fn from(key: PositionKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PositionKey {
        PositionKey::parse(s).unwrap()
    }

    #[test]
    fn test_middle() {
        assert_eq!(generate_between(None, None).unwrap().as_str(), "m");
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        assert_eq!(PositionKey::parse(""), Err(KeyError::Empty));
        assert!(matches!(
            PositionKey::parse("aB"),
            Err(KeyError::InvalidDigit { digit: 'B', .. })
        ));
        assert!(matches!(
            PositionKey::parse("a0"),
            Err(KeyError::TrailingZero { .. })
        ));
        assert!(PositionKey::parse("0z").is_ok());
    }

    #[test]
    fn test_after() {
        assert_eq!(PositionKey::after(&key("a5")).as_str(), "a6");
        assert_eq!(PositionKey::after(&key("a9")).as_str(), "aa");
        assert_eq!(PositionKey::after(&key("az")).as_str(), "b");
        assert_eq!(PositionKey::after(&key("zz")).as_str(), "zz1");
    }

    #[test]
    fn test_before() {
        assert_eq!(PositionKey::before(&key("b")).as_str(), "a");
        assert_eq!(PositionKey::before(&key("a")).as_str(), "9");
        assert_eq!(PositionKey::before(&key("a1")).as_str(), "a");
        assert_eq!(PositionKey::before(&key("b01")).as_str(), "b");
        assert_eq!(PositionKey::before(&key("1")).as_str(), "0z");
        assert_eq!(PositionKey::before(&key("01")).as_str(), "00z");
    }

    #[test]
    fn test_between() {
        let mid = PositionKey::between(&key("a"), &key("z")).unwrap();
        assert!(key("a") < mid && mid < key("z"));

        // adjacent digits extend the lower key
        let mid = PositionKey::between(&key("a"), &key("b")).unwrap();
        assert_eq!(mid.as_str(), "ai");

        // shorter upper key is padded implicitly
        let mid = PositionKey::between(&key("a"), &key("a1")).unwrap();
        assert!(key("a") < mid && mid < key("a1"));
    }

    #[test]
    fn test_between_rejects_out_of_order() {
        assert!(matches!(
            PositionKey::between(&key("b"), &key("a")),
            Err(KeyError::OutOfOrder { .. })
        ));
        assert!(matches!(
            PositionKey::between(&key("b"), &key("b")),
            Err(KeyError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_head_inserts_are_monotonic() {
        let mut keys = vec![PositionKey::middle()];
        for _ in 0..200 {
            let next = generate_between(None, keys.last()).unwrap();
            keys.push(next);
        }
        keys.reverse();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_tail_inserts_are_monotonic() {
        let mut keys = vec![PositionKey::middle()];
        for _ in 0..200 {
            let next = generate_between(keys.last(), None).unwrap();
            keys.push(next);
        }
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_repeated_inserts_into_one_gap_stay_exact() {
        // Far more halvings than any 64-bit numeric midpoint could represent.
        let (low, high) = (key("a"), key("b"));
        let mut upper = high.clone();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            let k = PositionKey::between(&low, &upper).unwrap();
            assert!(low < k && k < upper, "{low} < {k} < {upper}");
            assert!(seen.insert(k.clone()), "duplicate key {k}");
            upper = k;
        }
    }

    #[test]
    fn test_sorts_between() {
        let k = key("m");
        assert!(k.sorts_between(None, None));
        assert!(k.sorts_between(Some(&key("a")), Some(&key("z"))));
        assert!(!k.sorts_between(Some(&key("m")), None));
        assert!(!k.sorts_between(None, Some(&key("m"))));
    }

    #[test]
    fn test_serde_validates() {
        let ok: PositionKey = serde_json::from_str("\"a5\"").unwrap();
        assert_eq!(ok, key("a5"));
        assert!(serde_json::from_str::<PositionKey>("\"a0\"").is_err());

        let position = Position::new(Column::Done, key("m"));
        let json = serde_json::to_value(&position).unwrap();
        assert_eq!(json["column"], "done");
        assert_eq!(json["position_key"], "m");
    }
}
