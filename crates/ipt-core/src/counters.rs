use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ASCII digits only; `\d` would also match other Unicode digits.
static COUNTERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([0-9]+):([0-9]+)\]$").expect("counter pattern is valid")
});

/// A `[packets:bytes]` counter annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub packets: u64,
    pub bytes: u64,
}

impl Counters {
    pub fn new(packets: u64, bytes: u64) -> Self {
        Self { packets, bytes }
    }

    /// Parse a token of exactly the form `[<digits>:<digits>]`.
    ///
    /// Returns `None` for anything else, including signs, inner whitespace
    /// and values that overflow a `u64`. Callers must treat `None` as a
    /// parse error rather than falling back to zero.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = COUNTERS_RE.captures(token)?;
        Some(Self {
            packets: caps[1].parse().ok()?,
            bytes: caps[2].parse().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_counters() {
        assert_eq!(Counters::parse("[0:0]"), Some(Counters::new(0, 0)));
        assert_eq!(Counters::parse("[5:100]"), Some(Counters::new(5, 100)));
        assert_eq!(
            Counters::parse("[8202915326:443356185985]"),
            Some(Counters::new(8202915326, 443356185985))
        );
        assert_eq!(
            Counters::parse("[18446744073709551615:0]"),
            Some(Counters::new(u64::MAX, 0))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Counters::parse("5:100"), None);
        assert_eq!(Counters::parse("[5:100"), None);
        assert_eq!(Counters::parse("5:100]"), None);
        assert_eq!(Counters::parse("[5]"), None);
        assert_eq!(Counters::parse("[:100]"), None);
        assert_eq!(Counters::parse("[5:]"), None);
        assert_eq!(Counters::parse("[+5:100]"), None);
        assert_eq!(Counters::parse("[-5:100]"), None);
        assert_eq!(Counters::parse("[5: 100]"), None);
        assert_eq!(Counters::parse("[5:1:2]"), None);
        assert_eq!(Counters::parse("[0x5:100]"), None);
        assert_eq!(Counters::parse("[５:100]"), None);
    }

    #[test]
    fn test_parse_is_anchored() {
        assert_eq!(Counters::parse("x[5:100]"), None);
        assert_eq!(Counters::parse("[5:100]x"), None);
        assert_eq!(Counters::parse("[5:100]\n"), None);
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert_eq!(Counters::parse("[18446744073709551616:0]"), None);
        assert_eq!(Counters::parse("[0:99999999999999999999999]"), None);
    }
}
