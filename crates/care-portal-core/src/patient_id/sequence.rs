//! Suffix classification and successor rules.
//!
//! A suffix moves through three shapes as each range is exhausted:
//!
//! ```text
//! 00001 .. 99999  →  00001A .. 00001Z  →  00001ZA .. 00001ZZ  →  00001AAA ..
//!   (numeric)          (single letter)          (letter run, base 26)
//! ```
//!
//! Once letters appear the digit part is carried along unchanged.

/// Width of the numeric part of a suffix.
pub const SUFFIX_DIGITS: usize = 5;

/// Suffix of the first identifier allocated for a prefix.
pub const FIRST_SUFFIX: &str = "00001";

const MAX_NUMERIC: u64 = 99_999;

/// Suffix the numeric range rolls over into.
const NUMERIC_ROLLOVER: &str = "00001A";

/// A parsed identifier suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suffix {
    /// Digits only, e.g. `00042`. Values too large to parse count as exhausted.
    Numeric(u64),
    /// Digits followed by exactly one letter, e.g. `00001C`.
    SingleLetter { digits: String, letter: char },
    /// Digits followed by two or more letters, e.g. `00001ZA`.
    LetterRun { digits: String, letters: String },
    /// Anything else (empty, lowercase letters, letters before digits, ...).
    Unrecognized,
}

impl Suffix {
    /// Classify a suffix into exactly one shape.
    pub fn parse(suffix: &str) -> Self {
        let split = suffix
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(suffix.len());
        let (digits, letters) = suffix.split_at(split);

        if digits.is_empty() {
            return Suffix::Unrecognized;
        }
        if letters.is_empty() {
            return Suffix::Numeric(digits.parse().unwrap_or(u64::MAX));
        }
        if !letters.bytes().all(|b| b.is_ascii_uppercase()) {
            return Suffix::Unrecognized;
        }

        let mut chars = letters.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Suffix::SingleLetter {
                digits: digits.to_string(),
                letter,
            },
            _ => Suffix::LetterRun {
                digits: digits.to_string(),
                letters: letters.to_string(),
            },
        }
    }

    /// The next suffix in sequence. `Unrecognized` restarts at [`FIRST_SUFFIX`].
    pub fn successor(&self) -> String {
        match self {
            Suffix::Numeric(n) if *n < MAX_NUMERIC => {
                format!("{:0width$}", n + 1, width = SUFFIX_DIGITS)
            }
            Suffix::Numeric(_) => NUMERIC_ROLLOVER.to_string(),
            // Z grows into a two-letter run; the digits are not touched.
            Suffix::SingleLetter { digits, letter: 'Z' } => format!("{digits}ZA"),
            Suffix::SingleLetter { digits, letter } => {
                format!("{digits}{}", next_letter(*letter))
            }
            Suffix::LetterRun { digits, letters } => {
                format!("{digits}{}", increment_letters(letters))
            }
            Suffix::Unrecognized => FIRST_SUFFIX.to_string(),
        }
    }
}

/// Compute the suffix that follows `latest`, or the first suffix when there is none.
pub fn next_suffix(latest: Option<&str>) -> String {
    match latest {
        Some(suffix) => Suffix::parse(suffix).successor(),
        None => FIRST_SUFFIX.to_string(),
    }
}

fn next_letter(letter: char) -> char {
    (letter as u8 + 1) as char
}

/// Increment an `A`..`Z` run as a base-26 counter, growing it on carry-out.
fn increment_letters(letters: &str) -> String {
    let mut bytes = letters.as_bytes().to_vec();

    for b in bytes.iter_mut().rev() {
        if *b == b'Z' {
            *b = b'A';
        } else {
            *b += 1;
            return String::from_utf8_lossy(&bytes).into_owned();
        }
    }

    // Every position carried
    let mut grown = String::with_capacity(bytes.len() + 1);
    grown.push('A');
    grown.push_str(&String::from_utf8_lossy(&bytes));
    grown
}

/// Total order in which suffixes are allocated: shorter first, then string order.
pub fn sequence_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    #[test]
    fn test_parse_shapes() {
        assert_eq!(Suffix::parse("00042"), Suffix::Numeric(42));
        assert_eq!(
            Suffix::parse("00001C"),
            Suffix::SingleLetter {
                digits: "00001".into(),
                letter: 'C'
            }
        );
        assert_eq!(
            Suffix::parse("00001ZA"),
            Suffix::LetterRun {
                digits: "00001".into(),
                letters: "ZA".into()
            }
        );
    }

    #[test]
    fn test_parse_unrecognized() {
        for suffix in ["", "A", "ABC", "00001a", "00001A1", "0000-1", "00001É"] {
            assert_eq!(Suffix::parse(suffix), Suffix::Unrecognized, "{suffix:?}");
        }
    }

    #[test]
    fn test_numeric_increment() {
        assert_eq!(next_suffix(Some("00001")), "00002");
        assert_eq!(next_suffix(Some("00009")), "00010");
        assert_eq!(next_suffix(Some("99998")), "99999");
    }

    #[test]
    fn test_numeric_rollover() {
        assert_eq!(next_suffix(Some("99999")), "00001A");
        // Oversized numbers count as exhausted
        assert_eq!(next_suffix(Some("123456")), "00001A");
        assert_eq!(next_suffix(Some("99999999999999999999999")), "00001A");
    }

    #[test]
    fn test_single_letter() {
        assert_eq!(next_suffix(Some("00001A")), "00001B");
        assert_eq!(next_suffix(Some("00001Y")), "00001Z");
    }

    #[test]
    fn test_single_letter_rollover_keeps_digits() {
        assert_eq!(next_suffix(Some("00001Z")), "00001ZA");
        assert_eq!(next_suffix(Some("00042Z")), "00042ZA");
    }

    #[test]
    fn test_letter_run_carry() {
        assert_eq!(next_suffix(Some("00001ZA")), "00001ZB");
        assert_eq!(next_suffix(Some("00001AZ")), "00001BA");
        assert_eq!(next_suffix(Some("00001ZZ")), "00001AAA");
        assert_eq!(next_suffix(Some("00001AZZ")), "00001BAA");
        assert_eq!(next_suffix(Some("00001ZZZ")), "00001AAAA");
    }

    #[test]
    fn test_cold_start_and_fallback() {
        assert_eq!(next_suffix(None), "00001");
        assert_eq!(next_suffix(Some("garbage")), "00001");
        assert_eq!(next_suffix(Some("")), "00001");
    }

    #[test]
    fn test_sequence_cmp() {
        assert_eq!(sequence_cmp("99999", "00001A"), Ordering::Less);
        assert_eq!(sequence_cmp("00001Z", "00001ZA"), Ordering::Less);
        assert_eq!(sequence_cmp("00001ZZ", "00001AAA"), Ordering::Less);
        assert_eq!(sequence_cmp("00002", "00001"), Ordering::Greater);
    }

    #[test]
    fn test_walk_through_every_rollover() {
        let mut current = "99998".to_string();
        let mut seen = vec![current.clone()];
        // 99998 → 99999 → 00001A..Z (26) → 00001ZA..ZZ (26) → 00001AAA
        for _ in 0..55 {
            let next = next_suffix(Some(&current));
            assert_eq!(sequence_cmp(&current, &next), Ordering::Less, "{current} → {next}");
            seen.push(next.clone());
            current = next;
        }
        assert_eq!(seen[1], "99999");
        assert_eq!(seen[2], "00001A");
        assert_eq!(seen[27], "00001Z");
        assert_eq!(seen[28], "00001ZA");
        assert_eq!(seen[53], "00001ZZ");
        assert_eq!(seen[54], "00001AAA");
    }

    proptest! {
        #[test]
        fn prop_numeric_successor_is_greater(n in 0u64..99_999) {
            let current = format!("{:05}", n);
            let next = next_suffix(Some(&current));
            prop_assert_eq!(sequence_cmp(&current, &next), Ordering::Less);
            prop_assert_eq!(next.len(), SUFFIX_DIGITS);
        }

        #[test]
        fn prop_letter_run_successor_is_greater(letters in "[A-Z]{2,6}") {
            let current = format!("00001{}", letters);
            let next = next_suffix(Some(&current));
            prop_assert_eq!(sequence_cmp(&current, &next), Ordering::Less);
            prop_assert!(next.starts_with("00001"));
        }

        #[test]
        fn prop_successor_always_recognized(letters in "[A-Z]{0,4}", n in 0u64..100_000) {
            let current = format!("{:05}{}", n, letters);
            let next = next_suffix(Some(&current));
            prop_assert_ne!(Suffix::parse(&next), Suffix::Unrecognized);
        }
    }
}
