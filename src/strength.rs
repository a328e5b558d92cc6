//! Heuristic password strength estimation.
//!
//! The score counts length thresholds and character classes present. The
//! entropy figure is `length * log2(alphabet)` where the alphabet is the sum
//! of the sizes of the classes present (26 lower, 26 upper, 10 digits, 32
//! symbols). That is the entropy of a uniformly random password over that
//! alphabet, not of the password given: `Password1!` scores the same as a
//! random string of the same shape. Treat both numbers as guidance for a
//! human, never as a security bound.

use serde::Serialize;

/// Highest possible score.
pub const MAX_SCORE: u8 = 7;

const LOWER_ALPHABET: u32 = 26;
const UPPER_ALPHABET: u32 = 26;
const DIGIT_ALPHABET: u32 = 10;
const SYMBOL_ALPHABET: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Fair,
    Good,
    Strong,
    Excellent,
}

impl Strength {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=2 => Strength::Weak,
            3..=4 => Strength::Fair,
            5 => Strength::Good,
            6 => Strength::Strong,
            _ => Strength::Excellent,
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Strength::Weak => "weak",
            Strength::Fair => "fair",
            Strength::Good => "good",
            Strength::Strong => "strong",
            Strength::Excellent => "excellent",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordStrengthReport {
    /// 0 to [`MAX_SCORE`].
    pub score: u8,
    pub strength: Strength,
    pub entropy_bits: f64,
    /// Suggestions, in a fixed order: length first, then missing classes.
    pub feedback: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Classes {
    lower: bool,
    upper: bool,
    digit: bool,
    symbol: bool,
}

impl Classes {
    fn of(password: &str) -> Self {
        password.chars().fold(Classes::default(), |mut c, ch| {
            if ch.is_ascii_lowercase() {
                c.lower = true;
            } else if ch.is_ascii_uppercase() {
                c.upper = true;
            } else if ch.is_ascii_digit() {
                c.digit = true;
            } else {
                c.symbol = true;
            }
            c
        })
    }

    fn alphabet(self) -> u32 {
        [
            (self.lower, LOWER_ALPHABET),
            (self.upper, UPPER_ALPHABET),
            (self.digit, DIGIT_ALPHABET),
            (self.symbol, SYMBOL_ALPHABET),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, size)| size)
        .sum()
    }
}

/// Scores `password`. Pure; nothing is stored or logged.
///
/// Length is counted in Unicode scalar values. Anything that is not an ASCII
/// letter or digit counts as a symbol.
pub fn analyze(password: &str) -> PasswordStrengthReport {
    let length = password.chars().count();
    let classes = Classes::of(password);
    let mut score = 0u8;
    let mut feedback = Vec::new();

    if length >= 8 {
        score += 1;
    } else {
        feedback.push("Use at least 8 characters".to_string());
    }
    if length >= 12 {
        score += 1;
    } else if length >= 8 {
        feedback.push("Use 12 or more characters for a stronger password".to_string());
    }
    if length >= 16 {
        score += 1;
    }

    for (present, hint) in [
        (classes.lower, "Add lowercase letters"),
        (classes.upper, "Add uppercase letters"),
        (classes.digit, "Add numbers"),
        (classes.symbol, "Add special characters"),
    ] {
        if present {
            score += 1;
        } else {
            feedback.push(hint.to_string());
        }
    }

    let alphabet = classes.alphabet();
    let entropy_bits = if alphabet == 0 {
        0.0
    } else {
        length as f64 * f64::from(alphabet).log2()
    };

    PasswordStrengthReport {
        score,
        strength: Strength::from_score(score),
        entropy_bits,
        feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_troubadour() {
        let report = analyze("Tr0ub4dor&3");
        assert_eq!(report.score, 5);
        assert_eq!(report.strength, Strength::Good);
        assert!((report.entropy_bits - 11.0 * 94f64.log2()).abs() < 1e-9);
        assert!((report.entropy_bits - 72.1).abs() < 0.05);
        assert_eq!(
            report.feedback,
            ["Use 12 or more characters for a stronger password"]
        );
    }

    #[test]
    fn test_empty() {
        let report = analyze("");
        assert_eq!(report.score, 0);
        assert_eq!(report.strength, Strength::Weak);
        assert_eq!(report.entropy_bits, 0.0);
        assert_eq!(
            report.feedback,
            [
                "Use at least 8 characters",
                "Add lowercase letters",
                "Add uppercase letters",
                "Add numbers",
                "Add special characters",
            ]
        );
    }

    #[test]
    fn test_excellent() {
        let report = analyze("correct-Horse-battery-staple-9");
        assert_eq!(report.score, MAX_SCORE);
        assert_eq!(report.strength, Strength::Excellent);
        assert!(report.feedback.is_empty());
    }

    #[test]
    fn test_tiers() {
        assert_eq!(Strength::from_score(2), Strength::Weak);
        assert_eq!(Strength::from_score(3), Strength::Fair);
        assert_eq!(Strength::from_score(4), Strength::Fair);
        assert_eq!(Strength::from_score(5), Strength::Good);
        assert_eq!(Strength::from_score(6), Strength::Strong);
        assert_eq!(Strength::from_score(7), Strength::Excellent);
    }

    #[test]
    fn test_digits_only() {
        let report = analyze("12345678");
        // length >= 8, digits
        assert_eq!(report.score, 2);
        assert!((report.entropy_bits - 8.0 * 10f64.log2()).abs() < 1e-9);
    }

    #[test]
    fn test_non_ascii_counts_as_symbol() {
        let report = analyze("ü");
        assert_eq!(report.score, 1);
        assert!((report.entropy_bits - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_in_length() {
        let mut previous = analyze("aB3$");
        for n in 2..=10 {
            let report = analyze(&"aB3$".repeat(n));
            assert!(report.score >= previous.score);
            assert!(report.entropy_bits >= previous.entropy_bits);
            previous = report;
        }
    }

    #[test]
    fn test_report_json() {
        let json = serde_json::to_value(analyze("abc")).unwrap();
        assert_eq!(json["strength"], "weak");
        assert!(json.get("entropyBits").is_some());
    }
}
