//! Password strength scoring for the signup and change-password forms.
//!
//! Purely advisory: the meter never blocks submission on its own. The only
//! hard rule ([`MIN_PASSWORD_LENGTH`]) is enforced in [`crate::validation`].

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Length that earns the "long password" bonus.
pub const LONG_PASSWORD_LENGTH: usize = 12;

/// Points awarded per satisfied criterion.
const POINTS_PER_CRITERION: u8 = 25;

/// Upper bound of the score.
pub const MAX_SCORE: u8 = 100;

/// Which criteria a password satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Criteria {
    pub min_length: bool,
    pub long: bool,
    pub mixed_case: bool,
    pub digit: bool,
    pub symbol: bool,
}

impl Criteria {
    /// Evaluate every criterion for `password`.
    #[must_use]
    pub fn evaluate(password: &str) -> Self {
        let length = password.chars().count();
        Self {
            min_length: length >= MIN_PASSWORD_LENGTH,
            long: length >= LONG_PASSWORD_LENGTH,
            mixed_case: password.chars().any(char::is_lowercase)
                && password.chars().any(char::is_uppercase),
            digit: password.chars().any(|c| c.is_ascii_digit()),
            symbol: password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        }
    }

    /// Number of satisfied criteria.
    #[must_use]
    pub fn satisfied(&self) -> u8 {
        [
            self.min_length,
            self.long,
            self.mixed_case,
            self.digit,
            self.symbol,
        ]
        .into_iter()
        .map(u8::from)
        .sum()
    }
}

/// Coarse bucket used for the meter colour and label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrengthLevel {
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLevel {
    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Strong => "Strong",
        }
    }

    /// CSS modifier for the meter bar.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Weak => "meter-weak",
            Self::Fair => "meter-fair",
            Self::Good => "meter-good",
            Self::Strong => "meter-strong",
        }
    }
}

/// Result of scoring a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    pub criteria: Criteria,
    /// `0..=100`.
    pub score: u8,
}

impl PasswordStrength {
    /// Score a password.
    #[must_use]
    pub fn of(password: &str) -> Self {
        let criteria = Criteria::evaluate(password);
        let score = criteria
            .satisfied()
            .saturating_mul(POINTS_PER_CRITERION)
            .min(MAX_SCORE);
        Self { criteria, score }
    }

    /// Bucket for display.
    #[must_use]
    pub const fn level(&self) -> StrengthLevel {
        match self.score {
            0..50 => StrengthLevel::Weak,
            50..75 => StrengthLevel::Fair,
            75..100 => StrengthLevel::Good,
            _ => StrengthLevel::Strong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_password_scores_zero() {
        let strength = PasswordStrength::of("");
        assert_eq!(strength.score, 0);
        assert_eq!(strength.level(), StrengthLevel::Weak);
    }

    #[test]
    fn test_score_is_monotonic_as_criteria_accumulate() {
        // Each step satisfies everything the previous one did, plus more.
        let steps = [
            "abc",
            "abcdefgh",
            "abcdefghijkl",
            "abcdefghijkL",
            "abcdefghijK1",
            "abcdefghiK1!",
        ];
        let scores: Vec<u8> = steps.iter().map(|p| PasswordStrength::of(p).score).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
        assert_eq!(scores.last(), Some(&MAX_SCORE));
    }

    #[test]
    fn test_score_is_capped() {
        let strength = PasswordStrength::of("Correct-Horse-Battery-9");
        assert_eq!(strength.criteria.satisfied(), 5);
        assert_eq!(strength.score, MAX_SCORE);
        assert_eq!(strength.level(), StrengthLevel::Strong);
    }

    #[test]
    fn test_adding_any_criterion_never_lowers_the_score() {
        let base = "password";
        let base_score = PasswordStrength::of(base).score;
        for extended in ["Password", "password1", "password!", "passwordpassword"] {
            assert!(PasswordStrength::of(extended).score >= base_score, "{extended}");
        }
    }

    #[test]
    fn test_levels() {
        assert_eq!(PasswordStrength::of("abcdefgh1").level(), StrengthLevel::Fair);
        assert_eq!(PasswordStrength::of("Abcdefgh1").level(), StrengthLevel::Good);
    }
}
