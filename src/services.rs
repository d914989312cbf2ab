//! Built-in services consumed through the injector

use tracing::debug;

/// Digit-grouping formatter shared by the input-formatting directives.
pub struct Formatter {
    name: String,
}

impl Formatter {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug!(%name, "formatter constructed");
        Self { name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keep only digits, cap at `length`, then group by `group_length`
    /// (space-joined when `with_spaces`).
    pub fn format_number(
        &self,
        initial: &str,
        length: usize,
        group_length: usize,
        with_spaces: bool,
    ) -> String {
        let digits: String = initial.chars().filter(char::is_ascii_digit).take(length).collect();
        if !with_spaces || group_length == 0 {
            return digits;
        }
        let groups: Vec<&str> = digits
            .as_bytes()
            .chunks(group_length)
            .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
            .collect();
        groups.join(" ")
    }
}

/// Luhn checksum validation for card numbers.
#[derive(Default)]
pub struct CreditCardVerifier;

impl CreditCardVerifier {
    pub fn new() -> Self {
        Self
    }

    /// True for a complete 16-digit number passing the Luhn checksum.
    /// Spaces are ignored.
    pub fn is_valid(&self, number: &str) -> bool {
        let digits: Vec<u32> = number
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_digit(10))
            .collect::<Option<_>>()
            .unwrap_or_default();
        if digits.len() != 16 {
            return false;
        }
        let sum: u32 = digits
            .iter()
            .rev()
            .enumerate()
            .map(|(i, &d)| {
                if i % 2 == 1 {
                    let doubled = d * 2;
                    if doubled > 9 {
                        doubled - 9
                    } else {
                        doubled
                    }
                } else {
                    d
                }
            })
            .sum();
        sum % 10 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_grouping_in_pairs() {
        let formatter = Formatter::new("test");
        assert_eq!(
            formatter.format_number("0612345678", 10, 2, true),
            "06 12 34 56 78"
        );
    }

    #[test]
    fn non_digits_are_dropped_and_length_capped() {
        let formatter = Formatter::new("test");
        assert_eq!(
            formatter.format_number("4111111111111111abc", 16, 4, true),
            "4111 1111 1111 1111"
        );
        assert_eq!(formatter.format_number("12 34-56", 10, 2, false), "123456");
    }

    #[test]
    fn short_input_keeps_a_partial_last_group() {
        let formatter = Formatter::new("test");
        assert_eq!(formatter.format_number("12345", 10, 2, true), "12 34 5");
    }

    #[test]
    fn luhn_accepts_the_canonical_test_number() {
        let verifier = CreditCardVerifier::new();
        assert!(verifier.is_valid("4111 1111 1111 1111"));
        assert!(verifier.is_valid("4111111111111111"));
    }

    #[test]
    fn luhn_rejects_wrong_checksum_and_wrong_length() {
        let verifier = CreditCardVerifier::new();
        assert!(!verifier.is_valid("4111 1111 1111 1112"));
        assert!(!verifier.is_valid("4111"));
        assert!(!verifier.is_valid("4111x111111111111"));
    }
}
