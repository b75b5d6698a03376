//! Query parser: classifies raw user input into text tokens, strong and
//! weak digit tokens, or a single exact value (phone number, email).

use std::sync::LazyLock;

use regex::Regex;

use super::text::{digits_only, fold};
use super::types::{DigitToken, ParsedQuery};

/// Default cap on the number of classified tokens per query.
pub const MAX_TOKENS: usize = 12;

/// Digit runs of this length are strong filter tokens.
const STRONG_DIGITS_MIN: usize = 4;
/// Shorter runs (2..=3) only contribute to scoring.
const WEAK_DIGITS_MIN: usize = 2;
/// Length of a domestic phone number with its trunk prefix.
const PHONE_DIGITS: usize = 11;

/// Maximal runs of digits or Unicode letters, scanned left to right.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+|\p{L}+").unwrap());

/// Parse a raw query into a [`ParsedQuery`].
///
/// Two whole-input special cases take precedence over tokenization: an
/// 11-digit phone number (in any formatting) and an email-like value.
/// Otherwise the input is scanned for digit and letter runs until
/// `max_tokens` tokens have been classified.
///
/// # Examples
///
/// ```ignore
/// let query = parse_query("7701 Ромашка", MAX_TOKENS);
/// assert_eq!(query.text_tokens, vec!["ромашка"]);
/// assert_eq!(query.strong_digits[0].value, "7701");
/// ```
pub fn parse_query(raw: &str, max_tokens: usize) -> ParsedQuery {
    let raw = raw.trim();
    if raw.is_empty() {
        return ParsedQuery::default();
    }

    if let Some(phone) = parse_as_phone(raw) {
        return ParsedQuery {
            raw: raw.to_string(),
            strong_digits: vec![phone],
            ..Default::default()
        };
    }

    if looks_like_email(raw) {
        return ParsedQuery {
            raw: raw.to_string(),
            text_tokens: vec![fold(raw)],
            ..Default::default()
        };
    }

    let mut text_tokens: Vec<String> = Vec::new();
    let mut strong_digits: Vec<DigitToken> = Vec::new();
    let mut weak_digits: Vec<String> = Vec::new();
    let mut classified = 0;

    for run in TOKEN_PATTERN.find_iter(raw) {
        if classified >= max_tokens {
            break;
        }
        let run = run.as_str();

        if run.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            if run.len() < WEAK_DIGITS_MIN {
                // A lone digit is noise, not a token.
                continue;
            }
            if run.len() < STRONG_DIGITS_MIN {
                weak_digits.push(run.to_string());
            } else {
                strong_digits.push(digit_token(run));
            }
        } else {
            let folded = fold(run);
            if folded.chars().count() < 2 {
                continue;
            }
            text_tokens.push(folded);
        }
        classified += 1;
    }

    dedup_preserving_order(&mut text_tokens, |t| t.clone());
    dedup_preserving_order(&mut strong_digits, |t| t.value.clone());
    dedup_preserving_order(&mut weak_digits, |t| t.clone());

    ParsedQuery {
        raw: raw.to_string(),
        text_tokens,
        strong_digits,
        weak_digits,
    }
}

/// Whole-input phone detection: the digit projection is exactly 11 digits
/// and starts with the domestic trunk prefix 7 or 8. Both prefix forms are
/// kept as alternatives of a single strong token; no text tokens survive.
fn parse_as_phone(raw: &str) -> Option<DigitToken> {
    let digits = digits_only(raw);
    if digits.len() != PHONE_DIGITS {
        return None;
    }
    match digits.as_bytes()[0] {
        b'7' => Some(DigitToken::with_variant(
            digits.clone(),
            format!("8{}", &digits[1..]),
        )),
        b'8' => Some(DigitToken::with_variant(
            digits.clone(),
            format!("7{}", &digits[1..]),
        )),
        _ => None,
    }
}

/// A strong token for one digit run. An 11-digit run pasted in domestic
/// format (leading 8) also gets its 7-prefixed form as an alternative.
fn digit_token(run: &str) -> DigitToken {
    if run.len() == PHONE_DIGITS && run.starts_with('8') {
        DigitToken::with_variant(run, format!("7{}", &run[1..]))
    } else {
        DigitToken::new(run)
    }
}

/// Email-like inputs (`@` with a `.` somewhere after it) are kept whole so
/// `client@example.com` is not shredded into useless fragments.
fn looks_like_email(raw: &str) -> bool {
    raw.find('@')
        .is_some_and(|at| raw[at + 1..].contains('.'))
}

fn dedup_preserving_order<T, K: PartialEq>(items: &mut Vec<T>, key: impl Fn(&T) -> K) {
    let mut seen: Vec<K> = Vec::with_capacity(items.len());
    items.retain(|item| {
        let k = key(item);
        if seen.contains(&k) {
            false
        } else {
            seen.push(k);
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(!parse_query("", MAX_TOKENS).has_tokens());
        assert!(!parse_query("   ", MAX_TOKENS).has_tokens());
    }

    #[test]
    fn symbols_only_input_yields_no_tokens() {
        assert!(!parse_query("??", MAX_TOKENS).has_tokens());
        assert!(!parse_query("-- //", MAX_TOKENS).has_tokens());
    }

    #[test]
    fn single_letter_is_discarded() {
        let query = parse_query("а", MAX_TOKENS);
        assert!(!query.has_tokens());
    }

    #[test]
    fn text_tokens_are_folded_and_deduplicated() {
        let query = parse_query("Ромашка, РОМАШКА и офис", MAX_TOKENS);
        assert_eq!(query.text_tokens, vec!["ромашка", "офис"]);
    }

    #[test]
    fn digit_runs_classified_by_length() {
        let query = parse_query("офис 42 777 7701 9", MAX_TOKENS);
        assert_eq!(query.weak_digits, vec!["42", "777"]);
        assert_eq!(query.strong_digits, vec![DigitToken::new("7701")]);
        // The single digit "9" is dropped entirely.
        assert_eq!(query.text_tokens, vec!["офис"]);
    }

    #[test]
    fn formatted_phone_collapses_to_one_strong_token() {
        let query = parse_query("8 (999) 123-45-67", MAX_TOKENS);
        assert!(query.text_tokens.is_empty());
        assert!(query.weak_digits.is_empty());
        assert_eq!(query.strong_digits.len(), 1);

        let forms: Vec<&str> = query.strong_digits[0].forms().collect();
        assert_eq!(forms, vec!["89991234567", "79991234567"]);
    }

    #[test]
    fn seven_prefixed_phone_keeps_both_forms() {
        let query = parse_query("+7 999 123 45 67", MAX_TOKENS);
        let forms: Vec<&str> = query.strong_digits[0].forms().collect();
        assert_eq!(forms, vec!["79991234567", "89991234567"]);
    }

    #[test]
    fn phone_case_overrides_text_tokenization() {
        // Words around the digits would normally become text tokens, but an
        // 11-digit projection starting with 8 wins.
        let query = parse_query("тел 8 999 123 45 67", MAX_TOKENS);
        assert!(query.text_tokens.is_empty());
        assert_eq!(query.strong_digits.len(), 1);
    }

    #[test]
    fn eleven_digit_run_with_leading_eight_gets_variant() {
        // Two numbers, so the whole-input phone case does not apply; the
        // 8-prefixed run still picks up its 7-prefixed alternative.
        let query = parse_query("89991234567 84951112233", MAX_TOKENS);
        assert_eq!(query.strong_digits.len(), 2);
        let forms: Vec<&str> = query.strong_digits[0].forms().collect();
        assert_eq!(forms, vec!["89991234567", "79991234567"]);
        let forms: Vec<&str> = query.strong_digits[1].forms().collect();
        assert_eq!(forms, vec!["84951112233", "74951112233"]);
    }

    #[test]
    fn email_is_one_token() {
        let query = parse_query("Client@Example.com", MAX_TOKENS);
        assert_eq!(query.text_tokens, vec!["client@example.com"]);
        assert!(query.strong_digits.is_empty());
    }

    #[test]
    fn at_sign_without_dot_is_not_email() {
        let query = parse_query("ab@cd", MAX_TOKENS);
        assert_eq!(query.text_tokens, vec!["ab", "cd"]);
    }

    #[test]
    fn token_cap_limits_classification() {
        let input = "aa 11 bb 22 cc 33 dd 44 ee 55 ff 66";
        let query = parse_query(input, 5);
        let total = query.text_tokens.len() + query.strong_digits.len() + query.weak_digits.len();
        assert_eq!(total, 5);
        assert_eq!(query.text_tokens, vec!["aa", "bb", "cc"]);
        assert_eq!(query.weak_digits, vec!["11", "22"]);
    }

    #[test]
    fn punctuation_separates_tokens() {
        let query = parse_query("сиб-энерго", MAX_TOKENS);
        assert_eq!(query.text_tokens, vec!["сиб", "энерго"]);
    }
}
