//! Highlighter: maps token matches back onto the original, unfolded field
//! values and renders them with escaped `<mark>` wrapping.
//!
//! Text tokens are located in the folded string and their spans recovered
//! in the original by probing start offsets within a small window around
//! the folded index (folding never inserts characters, it only collapses
//! whitespace and changes case). Digit tokens go through a positional map
//! from digit index to original character index, which highlights
//! `8 (926) 123-45-67` correctly when searching `8926`.

use super::text::fold;
use super::types::DigitToken;

/// How far (in characters) the original-string start may drift from the
/// folded match index. Collapsed whitespace runs longer than this lose
/// their highlight; see the boundary test below.
const WINDOW: usize = 5;

const MARK_OPEN: &str = "<mark>";
const MARK_CLOSE: &str = "</mark>";

/// Highlight every occurrence of the given folded text tokens and digit
/// tokens inside `text`. The output is HTML-escaped; token content can
/// never inject markup.
pub fn highlight(text: &str, text_tokens: &[String], digit_tokens: &[DigitToken]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let spans = match_spans(&chars, text_tokens, digit_tokens);
    render(&chars, &spans)
}

/// Merged, ordered match spans (char indices) for all tokens.
fn match_spans(
    chars: &[char],
    text_tokens: &[String],
    digit_tokens: &[DigitToken],
) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();

    let folded: Vec<char> = fold(&chars.iter().collect::<String>()).chars().collect();
    for token in text_tokens {
        let token_chars: Vec<char> = token.chars().collect();
        for folded_at in find_all(&folded, &token_chars) {
            if let Some(span) = recover_original_span(chars, folded_at, &token_chars) {
                spans.push(span);
            }
        }
    }

    let digit_positions: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .collect();
    let digits: Vec<char> = digit_positions.iter().map(|&i| chars[i]).collect();
    for token in digit_tokens {
        for form in token.forms() {
            let form_chars: Vec<char> = form.chars().collect();
            for at in find_all(&digits, &form_chars) {
                let start = digit_positions[at];
                let end = digit_positions[at + form_chars.len() - 1] + 1;
                spans.push((start, end));
            }
        }
    }

    merge_spans(spans)
}

fn find_all(haystack: &[char], needle: &[char]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    (0..=haystack.len() - needle.len())
        .filter(|&i| haystack[i..i + needle.len()] == *needle)
        .collect()
}

/// Probe original start offsets near the folded match index and walk the
/// original string folding it incrementally until the token is consumed.
/// Returns the exclusive end index of the first offset that works.
fn recover_original_span(
    chars: &[char],
    folded_at: usize,
    token: &[char],
) -> Option<(usize, usize)> {
    let from = folded_at.saturating_sub(WINDOW);
    let to = (folded_at + WINDOW).min(chars.len().saturating_sub(1));
    for start in from..=to {
        if chars[start].is_whitespace() {
            continue;
        }
        if let Some(end) = fold_prefix_end(chars, start, token) {
            return Some((start, end));
        }
    }
    None
}

/// If folding `chars[start..]` yields exactly `token` as a prefix, return
/// the original index one past the last consumed character.
fn fold_prefix_end(chars: &[char], start: usize, token: &[char]) -> Option<usize> {
    let mut pos = start;
    let mut consumed = 0;
    let mut pending_space = false;

    while consumed < token.len() {
        let c = *chars.get(pos)?;
        if c.is_whitespace() {
            pending_space = true;
            pos += 1;
            continue;
        }
        if pending_space {
            // A whitespace run folds to one space.
            if token[consumed] != ' ' {
                return None;
            }
            consumed += 1;
            pending_space = false;
            continue;
        }
        for lc in c.to_lowercase() {
            let lc = if lc == 'ё' { 'е' } else { lc };
            if consumed >= token.len() || lc != token[consumed] {
                return None;
            }
            consumed += 1;
        }
        pos += 1;
    }

    Some(pos)
}

/// Sort and coalesce overlapping or adjacent spans.
fn merge_spans(mut spans: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    spans.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn render(chars: &[char], spans: &[(usize, usize)]) -> String {
    let escape = |slice: &[char]| ammonia::clean_text(&slice.iter().collect::<String>());

    let mut out = String::new();
    let mut cursor = 0;
    for &(start, end) in spans {
        if start > cursor {
            out.push_str(&escape(&chars[cursor..start]));
        }
        out.push_str(MARK_OPEN);
        out.push_str(&escape(&chars[start..end]));
        out.push_str(MARK_CLOSE);
        cursor = end;
    }
    if cursor < chars.len() {
        out.push_str(&escape(&chars[cursor..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_tokens(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn highlights_simple_token() {
        let out = highlight("ООО Ромашка", &text_tokens(&["ромашка"]), &[]);
        assert_eq!(out, "ООО <mark>Ромашка</mark>");
    }

    #[test]
    fn highlight_is_case_and_yo_insensitive() {
        let out = highlight("Артём Иванов", &text_tokens(&["артем"]), &[]);
        assert_eq!(out, "<mark>Артём</mark> Иванов");
    }

    #[test]
    fn highlights_every_occurrence() {
        let out = highlight("ab x ab", &text_tokens(&["ab"]), &[]);
        assert_eq!(out, "<mark>ab</mark> x <mark>ab</mark>");
    }

    #[test]
    fn digit_token_spans_cross_formatting() {
        let token = DigitToken::new("8926");
        let out = highlight("8 (926) 123-45-67", &[], &[token]);
        assert_eq!(out, "<mark>8 (926</mark>) 123-45-67");
    }

    #[test]
    fn phone_variant_forms_both_highlight() {
        let token = DigitToken::with_variant("89261234567", "79261234567");
        let out = highlight("+7 926 123-45-67", &[], &[token]);
        assert_eq!(out, "+<mark>7 926 123-45-67</mark>");
    }

    #[test]
    fn overlapping_spans_merge() {
        let out = highlight("романов", &text_tokens(&["роман", "манов"]), &[]);
        assert_eq!(out, "<mark>романов</mark>");
    }

    #[test]
    fn output_is_escaped_everywhere() {
        let out = highlight("<b>ab</b> & co", &text_tokens(&["ab"]), &[]);
        assert!(!out.contains("<b>"));
        assert!(out.contains("<mark>ab</mark>"));
        assert!(out.contains("&amp;"));
    }

    #[test]
    fn span_covers_collapsed_whitespace() {
        let out = highlight("Иванов  Пётр", &text_tokens(&["иванов петр"]), &[]);
        assert_eq!(out, "<mark>Иванов  Пётр</mark>");
    }

    #[test]
    fn folded_span_round_trips_to_the_token() {
        let samples = [
            ("ООО «Сиб-Энерго»", "сиб"),
            ("Артём  Иванов", "артем иванов"),
            ("ЖЁЛТЫЙ дом", "желтый"),
        ];
        for (text, token) in samples {
            let chars: Vec<char> = text.chars().collect();
            let spans = match_spans(&chars, &text_tokens(&[token]), &[]);
            assert!(!spans.is_empty(), "no span for {token:?} in {text:?}");
            for (start, end) in spans {
                let original: String = chars[start..end].iter().collect();
                assert_eq!(fold(&original), token);
            }
        }
    }

    #[test]
    fn whitespace_run_beyond_window_loses_its_highlight() {
        // Eleven collapsed spaces push the original offset further than
        // the probe window reaches; the match is dropped, not misplaced.
        let text = format!("Иванов{}Пётр", " ".repeat(11));
        let out = highlight(&text, &text_tokens(&["петр"]), &[]);
        assert!(!out.contains(MARK_OPEN));
    }
}
