//! Text folding helpers shared by the index builder, the query parser and
//! the highlighter.
//!
//! Folding normalizes a string for comparison without destroying the
//! original: lowercase, `ё` → `е`, every whitespace run (including
//! non-breaking spaces) collapsed to a single ASCII space, leading and
//! trailing whitespace removed. Nothing else is touched, which is what
//! lets the highlighter map folded offsets back onto the original string.

/// Glued name variants shorter than this are dropped: they are almost
/// always a bare legal-form abbreviation ("ооо", "зао") and would match
/// every other company.
const GLUED_MIN_CHARS: usize = 5;

/// Characters replaced by a space in [`fold_punct_to_space`]: quotes,
/// brackets, hyphens, slashes and underscores that vendors love to put
/// inside company names.
const PUNCT_TO_SPACE: &[char] = &[
    '"', '\'', '`', '«', '»', '“', '”', '„', '‘', '’', '(', ')', '[', ']', '{', '}', '<', '>',
    '-', '–', '—', '/', '\\', '_',
];

/// Fold a string for comparison: lowercase, `ё` → `е`, whitespace runs
/// collapsed to single spaces, trimmed.
pub fn fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !out.is_empty() {
                pending_space = true;
            }
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        for lc in c.to_lowercase() {
            out.push(if lc == 'ё' { 'е' } else { lc });
        }
    }

    out
}

/// Fold with name punctuation turned into spaces first, so that
/// `Компания «X-Y» (Z)` matches the query `x y z`.
pub fn fold_punct_to_space(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if PUNCT_TO_SPACE.contains(&c) { ' ' } else { c })
        .collect();
    fold(&replaced)
}

/// The punctuation-to-space fold with the spaces removed entirely, used
/// only for short name-like fields so `сибэнерго` finds `Сиб-Энерго`.
/// Returns `None` when the result is too short to be a useful key.
pub fn fold_glued(s: &str) -> Option<String> {
    let glued: String = fold_punct_to_space(s).chars().filter(|c| *c != ' ').collect();
    if glued.chars().count() >= GLUED_MIN_CHARS {
        Some(glued)
    } else {
        None
    }
}

/// Extract the digit characters in order, dropping everything else.
/// `8 (926) 123-45-67` becomes `89261234567`.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_lowercases_and_substitutes_yo() {
        assert_eq!(fold("Артём"), "артем");
        assert_eq!(fold("ЁЛКА"), "елка");
    }

    #[test]
    fn fold_collapses_whitespace_and_trims() {
        assert_eq!(fold("  ООО   Ромашка "), "ооо ромашка");
        // Non-breaking space is whitespace too.
        assert_eq!(fold("а\u{a0}б"), "а б");
        assert_eq!(fold("а\t\nб"), "а б");
    }

    #[test]
    fn fold_keeps_punctuation() {
        assert_eq!(fold("ООО \"Ромашка\""), "ооо \"ромашка\"");
    }

    #[test]
    fn punct_to_space_strips_name_decorations() {
        assert_eq!(fold_punct_to_space("ООО «Сиб-Энерго» (ЮГ)"), "ооо сиб энерго юг");
        assert_eq!(fold_punct_to_space("a/b_c"), "a b c");
    }

    #[test]
    fn glued_variant_joins_words() {
        assert_eq!(
            fold_glued("ООО «Сиб-Энерго» (ЮГ)").as_deref(),
            Some("ооосибэнергоюг")
        );
    }

    #[test]
    fn glued_variant_skips_short_results() {
        // A bare legal form folds to 3 characters and is dropped.
        assert_eq!(fold_glued("ООО"), None);
        assert_eq!(fold_glued("З-А О"), None);
    }

    #[test]
    fn digits_only_preserves_order() {
        assert_eq!(digits_only("8 (926) 123-45-67"), "89261234567");
        assert_eq!(digits_only("ИНН 7701000000"), "7701000000");
        assert_eq!(digits_only("нет цифр"), "");
    }
}
