//! Text cleaners run before symbol lookup.
//!
//! Cleaners are selected by name so the list can live in the hyperparameter
//! store: `basic_cleaners`, `transliteration_cleaners` and `english_cleaners`.

use unicode_normalization::UnicodeNormalization;

use crate::error::{HubError, HubResult};
use crate::text::numbers::normalize_numbers;

// Matched case-insensitively, always followed by a period.
const ABBREVIATIONS: [(&str, &str); 18] = [
    ("mrs", "misess"),
    ("mr", "mister"),
    ("dr", "doctor"),
    ("st", "saint"),
    ("co", "company"),
    ("jr", "junior"),
    ("maj", "major"),
    ("gen", "general"),
    ("drs", "doctors"),
    ("rev", "reverend"),
    ("lt", "lieutenant"),
    ("hon", "honorable"),
    ("sgt", "sergeant"),
    ("capt", "captain"),
    ("esq", "esquire"),
    ("ltd", "limited"),
    ("col", "colonel"),
    ("ft", "fort"),
];

/// Run the named cleaners over `text`, in order
///
/// # Errors
///
/// Returns `InvalidInput` for an unknown cleaner name.
pub fn clean_text(text: &str, cleaner_names: &[&str]) -> HubResult<String> {
    let mut text = text.to_string();
    for name in cleaner_names {
        text = match *name {
            "basic_cleaners" => basic_cleaners(&text),
            "transliteration_cleaners" => transliteration_cleaners(&text),
            "english_cleaners" => english_cleaners(&text),
            other => {
                return Err(HubError::invalid_input(format!("Unknown cleaner: {other}")));
            }
        };
    }
    Ok(text)
}

/// Lowercase and collapse whitespace
#[must_use]
pub fn basic_cleaners(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase())
}

/// Like [`basic_cleaners`], after transliterating to ASCII
#[must_use]
pub fn transliteration_cleaners(text: &str) -> String {
    collapse_whitespace(&convert_to_ascii(text).to_lowercase())
}

/// Transliterate, lowercase, spell out numbers and abbreviations
#[must_use]
pub fn english_cleaners(text: &str) -> String {
    let text = convert_to_ascii(text).to_lowercase();
    let text = normalize_numbers(&text);
    let text = expand_abbreviations(&text);
    collapse_whitespace(&text)
}

fn convert_to_ascii(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            other => other,
        })
        .nfkd()
        .filter(char::is_ascii)
        .collect()
}

fn expand_abbreviations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(dot) = rest.find('.') {
        let head = &rest[..dot];
        let word_start = head
            .char_indices()
            .rev()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map_or(0, |(i, c)| i + c.len_utf8());
        let word = &head[word_start..];

        match ABBREVIATIONS
            .iter()
            .find(|(abbr, _)| word.eq_ignore_ascii_case(abbr))
        {
            Some((_, expansion)) => {
                out.push_str(&head[..word_start]);
                out.push_str(expansion);
            }
            None => {
                out.push_str(head);
                out.push('.');
            }
        }
        rest = &rest[dot + 1..];
    }

    out.push_str(rest);
    out
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cleaners() {
        assert_eq!(basic_cleaners("Hello   World\t\n!"), "hello world !");
        assert_eq!(basic_cleaners("Café"), "café");
    }

    #[test]
    fn test_transliteration_cleaners() {
        assert_eq!(transliteration_cleaners("Café  Déjà vu"), "cafe deja vu");
        assert_eq!(transliteration_cleaners("it\u{2019}s"), "it's");
    }

    #[test]
    fn test_english_cleaners() {
        assert_eq!(
            english_cleaners("Dr. Smith paid $5 on Jan 2nd, 1999."),
            "doctor smith paid five dollars on jan second, nineteen ninety-nine."
        );
        assert_eq!(english_cleaners("Mrs. and Mr. Jones"), "misess and mister jones");
    }

    #[test]
    fn test_abbreviation_needs_word_boundary() {
        assert_eq!(expand_abbreviations("first. mist."), "first. mist.");
        assert_eq!(expand_abbreviations("(st.)"), "(saint)");
    }

    #[test]
    fn test_clean_text_chains_cleaners() {
        assert_eq!(clean_text("A  B", &[]).unwrap(), "A  B");
        assert_eq!(clean_text("A  B", &["basic_cleaners"]).unwrap(), "a b");

        let err = clean_text("x", &["german_cleaners"]).unwrap_err();
        assert!(matches!(err, HubError::InvalidInput { .. }));
    }
}
