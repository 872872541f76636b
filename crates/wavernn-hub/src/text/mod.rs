//! Text front end: cleaners and symbol ids for the Tacotron encoder
//!
//! Plain text is cleaned and mapped character by character. Spans wrapped in
//! curly braces are ARPAbet phonemes separated by spaces, e.g.
//! `"Turn left on {HH AW1 S S T AH0 N} Street."`.

pub mod cleaners;
pub mod numbers;
pub mod symbols;

pub use cleaners::clean_text;
pub use symbols::{id_symbol, symbol_id, symbols};

use crate::error::HubResult;

/// Signature shared by [`text_to_sequence`] and the converter handed out by
/// [`crate::text_to_sequence_converter`]
pub type TextToSequence = fn(&str, &[&str]) -> HubResult<Vec<usize>>;

/// Convert text into symbol ids
///
/// Characters without a symbol are dropped, as are `_` and `~`.
///
/// # Errors
///
/// Returns `InvalidInput` if a cleaner name is unknown.
pub fn text_to_sequence(text: &str, cleaner_names: &[&str]) -> HubResult<Vec<usize>> {
    let mut sequence = Vec::new();
    let mut rest = text;

    loop {
        let Some((before, phonemes, after)) = split_arpabet(rest) else {
            sequence.extend(symbols_to_sequence(&clean_text(rest, cleaner_names)?));
            break;
        };
        sequence.extend(symbols_to_sequence(&clean_text(before, cleaner_names)?));
        sequence.extend(arpabet_to_sequence(phonemes));
        rest = after;
    }

    Ok(sequence)
}

/// Convert symbol ids back into text
///
/// ARPAbet symbols come back wrapped in braces, with adjacent phonemes
/// sharing one pair. Ids outside the table are skipped.
#[must_use]
pub fn sequence_to_text(sequence: &[usize]) -> String {
    let mut text = String::new();
    for symbol in sequence.iter().filter_map(|&id| id_symbol(id)) {
        match symbol.strip_prefix('@') {
            Some(phone) if !phone.is_empty() => {
                text.push('{');
                text.push_str(phone);
                text.push('}');
            }
            _ => text.push_str(symbol),
        }
    }
    text.replace("}{", " ")
}

// First `{...}` span with a non-empty body.
fn split_arpabet(text: &str) -> Option<(&str, &str, &str)> {
    let open = text.find('{')?;
    let body = &text[open + 1..];
    let first = body.chars().next()?.len_utf8();
    let close = body[first..].find('}')? + first;
    Some((&text[..open], &body[..close], &body[close + 1..]))
}

fn symbols_to_sequence(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.chars().filter_map(|c| {
        let mut buf = [0u8; 4];
        let symbol: &str = c.encode_utf8(&mut buf);
        if symbol == "_" || symbol == "~" {
            None
        } else {
            symbol_id(symbol)
        }
    })
}

fn arpabet_to_sequence(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.split_whitespace()
        .filter_map(|phone| symbol_id(&format!("@{phone}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let sequence = text_to_sequence("Hi!", &["english_cleaners"]).unwrap();
        assert_eq!(
            sequence,
            vec![symbol_id("h").unwrap(), symbol_id("i").unwrap(), symbol_id("!").unwrap()]
        );
        assert_eq!(sequence_to_text(&sequence), "hi!");
    }

    #[test]
    fn test_arpabet_span() {
        let sequence = text_to_sequence("a {HH AW1} b", &["basic_cleaners"]).unwrap();
        assert_eq!(
            sequence,
            vec![
                symbol_id("a").unwrap(),
                symbol_id(" ").unwrap(),
                symbol_id("@HH").unwrap(),
                symbol_id("@AW1").unwrap(),
                symbol_id(" ").unwrap(),
                symbol_id("b").unwrap(),
            ]
        );
        assert_eq!(sequence_to_text(&sequence), "a {HH AW1} b");
    }

    #[test]
    fn test_unknown_symbols_dropped() {
        let sequence = text_to_sequence("a_b~c#", &[]).unwrap();
        assert_eq!(sequence_to_text(&sequence), "abc");

        let sequence = text_to_sequence("{XX K}", &[]).unwrap();
        assert_eq!(sequence, vec![symbol_id("@K").unwrap()]);
    }

    #[test]
    fn test_span_starting_with_multibyte_char() {
        let sequence = text_to_sequence("{é} {K}", &[]).unwrap();
        assert_eq!(sequence, vec![symbol_id(" ").unwrap(), symbol_id("@K").unwrap()]);
    }

    #[test]
    fn test_unclosed_brace_is_plain_text() {
        let sequence = text_to_sequence("a {b", &[]).unwrap();
        assert_eq!(sequence_to_text(&sequence), "a b");
    }

    #[test]
    fn test_empty_input() {
        assert!(text_to_sequence("", &["english_cleaners"]).unwrap().is_empty());
        assert_eq!(sequence_to_text(&[]), "");
        assert_eq!(sequence_to_text(&[9999]), "");
    }

    #[test]
    fn test_unknown_cleaner() {
        assert!(text_to_sequence("a", &["nope"]).is_err());
    }
}
