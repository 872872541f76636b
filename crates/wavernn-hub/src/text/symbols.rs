//! Symbol table shared by the text front end and the Tacotron embedding.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Padding symbol (id 0)
pub const PAD: &str = "_";

const SPECIAL: &str = "-";
const PUNCTUATION: &str = "!'(),.:;? ";
const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Phonemes of the CMU pronouncing dictionary, with stress markers
pub const ARPABET: [&str; 84] = [
    "AA", "AA0", "AA1", "AA2", "AE", "AE0", "AE1", "AE2", "AH", "AH0", "AH1", "AH2",
    "AO", "AO0", "AO1", "AO2", "AW", "AW0", "AW1", "AW2", "AY", "AY0", "AY1", "AY2",
    "B", "CH", "D", "DH", "EH", "EH0", "EH1", "EH2", "ER", "ER0", "ER1", "ER2", "EY",
    "EY0", "EY1", "EY2", "F", "G", "HH", "IH", "IH0", "IH1", "IH2", "IY", "IY0", "IY1",
    "IY2", "JH", "K", "L", "M", "N", "NG", "OW", "OW0", "OW1", "OW2", "OY", "OY0",
    "OY1", "OY2", "P", "R", "S", "SH", "T", "TH", "UH", "UH0", "UH1", "UH2", "UW",
    "UW0", "UW1", "UW2", "V", "W", "Y", "Z", "ZH",
];

static SYMBOLS: Lazy<Vec<String>> = Lazy::new(|| {
    std::iter::once(PAD.to_string())
        .chain(SPECIAL.chars().map(String::from))
        .chain(PUNCTUATION.chars().map(String::from))
        .chain(LETTERS.chars().map(String::from))
        .chain(ARPABET.iter().map(|phone| format!("@{phone}")))
        .collect()
});

static SYMBOL_TO_ID: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    SYMBOLS
        .iter()
        .enumerate()
        .map(|(id, symbol)| (symbol.as_str(), id))
        .collect()
});

/// All symbols in id order
#[must_use]
pub fn symbols() -> &'static [String] {
    &SYMBOLS
}

/// Id of a symbol, if it is in the table
#[must_use]
pub fn symbol_id(symbol: &str) -> Option<usize> {
    SYMBOL_TO_ID.get(symbol).copied()
}

/// Symbol for an id, if in range
#[must_use]
pub fn id_symbol(id: usize) -> Option<&'static str> {
    SYMBOLS.get(id).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size_and_order() {
        assert_eq!(symbols().len(), 148);
        assert_eq!(symbol_id(PAD), Some(0));
        assert_eq!(symbol_id("-"), Some(1));
        assert_eq!(symbol_id("A"), Some(12));
        assert_eq!(id_symbol(147), Some("@ZH"));
        assert_eq!(id_symbol(148), None);
    }

    #[test]
    fn test_symbols_are_unique() {
        let unique: std::collections::HashSet<_> = symbols().iter().collect();
        assert_eq!(unique.len(), symbols().len());
    }
}
