//! Spelling out numbers, currency and ordinals in English.

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [&str; 7] = [
    "", "thousand", "million", "billion", "trillion", "quadrillion", "quintillion",
];

/// Replace every digit sequence in `text` with words
#[must_use]
pub fn normalize_numbers(text: &str) -> String {
    let text = remove_commas(text);
    let text = expand_dollars(&text);
    let text = replace_numbers(&text, expand_decimal);
    let text = replace_numbers(&text, expand_ordinal);
    replace_numbers(&text, |digits, _| {
        let value = digits.parse::<u64>().ok()?;
        Some((cardinal_or_year(value), 0))
    })
}

/// Cardinal number in words, e.g. `forty-two`
#[must_use]
pub fn number_to_words(value: u64) -> String {
    if value == 0 {
        return ONES[0].to_string();
    }

    let mut groups = Vec::new();
    let mut remaining = value;
    let mut scale = 0;
    while remaining > 0 {
        let group = (remaining % 1000) as usize;
        if group > 0 {
            let words = below_thousand(group);
            groups.push(if SCALES[scale].is_empty() {
                words
            } else {
                format!("{words} {}", SCALES[scale])
            });
        }
        remaining /= 1000;
        scale += 1;
    }

    groups.reverse();
    groups.join(" ")
}

/// Ordinal number in words, e.g. `twenty-first`
#[must_use]
pub fn ordinal_to_words(value: u64) -> String {
    let cardinal = number_to_words(value);
    let split = cardinal.rfind([' ', '-']).map_or(0, |i| i + 1);
    let (head, last) = cardinal.split_at(split);

    let ordinal = match last {
        "one" => "first".to_string(),
        "two" => "second".to_string(),
        "three" => "third".to_string(),
        "five" => "fifth".to_string(),
        "eight" => "eighth".to_string(),
        "nine" => "ninth".to_string(),
        "twelve" => "twelfth".to_string(),
        word if word.ends_with('y') => format!("{}ieth", &word[..word.len() - 1]),
        word => format!("{word}th"),
    };

    format!("{head}{ordinal}")
}

fn below_thousand(value: usize) -> String {
    let hundreds = value / 100;
    let rest = value % 100;

    let mut words = Vec::new();
    if hundreds > 0 {
        words.push(format!("{} hundred", ONES[hundreds]));
    }
    if rest >= 20 {
        let tens = TENS[rest / 10];
        words.push(if rest % 10 == 0 {
            tens.to_string()
        } else {
            format!("{tens}-{}", ONES[rest % 10])
        });
    } else if rest > 0 {
        words.push(ONES[rest].to_string());
    }

    words.join(" ")
}

// Years read in pairs: 1984 -> nineteen eighty-four, 1905 -> nineteen oh five.
fn cardinal_or_year(value: u64) -> String {
    if !(1001..3000).contains(&value) {
        return number_to_words(value);
    }

    let (high, low) = (value / 100, value % 100);
    if value == 2000 {
        "two thousand".to_string()
    } else if value > 2000 && value < 2010 {
        format!("two thousand {}", number_to_words(low))
    } else if low == 0 {
        format!("{} hundred", number_to_words(high))
    } else if low < 10 {
        format!("{} oh {}", number_to_words(high), number_to_words(low))
    } else {
        format!("{} {}", number_to_words(high), number_to_words(low))
    }
}

fn remove_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            let between_digits = c == ','
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(char::is_ascii_digit);
            !between_digits
        })
        .map(|(_, &c)| c)
        .collect()
}

fn expand_dollars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(after.len());
        let amount = after[..len].trim_end_matches('.');

        if amount.is_empty() {
            out.push('$');
        } else {
            out.push_str(&dollars_to_words(amount));
        }
        rest = &after[amount.len()..];
    }

    out.push_str(rest);
    out
}

fn dollars_to_words(amount: &str) -> String {
    let parts: Vec<&str> = amount.split('.').collect();
    if parts.len() > 2 {
        return format!("{amount} dollars");
    }

    let dollars = parts[0].parse::<u64>().unwrap_or(0);
    let cents = parts.get(1).and_then(|c| c.parse::<u64>().ok()).unwrap_or(0);
    let dollar_unit = if dollars == 1 { "dollar" } else { "dollars" };
    let cent_unit = if cents == 1 { "cent" } else { "cents" };

    match (dollars, cents) {
        (0, 0) => "zero dollars".to_string(),
        (d, 0) => format!("{d} {dollar_unit}"),
        (0, c) => format!("{c} {cent_unit}"),
        (d, c) => format!("{d} {dollar_unit}, {c} {cent_unit}"),
    }
}

fn expand_decimal(digits: &str, after: &str) -> Option<(String, usize)> {
    let fraction = after.strip_prefix('.')?;
    let len = fraction
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(fraction.len());
    if len == 0 {
        return None;
    }
    Some((format!("{digits} point {}", &fraction[..len]), len + 1))
}

fn expand_ordinal(digits: &str, after: &str) -> Option<(String, usize)> {
    let suffix = after.get(..2)?.to_ascii_lowercase();
    if !matches!(suffix.as_str(), "st" | "nd" | "rd" | "th") {
        return None;
    }
    let value = digits.parse::<u64>().ok()?;
    Some((ordinal_to_words(value), 2))
}

// Calls `replace(digits, text_after_digits)` for every digit run; the
// returned count is how much of the following text the replacement consumed.
fn replace_numbers<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(&str, &str) -> Option<(String, usize)>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let len = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
        let (digits, after) = tail.split_at(len);

        match replace(digits, after) {
            Some((words, consumed)) => {
                out.push_str(&words);
                rest = &after[consumed..];
            }
            None => {
                out.push_str(digits);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinals() {
        assert_eq!(number_to_words(0), "zero");
        assert_eq!(number_to_words(7), "seven");
        assert_eq!(number_to_words(42), "forty-two");
        assert_eq!(number_to_words(100), "one hundred");
        assert_eq!(number_to_words(115), "one hundred fifteen");
        assert_eq!(number_to_words(1_000_001), "one million one");
        assert_eq!(number_to_words(3_250_000), "three million two hundred fifty thousand");
    }

    #[test]
    fn test_ordinals() {
        assert_eq!(ordinal_to_words(1), "first");
        assert_eq!(ordinal_to_words(12), "twelfth");
        assert_eq!(ordinal_to_words(20), "twentieth");
        assert_eq!(ordinal_to_words(21), "twenty-first");
        assert_eq!(ordinal_to_words(104), "one hundred fourth");
    }

    #[test]
    fn test_years() {
        assert_eq!(normalize_numbers("1984"), "nineteen eighty-four");
        assert_eq!(normalize_numbers("1905"), "nineteen oh five");
        assert_eq!(normalize_numbers("1900"), "nineteen hundred");
        assert_eq!(normalize_numbers("2000"), "two thousand");
        assert_eq!(normalize_numbers("2007"), "two thousand seven");
        assert_eq!(normalize_numbers("3000"), "three thousand");
    }

    #[test]
    fn test_mixed_text() {
        assert_eq!(
            normalize_numbers("it costs $2.50 for the 3rd of 1,000 tickets"),
            "it costs two dollars, fifty cents for the third of one thousand tickets"
        );
        assert_eq!(normalize_numbers("pi is 3.14"), "pi is three point fourteen");
        assert_eq!(normalize_numbers("$1"), "one dollar");
        assert_eq!(normalize_numbers("a $ sign"), "a $ sign");
        assert_eq!(normalize_numbers("no digits"), "no digits");
    }
}
