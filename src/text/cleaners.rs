//! `english_cleaners` and the Tacotron2 symbol table.
//!
//! The symbol ids must match the embedding table of the checkpoint:
//! pad `_`, special `-`, punctuation, then upper- and lowercase ASCII letters.

use std::collections::HashMap;

pub const PAD: char = '_';
pub const SPECIAL: &str = "-";
pub const PUNCTUATION: &str = "!'(),.:;? ";
pub const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const ABBREVIATIONS: &[(&str, &str)] = &[
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

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [(u64, &str); 3] = [
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

/// Symbol → id table of the Tacotron2 text encoder.
pub fn symbol_table() -> HashMap<char, i64> {
    std::iter::once(PAD)
        .chain(SPECIAL.chars())
        .chain(PUNCTUATION.chars())
        .chain(LETTERS.chars())
        .enumerate()
        .map(|(id, ch)| (ch, id as i64))
        .collect()
}

/// Clean `text` and map it to symbol ids. Characters outside the table
/// (and the pad symbol itself) are dropped.
pub fn text_to_sequence(text: &str, symbols: &HashMap<char, i64>) -> Vec<i64> {
    english_cleaners(text)
        .chars()
        .filter(|&ch| ch != PAD)
        .filter_map(|ch| symbols.get(&ch).copied())
        .collect()
}

/// Pipeline for English text: ASCII folding, lowercasing, number and
/// abbreviation expansion, whitespace collapsing.
pub fn english_cleaners(text: &str) -> String {
    let text = convert_to_ascii(text);
    let text = text.to_lowercase();
    let text = expand_numbers(&text);
    let text = expand_abbreviations(&text);
    collapse_whitespace(&text)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold typographic punctuation and accented Latin letters to ASCII and
/// drop anything else outside ASCII.
pub fn convert_to_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        let folded = match ch {
            '\u{2018}' | '\u{2019}' | '\u{05F3}' => "'",
            '\u{201c}' | '\u{201d}' | '\u{05F4}' => "\"",
            '\u{2013}' | '\u{2014}' | '\u{05BE}' => "-",
            '\u{2026}' => "...",
            '\u{00a0}' => " ",
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
            'è' | 'é' | 'ê' | 'ë' => "e",
            'È' | 'É' | 'Ê' | 'Ë' => "E",
            'ì' | 'í' | 'î' | 'ï' => "i",
            'Ì' | 'Í' | 'Î' | 'Ï' => "I",
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => "o",
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "O",
            'ù' | 'ú' | 'û' | 'ü' => "u",
            'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
            'ç' => "c",
            'Ç' => "C",
            'ñ' => "n",
            'Ñ' => "N",
            'ß' => "ss",
            _ => "",
        };
        out.push_str(folded);
    }
    out
}

pub fn expand_abbreviations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut at_boundary = true;

    'scan: while let Some(ch) = rest.chars().next() {
        if at_boundary && ch.is_ascii_alphabetic() {
            for (abbr, full) in ABBREVIATIONS {
                if let Some(after) = rest.strip_prefix(abbr).and_then(|r| r.strip_prefix('.')) {
                    out.push_str(full);
                    rest = after;
                    at_boundary = true;
                    continue 'scan;
                }
            }
        }
        out.push(ch);
        at_boundary = !ch.is_alphanumeric() && ch != '_';
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Spell out numbers: `1,000` → `one thousand`, `2.5` → `two point five`,
/// `3rd` → `third`, and years between 1000 and 3000 the way they are read.
pub fn expand_numbers(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        // Digits glued to a word (`mp3`) are left as they are.
        if i > 0 && chars[i - 1].is_ascii_alphabetic() {
            while i < chars.len() && chars[i].is_ascii_digit() {
                out.push(chars[i]);
                i += 1;
            }
            continue;
        }

        // Integer part, with thousands separators.
        let mut integer = String::new();
        while i < chars.len() {
            let ch = chars[i];
            if ch.is_ascii_digit() {
                integer.push(ch);
                i += 1;
            } else if ch == ',' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            } else {
                break;
            }
        }

        if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
            let mut fraction = String::new();
            while i < chars.len() && chars[i].is_ascii_digit() {
                fraction.push(chars[i]);
                i += 1;
            }
            out.push_str(&integer_words(&integer));
            out.push_str(" point");
            for digit in fraction.chars() {
                out.push(' ');
                out.push_str(ONES[digit as usize - '0' as usize]);
            }
            continue;
        }

        let suffix: String = chars[i..].iter().take(2).collect();
        if matches!(suffix.as_str(), "st" | "nd" | "rd" | "th")
            && !chars.get(i + 2).is_some_and(|c| c.is_alphanumeric())
        {
            i += 2;
            out.push_str(&ordinal(&integer_words(&integer)));
            continue;
        }

        match integer.parse::<u64>() {
            Ok(n) if n > 1000 && n < 3000 => out.push_str(&year_words(n)),
            _ => out.push_str(&integer_words(&integer)),
        }
    }
    out
}

fn integer_words(digits: &str) -> String {
    match digits.parse::<u64>() {
        Ok(n) if n < 1_000_000_000_000 => cardinal(n),
        _ => digits
            .chars()
            .map(|d| ONES[d as usize - '0' as usize])
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Cardinal number words for `n < 10^12`.
pub fn cardinal(n: u64) -> String {
    if n < 1000 {
        return below_thousand(n);
    }
    let mut parts = Vec::new();
    let mut rest = n;
    for (scale, name) in SCALES {
        if rest >= scale {
            parts.push(format!("{} {name}", below_thousand(rest / scale)));
            rest %= scale;
        }
    }
    if rest > 0 {
        parts.push(below_thousand(rest));
    }
    parts.join(" ")
}

fn below_thousand(n: u64) -> String {
    debug_assert!(n < 1000);
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, r) => below_hundred(r),
        (h, 0) => format!("{} hundred", ONES[h as usize]),
        (h, r) => format!("{} hundred {}", ONES[h as usize], below_hundred(r)),
    }
}

fn below_hundred(n: u64) -> String {
    match n {
        0..=19 => ONES[n as usize].to_string(),
        _ if n % 10 == 0 => TENS[(n / 10) as usize].to_string(),
        _ => format!("{}-{}", TENS[(n / 10) as usize], ONES[(n % 10) as usize]),
    }
}

fn year_words(n: u64) -> String {
    if n == 2000 {
        "two thousand".to_string()
    } else if n > 2000 && n < 2010 {
        format!("two thousand {}", below_hundred(n % 100))
    } else if n % 100 == 0 {
        format!("{} hundred", below_hundred(n / 100))
    } else if n % 100 < 10 {
        format!("{} oh {}", below_hundred(n / 100), below_hundred(n % 100))
    } else {
        format!("{} {}", below_hundred(n / 100), below_hundred(n % 100))
    }
}

/// Turn cardinal words into ordinal words by rewriting the last word.
fn ordinal(words: &str) -> String {
    let (head, last) = match words.rfind([' ', '-']) {
        Some(pos) => words.split_at(pos + 1),
        None => ("", words),
    };
    let last = match last {
        "one" => "first".to_string(),
        "two" => "second".to_string(),
        "three" => "third".to_string(),
        "five" => "fifth".to_string(),
        "eight" => "eighth".to_string(),
        "nine" => "ninth".to_string(),
        "twelve" => "twelfth".to_string(),
        w if w.ends_with('y') => format!("{}ieth", &w[..w.len() - 1]),
        w => format!("{w}th"),
    };
    format!("{head}{last}")
}
