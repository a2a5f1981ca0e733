// Text cleanup helpers shared by the recognizer and the line parser.
// Everything here is script-aware: printed rolls mix Devanagari and Latin
// text and use both numeral systems.

use lazy_static::lazy_static;
use regex::Regex;

/// Separators that follow a field label, tried in this order.
pub const FIELD_SEPARATORS: [char; 6] = [':', ';', 'ः', '।', '|', '!'];

const DEVANAGARI_DIGITS: [char; 10] = ['०', '१', '२', '३', '४', '५', '६', '७', '८', '९'];

/// Common glyph confusions when a numeric field is read.
pub const NUMERIC_GLYPHS: &[(char, char)] = &[('S', '5'), ('s', '5'), ('$', '5'), ('?', '7')];

/// Confusions that hide a `1` in thin, low contrast digits.
pub const ONE_GLYPHS: &[(char, char)] = &[('I', '1'), ('l', '1'), ('|', '1')];

/// Box remnants around printed serial numbers read as brackets or bars.
pub const LABEL_GLYPHS: &[(char, char)] = &[
    ('|', '1'),
    ('॥', '1'),
    (']', '1'),
    (')', '1'),
    ('(', '1'),
    ('[', '1'),
];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref TRAILING_PUNCTUATION: Regex = Regex::new(r"[।.,:;]+$").unwrap();
    static ref DIGIT_RUN: Regex = Regex::new(r"\d+").unwrap();
}

/// Trim and collapse inner whitespace to single spaces.
pub fn clean_line(line: &str) -> String {
    WHITESPACE.replace_all(line.trim(), " ").into_owned()
}

/// Value after the first separator (in `FIELD_SEPARATORS` order) present in the line.
pub fn extract_after_separator(line: &str) -> Option<&str> {
    FIELD_SEPARATORS.iter().find_map(|sep| {
        line.split_once(*sep)
            .map(|(_, value)| value.trim())
    })
}

pub fn devanagari_to_ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match DEVANAGARI_DIGITS.iter().position(|d| *d == c) {
            Some(value) => char::from(b'0' + value as u8),
            None => c,
        })
        .collect()
}

/// All digit runs in the text, after numeral conversion.
pub fn extract_numbers(text: &str) -> Vec<String> {
    let converted = devanagari_to_ascii_digits(text);
    DIGIT_RUN
        .find_iter(&converted)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn strip_trailing_punctuation(value: &str) -> String {
    TRAILING_PUNCTUATION.replace(value.trim(), "").trim().to_string()
}

pub fn substitute_glyphs(text: &str, table: &[(char, char)]) -> String {
    text.chars()
        .map(|c| {
            table
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

/// Keep ASCII digits only, converting Devanagari numerals first.
pub fn digits_only(text: &str) -> String {
    devanagari_to_ascii_digits(text)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect()
}

/// True for Devanagari letters and vowel signs; numerals and dandas are excluded.
pub fn is_devanagari_letter(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
        && !DEVANAGARI_DIGITS.contains(&c)
        && c != '।'
        && c != '॥'
}

pub fn has_devanagari_letters(text: &str) -> bool {
    text.chars().any(is_devanagari_letter)
}

/// Blank after trimming, the emptiness notion used for every field.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
