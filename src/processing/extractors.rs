// Line-oriented parsing of the full cell text. Each printed line carries one
// labeled field (two for the age/gender line); values follow the first
// separator of the fixed separator set.

use crate::models::rules::{
    AGE_LABEL, AGE_VALUE, GENDER_LABEL, GENDER_VALUE, HINDI_RELATION_NAME_LABEL, HOUSE_LABEL, HOUSE_VALUE,
    LATIN_RELATION_NAME_LABEL, NAME_LABEL, OTHER_LABEL,
};
use crate::utils::text::{clean_line, devanagari_to_ascii_digits, extract_after_separator, strip_trailing_punctuation};
use regex::Captures;

/// Relation-name labels that actually introduce the elector's own name.
const ELECTOR_TOKENS: [&str; 2] = ["निर्वाचक", "मतदाता"];

/// Raw field values found in the full cell text. Relation and gender are
/// still unclassified tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    pub name: String,
    pub relation_token: String,
    pub relation_name: String,
    pub house_number: String,
    pub age: String,
    pub gender_token: String,
}

pub struct LineParser;

impl LineParser {
    pub fn parse(text: &str) -> ParsedFields {
        let mut fields = ParsedFields::default();

        for raw_line in text.lines() {
            let line = clean_line(raw_line);
            if line.is_empty() {
                continue;
            }
            Self::parse_line(&line, &mut fields);
        }

        fields.name = strip_trailing_punctuation(&fields.name);
        fields.relation_token = strip_trailing_punctuation(&fields.relation_token);
        fields.relation_name = strip_trailing_punctuation(&fields.relation_name);
        fields.house_number = strip_trailing_punctuation(&fields.house_number);
        fields.age = strip_trailing_punctuation(&fields.age);
        fields.gender_token = strip_trailing_punctuation(&fields.gender_token);
        fields
    }

    fn parse_line(line: &str, fields: &mut ParsedFields) {
        let relation_label = Self::relation_label(line);

        if let Some(label) = NAME_LABEL.find(line).filter(|_| relation_label.is_none()) {
            if fields.name.is_empty() {
                fields.name = Self::value_from(line, label.start());
            }
        } else if let Some((token, start)) = relation_label {
            let value = Self::value_from(line, start);
            if ELECTOR_TOKENS.contains(&token.as_str()) {
                if fields.name.is_empty() {
                    fields.name = value;
                }
            } else {
                fields.relation_token = token;
                fields.relation_name = value;
            }
        } else if let Some(label) = OTHER_LABEL.find(line) {
            fields.relation_token = "अन्य".to_string();
            fields.relation_name = Self::value_from(line, label.start());
        } else if HOUSE_LABEL.is_match(line) {
            let converted = devanagari_to_ascii_digits(line);
            if let Some(captures) = HOUSE_VALUE.captures(&converted) {
                fields.house_number = Self::group(&captures);
            }
        } else if AGE_LABEL.is_match(line) && GENDER_LABEL.is_match(line) {
            Self::read_age(line, fields);
            Self::read_gender(line, fields);
        } else if AGE_LABEL.is_match(line) && fields.age.is_empty() {
            Self::read_age(line, fields);
        } else if GENDER_LABEL.is_match(line) && fields.gender_token.is_empty() {
            Self::read_gender(line, fields);
        }
    }

    /// Relation token and the byte offset where its label starts.
    fn relation_label(line: &str) -> Option<(String, usize)> {
        HINDI_RELATION_NAME_LABEL
            .captures(line)
            .or_else(|| LATIN_RELATION_NAME_LABEL.captures(line))
            .and_then(|captures| {
                let start = captures.get(0)?.start();
                Some((Self::group(&captures), start))
            })
    }

    fn read_age(line: &str, fields: &mut ParsedFields) {
        let converted = devanagari_to_ascii_digits(line);
        if let Some(captures) = AGE_VALUE.captures(&converted) {
            fields.age = Self::group(&captures);
        }
    }

    fn read_gender(line: &str, fields: &mut ParsedFields) {
        if let Some(captures) = GENDER_VALUE.captures(line) {
            fields.gender_token = Self::group(&captures);
        }
    }

    fn value_from(line: &str, start: usize) -> String {
        extract_after_separator(&line[start..])
            .map(|value| value.to_string())
            .unwrap_or_default()
    }

    fn group(captures: &Captures) -> String {
        captures
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }
}
