use crate::models::{FieldRecord, NAME_UNAVAILABLE};
use crate::processing::classifier::{classify_gender, classify_relation};
use crate::processing::extractors::LineParser;
use crate::utils::text::{clean_line, devanagari_to_ascii_digits, is_blank};
use log::debug;

/// Age below which a reading is treated as a probable dropped `1`.
pub const ADULT_AGE: u32 = 18;

/// Everything the recognizer read eagerly from one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellReading {
    pub identifier: String,
    pub house_number: String,
    pub age: String,
    pub full_text: String,
    pub sequence_label: String,
}

/// Extra reads that are only worth their engine calls when the primary
/// strategies come up short.
pub trait FallbackReader {
    fn read_name(&self) -> String;
    fn read_age_one_sensitive(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub record: FieldRecord,
    /// No semantic field recovered; ends the page
    pub is_empty: bool,
}

pub struct FieldNormalizer;

impl FieldNormalizer {
    pub fn normalize(reading: &CellReading, fallback: &dyn FallbackReader) -> NormalizedRecord {
        let parsed = LineParser::parse(&reading.full_text);

        let mut name = clean_line(&parsed.name);
        if is_blank(&name) {
            name = clean_line(&fallback.read_name());
        }

        let house_number = if !is_blank(&reading.house_number) {
            reading.house_number.trim().to_string()
        } else {
            devanagari_to_ascii_digits(&parsed.house_number)
        };

        let age_source = if !is_blank(&reading.age) { &reading.age } else { &parsed.age };
        let age = Self::valid_age(age_source);
        let age = if age.is_empty() {
            age
        } else {
            Self::repair_age(&age, || fallback.read_age_one_sensitive())
        };

        let relation = classify_relation(&parsed.relation_token);
        let relation_name = clean_line(&parsed.relation_name);

        let is_empty = is_blank(&name)
            && relation.is_blank()
            && is_blank(&relation_name)
            && is_blank(&house_number)
            && is_blank(&age);

        if is_blank(&name) {
            name = NAME_UNAVAILABLE.to_string();
        }

        NormalizedRecord {
            record: FieldRecord {
                voter_id: reading.identifier.clone(),
                name,
                relation,
                relation_name,
                house_number,
                age,
                gender: classify_gender(&parsed.gender_token),
            },
            is_empty,
        }
    }

    /// 1-3 ASCII digits after numeral conversion, otherwise blank.
    pub fn valid_age(raw: &str) -> String {
        let converted = devanagari_to_ascii_digits(raw.trim());
        if (1..=3).contains(&converted.len()) && converted.chars().all(|c| c.is_ascii_digit()) {
            converted
        } else {
            String::new()
        }
    }

    /// Repairs ages that lost a `1` in recognition. Ages from 18 up are kept.
    /// A zero becomes "10". Otherwise the 1-sensitive reading replaces the
    /// primary when it is an adult age or extends the primary digits, and a
    /// `1` is appended to the primary when it does neither.
    pub fn repair_age<F>(primary: &str, read_fallback: F) -> String
    where
        F: FnOnce() -> String,
    {
        let value = match primary.parse::<u32>() {
            Ok(value) => value,
            Err(_) => return primary.to_string(),
        };
        // Leading zeros would push the repaired age past three digits.
        let primary = value.to_string();
        let primary = primary.as_str();
        if value >= ADULT_AGE {
            return primary.to_string();
        }
        if value == 0 {
            return "10".to_string();
        }

        let fallback = read_fallback();
        let fallback_value = fallback.parse::<u32>().ok();
        let extends_primary =
            fallback.len() > primary.len() && (fallback.starts_with(primary) || fallback.ends_with(primary));

        let repaired = match fallback_value {
            Some(v) if v >= ADULT_AGE || extends_primary => fallback,
            _ => format!("{}1", primary),
        };
        debug!("age {} repaired to {}", primary, repaired);
        repaired
    }
}
