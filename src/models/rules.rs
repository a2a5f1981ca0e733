// Pattern tables for the printed roll layout: label detection for the line
// parser, identifier formats, and the noisy-token variants used by the
// fuzzy classifier for relation and gender.

use crate::models::data::{Gender, Relation};
use lazy_static::lazy_static;
use regex::Regex;

/// Ordered regex variants that all denote one canonical label.
pub struct PatternClass<L> {
    pub label: L,
    pub patterns: Vec<Regex>,
}

/// Fallback rule: every char of `required` present, optionally with a length cap in chars.
pub struct CharsetRule<L> {
    pub label: L,
    pub required: &'static [char],
    pub max_chars: Option<usize>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

lazy_static! {
    // Electoral photo identity card numbers
    pub static ref IDENTIFIER_PATTERNS: Vec<Regex> = compile(&[
        r"^[A-Z]{3}[0-9]{7}$",
        r"^[A-Z]{2}/[0-9]{2}/[0-9]{3}/[0-9]{6}$",
    ]);

    // Line labels. Separators mirror FIELD_SEPARATORS.
    pub static ref NAME_LABEL: Regex = Regex::new(r"(?:नाम|(?i:\bname\b))\s*[:;ः।|!]").unwrap();
    pub static ref HINDI_RELATION_NAME_LABEL: Regex = Regex::new(r"(\S+)\s*का\s*नाम").unwrap();
    pub static ref LATIN_RELATION_NAME_LABEL: Regex =
        Regex::new(r"(?i)\b(husband|father|mother|other|guardian)(?:'s|’s|s)?\s*name\b").unwrap();
    pub static ref OTHER_LABEL: Regex = Regex::new(r"(?:अन्य|(?i:\bother\b))\s*[:;ः]").unwrap();
    pub static ref HOUSE_LABEL: Regex =
        Regex::new(r"[मस]कान\s*संख्या|(?i:\bhouse\s*(?:number|no))").unwrap();
    pub static ref HOUSE_VALUE: Regex = Regex::new(
        r"(?:[मस]कान\s*संख्या|(?i:\bhouse\s*(?:number|no)\.?))\s*[:;ः।|!]\s*([0-9/]*)"
    ).unwrap();
    pub static ref AGE_LABEL: Regex = Regex::new(r"आयु|(?i:\bage\b)").unwrap();
    pub static ref AGE_VALUE: Regex = Regex::new(r"(?:आयु|(?i:\bage\b))\s*[:;ः।|!]\s*(\d+)").unwrap();
    pub static ref GENDER_LABEL: Regex = Regex::new(r"लिंग|(?i:\b(?:gender|sex)\b)").unwrap();
    pub static ref GENDER_VALUE: Regex =
        Regex::new(r"(?:लिंग|(?i:\b(?:gender|sex)\b))\s*[:;ः।|!]\s*(\S+)").unwrap();

    // Relation variants, Husband before Father before Other
    pub static ref RELATION_CLASSES: Vec<PatternClass<Relation>> = vec![
        PatternClass {
            label: Relation::Husband,
            patterns: compile(&[
                r"पति", r"पती", r"पतर", r"पत्र", r"पि?ति", r"पि?ती", r"पिि?ति",
                r"पत्ति", r"पत्ती", r"पत्ि?ति", r"hus?band", r"husb",
            ]),
        },
        PatternClass {
            label: Relation::Father,
            patterns: compile(&[
                r"पिता", r"पीता", r"पि?ि?ता", r"पीि?ता", r"पीतिा",
                r"fat?her", r"fathe",
            ]),
        },
        PatternClass {
            label: Relation::Other,
            patterns: compile(&[
                r"अन्य", r"अन्ि?या?", r"अन्यि", r"अि?न्या?", r"अि?न्यि",
                r"other", r"0ther",
            ]),
        },
    ];

    pub static ref RELATION_HEURISTICS: Vec<CharsetRule<Relation>> = vec![
        CharsetRule { label: Relation::Husband, required: &['प', 'त', 'ि'], max_chars: Some(6) },
        CharsetRule { label: Relation::Father, required: &['प', 'त', 'ा'], max_chars: Some(6) },
        CharsetRule { label: Relation::Other, required: &['अ', 'न', 'य'], max_chars: Some(6) },
    ];

    // Gender variants, Male before Female. `\bmale\b` keeps "female" out of Male.
    pub static ref GENDER_CLASSES: Vec<PatternClass<Gender>> = vec![
        PatternClass {
            label: Gender::Male,
            patterns: compile(&[
                r"पुरुष", r"पुरुि?ि?ष्?", r"पुि?रुि?ि?ष्?", r"पुरुि?",
                r"\bmale\b", r"\bmaie\b",
            ]),
        },
        PatternClass {
            label: Gender::Female,
            patterns: compile(&[
                r"महिला", r"महिि?ि?ला्?", r"मि?हिि?ि?ला्?", r"स्त्री",
                r"female", r"fema1e", r"\bfemaie\b",
            ]),
        },
    ];

    pub static ref GENDER_HEURISTICS: Vec<CharsetRule<Gender>> = vec![
        CharsetRule { label: Gender::Male, required: &['प', 'र', 'ष'], max_chars: None },
        CharsetRule { label: Gender::Male, required: &['प', 'र', 'स'], max_chars: None },
        CharsetRule { label: Gender::Male, required: &['प', 'ु', 'र'], max_chars: None },
        CharsetRule { label: Gender::Female, required: &['म', 'ह', 'ल'], max_chars: None },
        CharsetRule { label: Gender::Female, required: &['म', 'ि', 'ल'], max_chars: None },
        CharsetRule { label: Gender::Female, required: &['म', 'ा', 'ल'], max_chars: None },
    ];
}
