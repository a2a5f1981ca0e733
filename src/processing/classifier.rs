use crate::models::data::{Gender, Relation};
use crate::models::rules::{
    CharsetRule, PatternClass, GENDER_CLASSES, GENDER_HEURISTICS, RELATION_CLASSES, RELATION_HEURISTICS,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_PUNCTUATION: Regex = Regex::new(r"[।.,:;]+").unwrap();
}

/// How a token was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<L> {
    Pattern(L),
    Heuristic(L),
    /// No class matched; carries the cleaned token
    Unmatched(String),
}

impl<L> Classification<L> {
    pub fn label(self) -> Option<L> {
        match self {
            Classification::Pattern(label) | Classification::Heuristic(label) => Some(label),
            Classification::Unmatched(_) => None,
        }
    }
}

/// Pattern table first, then character-set heuristics, then identity.
pub struct FuzzyClassifier<'a, L> {
    classes: &'a [PatternClass<L>],
    heuristics: &'a [CharsetRule<L>],
}

impl<'a, L: Clone> FuzzyClassifier<'a, L> {
    pub fn new(classes: &'a [PatternClass<L>], heuristics: &'a [CharsetRule<L>]) -> Self {
        FuzzyClassifier { classes, heuristics }
    }

    pub fn classify(&self, raw: &str) -> Classification<L> {
        let token = Self::clean_token(raw);

        for class in self.classes {
            if class.patterns.iter().any(|p| p.is_match(&token)) {
                return Classification::Pattern(class.label.clone());
            }
        }

        let length = token.chars().count();
        for rule in self.heuristics {
            let short_enough = rule.max_chars.map_or(true, |max| length <= max);
            if short_enough && rule.required.iter().all(|c| token.contains(*c)) {
                return Classification::Heuristic(rule.label.clone());
            }
        }

        Classification::Unmatched(token)
    }

    fn clean_token(raw: &str) -> String {
        TOKEN_PUNCTUATION
            .replace_all(&raw.trim().to_lowercase(), "")
            .trim()
            .to_string()
    }
}

pub fn classify_relation(raw: &str) -> Relation {
    if raw.trim().is_empty() {
        return Relation::blank();
    }
    match FuzzyClassifier::new(RELATION_CLASSES.as_slice(), RELATION_HEURISTICS.as_slice()).classify(raw) {
        Classification::Pattern(relation) | Classification::Heuristic(relation) => relation,
        Classification::Unmatched(token) => Relation::Unrecognized(token),
    }
}

pub fn classify_gender(raw: &str) -> Gender {
    FuzzyClassifier::new(GENDER_CLASSES.as_slice(), GENDER_HEURISTICS.as_slice())
        .classify(raw)
        .label()
        .unwrap_or(Gender::Unknown)
}
