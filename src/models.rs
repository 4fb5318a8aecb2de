//! Data models for scraped questions and their translations.
//!
//! This module defines the records that flow through the pipeline:
//! - [`QuestionRecord`]: A question page as extracted from the answer site
//! - [`VariantRecord`]: One answer variant with its score
//! - [`TranslatedRecord`]: A [`QuestionRecord`] after translation
//! - [`TranslatedVariant`]: One translated answer variant
//!
//! Field names match the JSON files written to disk (`data.json` and
//! `dataRu.json`), so the structs serialize without renames.

use serde::{Deserialize, Serialize};

/// A single answer variant and the points it scores.
///
/// The position of a variant inside its [`QuestionRecord`] is meaningful:
/// it follows the table row order of the source page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct VariantRecord {
    /// The answer text as shown in the source table.
    pub variant: String,
    /// The score for this answer. Synthesized from rank when the table has no score column.
    pub points: u32,
}

impl VariantRecord {
    pub fn new(variant: impl Into<String>, points: u32) -> Self {
        Self {
            variant: variant.into(),
            points,
        }
    }
}

/// A question page extracted from the answer site.
///
/// Records are created once by the table extractor, appended once to the
/// store and never changed afterwards. The `url` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionRecord {
    /// The detail page this record was extracted from.
    pub url: String,
    /// The question text (page title).
    pub question_en: String,
    /// Answer variants in table order. Never empty for a stored record.
    pub variants_en: Vec<VariantRecord>,
}

/// A translated answer variant. Points are carried over unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslatedVariant {
    pub variant: String,
    pub points: u32,
}

/// A [`QuestionRecord`] with its question and variants translated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslatedRecord {
    /// Identity key, copied from the source record.
    pub url: String,
    /// The original English question.
    pub question_en: String,
    /// The translated question.
    pub question: String,
    /// Translated variants, in the same order as the source record.
    pub variants: Vec<TranslatedVariant>,
}

impl TranslatedRecord {
    /// Key used to detect two source pages that translate to the same question.
    pub fn question_key(&self) -> String {
        crate::utils::normalize_question(&self.question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_record_serialization() {
        let record = QuestionRecord {
            url: "https://example.com/q/1".to_string(),
            question_en: "Name a pet".to_string(),
            variants_en: vec![VariantRecord::new("Dog", 40), VariantRecord::new("Cat", 25)],
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["url"], "https://example.com/q/1");
        assert_eq!(json["question_en"], "Name a pet");
        assert_eq!(json["variants_en"][0]["variant"], "Dog");
        assert_eq!(json["variants_en"][0]["points"], 40);
        assert_eq!(json["variants_en"][1]["points"], 25);
    }

    #[test]
    fn test_question_record_deserialization() {
        let json = r#"{
            "url": "https://example.com/q/2",
            "question_en": "Name a fruit",
            "variants_en": [{"variant": "Apple", "points": 3}]
        }"#;

        let record: QuestionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.variants_en, vec![VariantRecord::new("Apple", 3)]);
    }

    #[test]
    fn test_negative_points_are_rejected() {
        let json = r#"{"variant": "Apple", "points": -1}"#;
        assert!(serde_json::from_str::<VariantRecord>(json).is_err());
    }

    #[test]
    fn test_translated_record_layout() {
        let record = TranslatedRecord {
            url: "https://example.com/q/1".to_string(),
            question_en: "Name a pet".to_string(),
            question: "Назовите домашнее животное".to_string(),
            variants: vec![TranslatedVariant {
                variant: "Собака".to_string(),
                points: 40,
            }],
        };

        let json = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert!(keys.contains(&"question"));
        assert!(keys.contains(&"variants"));
        assert_eq!(json["variants"][0]["points"], 40);
    }

    #[test]
    fn test_question_key_is_normalized() {
        let record = TranslatedRecord {
            url: "u".to_string(),
            question_en: "q".to_string(),
            question: "  Назовите ФРУКТ ".to_string(),
            variants: vec![],
        };
        assert_eq!(record.question_key(), "назовите фрукт");
    }
}
