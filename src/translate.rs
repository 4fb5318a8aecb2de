//! Incremental translation of the extracted questions.
//!
//! Records are translated one at a time, in input order. A record whose
//! URL is already in the previous output is carried forward untouched. A
//! freshly translated question that matches (case-insensitively) one
//! already in the output is treated as a duplicate from another page and
//! dropped. After every newly translated record the complete output list
//! is written out, so an interrupted run loses at most the record in
//! flight.

use crate::api::{Translate, TranslateError};
use crate::config::{RECORD_DELAY, SOURCE_LANG, TARGET_LANG, VARIANT_DELAY};
use crate::models::{QuestionRecord, TranslatedRecord, TranslatedVariant};
use crate::outputs::json::{LoadError, SnapshotWriter, load_snapshot};
use crate::utils::normalize_question;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Languages and pacing for a translation run.
#[derive(Debug, Clone)]
pub struct TranslationSettings {
    pub source_lang: String,
    pub target_lang: String,
    /// Pause after each variant translation.
    pub variant_delay: Duration,
    /// Pause after each completed record.
    pub record_delay: Duration,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            source_lang: SOURCE_LANG.to_string(),
            target_lang: TARGET_LANG.to_string(),
            variant_delay: VARIANT_DELAY,
            record_delay: RECORD_DELAY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationSummary {
    /// Records in the input.
    pub total: usize,
    /// Newly translated records.
    pub translated: usize,
    /// Records taken from the previous output.
    pub carried_over: usize,
    /// Records dropped because their translated question already exists.
    pub duplicates: usize,
    /// Records whose translation failed.
    pub failed: usize,
    /// Records in the output after the run.
    pub written: usize,
}

impl TranslationSummary {
    pub fn skipped(&self) -> usize {
        self.carried_over + self.duplicates
    }
}

enum Outcome {
    Translated(TranslatedRecord),
    Duplicate(String),
}

pub struct TranslationStage<T> {
    translator: T,
    settings: TranslationSettings,
}

impl<T: Translate> TranslationStage<T> {
    pub fn new(translator: T, settings: TranslationSettings) -> Self {
        Self {
            translator,
            settings,
        }
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// Translate `source`, reusing entries of `prior`, and keep `writer`'s file up to date.
    #[instrument(level = "info", skip_all, fields(total = source.len(), prior = prior.len()))]
    pub async fn run(
        &self,
        source: &[QuestionRecord],
        prior: Vec<TranslatedRecord>,
        writer: &SnapshotWriter,
    ) -> TranslationSummary {
        let mut questions: HashSet<String> = prior.iter().map(TranslatedRecord::question_key).collect();
        let prior: HashMap<String, TranslatedRecord> =
            prior.into_iter().map(|r| (r.url.clone(), r)).collect();

        let mut results: Vec<TranslatedRecord> = Vec::new();
        let mut summary = TranslationSummary {
            total: source.len(),
            ..Default::default()
        };

        for (i, item) in source.iter().enumerate() {
            let progress = format!("{}/{}", i + 1, source.len());

            if let Some(done) = prior.get(&item.url) {
                info!(%progress, url = %item.url, "Already translated; carrying forward");
                results.push(done.clone());
                summary.carried_over += 1;
                continue;
            }

            info!(%progress, url = %item.url, question = %item.question_en, "Translating");
            match self.translate_record(item, &questions).await {
                Ok(Outcome::Translated(record)) => {
                    questions.insert(record.question_key());
                    results.push(record);
                    summary.translated += 1;

                    match writer.write(&results).await {
                        Ok(()) => info!(%progress, path = %writer.path().display(), "Saved translation"),
                        Err(e) => error!(%progress, error = %e, "Failed to save translations"),
                    }
                    sleep(self.settings.record_delay).await;
                }
                Ok(Outcome::Duplicate(question)) => {
                    warn!(%progress, url = %item.url, %question, "Skipped duplicate translated question");
                    summary.duplicates += 1;
                }
                Err(e) => {
                    error!(%progress, url = %item.url, error = %e, "Failed to translate record");
                    summary.failed += 1;
                }
            }
        }

        summary.written = results.len();
        info!(
            translated = summary.translated,
            skipped = summary.skipped(),
            failed = summary.failed,
            written = summary.written,
            "Translation finished"
        );
        summary
    }

    async fn translate_record(
        &self,
        item: &QuestionRecord,
        questions: &HashSet<String>,
    ) -> Result<Outcome, TranslateError> {
        let (src, dst) = (&self.settings.source_lang, &self.settings.target_lang);

        let question = self.translator.translate(&item.question_en, src, dst).await?;
        if questions.contains(&normalize_question(&question)) {
            return Ok(Outcome::Duplicate(question));
        }
        debug!(en = %item.question_en, translated = %question, "Question translated");

        let mut variants = Vec::with_capacity(item.variants_en.len());
        for (j, variant) in item.variants_en.iter().enumerate() {
            let text = self.translator.translate(&variant.variant, src, dst).await?;
            debug!(
                n = j + 1,
                en = %variant.variant,
                translated = %text,
                points = variant.points,
                "Variant translated"
            );
            variants.push(TranslatedVariant {
                variant: text,
                points: variant.points,
            });
            sleep(self.settings.variant_delay).await;
        }

        Ok(Outcome::Translated(TranslatedRecord {
            url: item.url.clone(),
            question_en: item.question_en.clone(),
            question,
            variants,
        }))
    }
}

/// Load the extracted questions. Every failure here is fatal for the run,
/// including a file that holds no records at all.
pub async fn load_source(path: &Path) -> Result<Vec<QuestionRecord>, Box<dyn Error>> {
    let records = load_snapshot::<QuestionRecord>(path).await?;
    if records.is_empty() {
        return Err(format!("{} contains no records", path.display()).into());
    }
    info!(count = records.len(), path = %path.display(), "Loaded records to translate");
    Ok(records)
}

/// Load a previous translation output. Missing or corrupt files count as empty.
pub async fn load_prior(path: &Path) -> Vec<TranslatedRecord> {
    match load_snapshot::<TranslatedRecord>(path).await {
        Ok(records) => {
            info!(count = records.len(), "Loaded existing translations");
            records
        }
        Err(LoadError::Missing(_)) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable translation output");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VariantRecord;
    use std::cell::RefCell;

    /// Looks words up in a dictionary; unknown text fails with an API error.
    struct Dictionary {
        words: HashMap<&'static str, &'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl Dictionary {
        fn new(words: &[(&'static str, &'static str)]) -> Self {
            Self {
                words: words.iter().copied().collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Translate for Dictionary {
        async fn translate(&self, text: &str, _: &str, _: &str) -> Result<String, TranslateError> {
            self.calls.borrow_mut().push(text.to_string());
            self.words
                .get(text)
                .map(|t| t.to_string())
                .ok_or_else(|| TranslateError::Api {
                    status: 400,
                    message: format!("cannot translate {text}"),
                })
        }
    }

    fn dictionary() -> Dictionary {
        Dictionary::new(&[
            ("Name a pet", "Назовите питомца"),
            ("Name a pet!", "Назовите Питомца "),
            ("Name a fruit", "Назовите фрукт"),
            ("Dog", "Собака"),
            ("Cat", "Кошка"),
            ("Apple", "Яблоко"),
        ])
    }

    fn record(url: &str, question: &str, variants: &[(&str, u32)]) -> QuestionRecord {
        QuestionRecord {
            url: url.to_string(),
            question_en: question.to_string(),
            variants_en: variants
                .iter()
                .map(|(v, p)| VariantRecord::new(*v, *p))
                .collect(),
        }
    }

    fn stage(dict: Dictionary) -> TranslationStage<Dictionary> {
        TranslationStage::new(
            dict,
            TranslationSettings {
                variant_delay: Duration::ZERO,
                record_delay: Duration::ZERO,
                ..Default::default()
            },
        )
    }

    fn read_output(path: &Path) -> Vec<TranslatedRecord> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_translates_question_and_variants() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataRu.json");
        let writer = SnapshotWriter::spawn(&path);
        let source = vec![record("u1", "Name a pet", &[("Dog", 40), ("Cat", 25)])];

        let stage = stage(dictionary());
        let summary = stage.run(&source, Vec::new(), &writer).await;
        assert_eq!(summary.translated, 1);
        assert_eq!(summary.written, 1);

        let out = read_output(&path);
        assert_eq!(out[0].question, "Назовите питомца");
        assert_eq!(out[0].question_en, "Name a pet");
        assert_eq!(
            out[0].variants,
            vec![
                TranslatedVariant { variant: "Собака".into(), points: 40 },
                TranslatedVariant { variant: "Кошка".into(), points: 25 },
            ]
        );
        assert_eq!(*stage.translator().calls.borrow(), vec!["Name a pet", "Dog", "Cat"]);
    }

    #[tokio::test]
    async fn test_same_translated_question_is_kept_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataRu.json");
        let writer = SnapshotWriter::spawn(&path);
        let source = vec![
            record("u1", "Name a pet", &[("Dog", 2)]),
            record("u2", "Name a pet!", &[("Cat", 2)]),
        ];

        let stage = stage(dictionary());
        let summary = stage.run(&source, Vec::new(), &writer).await;
        assert_eq!(summary.translated, 1);
        assert_eq!(summary.duplicates, 1);

        let out = read_output(&path);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "u1");
        // The duplicate's variants are never sent for translation.
        assert!(!stage.translator().calls.borrow().contains(&"Cat".to_string()));
    }

    #[tokio::test]
    async fn test_prior_translations_are_carried_forward() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataRu.json");
        let writer = SnapshotWriter::spawn(&path);
        let prior = vec![TranslatedRecord {
            url: "u1".into(),
            question_en: "Name a pet".into(),
            question: "Старый перевод".into(),
            variants: vec![TranslatedVariant { variant: "Пёс".into(), points: 2 }],
        }];
        let source = vec![
            record("u1", "Name a pet", &[("Dog", 2)]),
            record("u2", "Name a fruit", &[("Apple", 1)]),
        ];

        let stage = stage(dictionary());
        let summary = stage.run(&source, prior.clone(), &writer).await;
        assert_eq!(summary.carried_over, 1);
        assert_eq!(summary.translated, 1);

        let out = read_output(&path);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], prior[0]);
        assert_eq!(out[1].question, "Назовите фрукт");
        assert!(!stage.translator().calls.borrow().contains(&"Name a pet".to_string()));
    }

    #[tokio::test]
    async fn test_prior_questions_block_new_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::spawn(dir.path().join("dataRu.json"));
        let prior = vec![TranslatedRecord {
            url: "old".into(),
            question_en: "Name a pet".into(),
            question: "назовите ПИТОМЦА".into(),
            variants: vec![],
        }];
        let source = vec![record("new", "Name a pet", &[("Dog", 1)])];

        let summary = stage(dictionary()).run(&source, prior, &writer).await;
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.translated, 0);
    }

    #[tokio::test]
    async fn test_failed_record_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataRu.json");
        let writer = SnapshotWriter::spawn(&path);
        let source = vec![
            record("u1", "Name a pet", &[("Dog", 2), ("Unknown", 1)]),
            record("u2", "Name a fruit", &[("Apple", 1)]),
        ];

        let summary = stage(dictionary()).run(&source, Vec::new(), &writer).await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.translated, 1);

        let out = read_output(&path);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "u2");
    }

    #[tokio::test]
    async fn test_load_source_rejects_missing_corrupt_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        assert!(load_source(&path).await.is_err());

        std::fs::write(&path, "not json").unwrap();
        assert!(load_source(&path).await.is_err());

        std::fs::write(&path, "[]").unwrap();
        assert!(load_source(&path).await.is_err());

        let records = vec![record("u1", "Name a pet", &[("Dog", 1)])];
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
        assert_eq!(load_source(&path).await.unwrap(), records);
    }

    #[tokio::test]
    async fn test_load_prior_tolerates_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataRu.json");
        assert!(load_prior(&path).await.is_empty());

        std::fs::write(&path, "[{").unwrap();
        assert!(load_prior(&path).await.is_empty());
    }
}
