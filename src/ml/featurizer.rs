//! TF-IDF n-gram featurizer.
//!
//! Fitting freezes four things: the label key assignment, the token
//! vocabulary, the selected n-gram table and the IDF weights. The fitted
//! featurizer only ever reads them, so transforming test or serving text can
//! never leak back into the vocabulary.
//!
//! The analysis chain is rebuilt from the configuration when a fitted
//! featurizer is deserialized; it is not part of the persisted state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::PipelineAnalyzer;
use crate::analysis::char_filter::PatternReplaceCharFilter;
use crate::analysis::token_filter::{LowercaseFilter, StopFilter};
use crate::analysis::tokenizer::UnicodeWordTokenizer;
use crate::data::record::CleanedRecord;
use crate::error::{MentalisError, Result};
use crate::ml::label::LabelSpace;
use crate::ml::sparse::SparseVector;

const PUNCTUATION_PATTERN: &str = r"[\p{P}\p{S}]";

/// Featurizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturizerConfig {
    /// Longest n-gram extracted.
    pub ngram_length: usize,
    /// Emit every length in `1..=ngram_length` instead of only `ngram_length`.
    pub use_all_lengths: bool,
    /// Cap on the number of n-grams kept, most frequent first.
    pub maximum_ngrams_count: usize,
    /// Drop English stop words before building n-grams.
    pub remove_stop_words: bool,
    /// Scale each row to unit L2 norm.
    pub normalize: bool,
}

impl Default for FeaturizerConfig {
    fn default() -> Self {
        FeaturizerConfig {
            ngram_length: 2,
            use_all_lengths: true,
            maximum_ngrams_count: 10_000,
            remove_stop_words: true,
            normalize: true,
        }
    }
}

impl FeaturizerConfig {
    fn lengths(&self) -> std::ops::RangeInclusive<usize> {
        if self.use_all_lengths {
            1..=self.ngram_length
        } else {
            self.ngram_length..=self.ngram_length
        }
    }
}

/// Build the token analysis chain used by the featurizer.
///
/// Punctuation is deleted the way the dataset cleaner deletes it, so raw
/// serving text and cleaned training text produce the same tokens. Text is
/// then split on Unicode word boundaries, lowercased and optionally stripped
/// of stop words. Digits are kept.
pub fn statement_analyzer(remove_stop_words: bool) -> Result<PipelineAnalyzer> {
    let mut analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
        .add_char_filter(Arc::new(PatternReplaceCharFilter::remove(
            PUNCTUATION_PATTERN,
        )?))
        .add_filter(Arc::new(LowercaseFilter::new()));

    if remove_stop_words {
        analyzer = analyzer.add_filter(Arc::new(StopFilter::new()));
    }

    Ok(analyzer.with_name("statement"))
}

/// Unfitted featurizer.
#[derive(Debug, Clone, Default)]
pub struct Featurizer {
    config: FeaturizerConfig,
}

#[derive(Debug)]
struct NgramStats {
    first_seen: usize,
    count: u64,
    document_frequency: u64,
}

impl Featurizer {
    pub fn new(config: FeaturizerConfig) -> Self {
        Featurizer { config }
    }

    pub fn config(&self) -> &FeaturizerConfig {
        &self.config
    }

    /// Fit on training records.
    pub fn fit(&self, records: &[CleanedRecord]) -> Result<FittedFeaturizer> {
        if records.is_empty() {
            return Err(MentalisError::data("cannot fit featurizer on an empty training set"));
        }
        if self.config.ngram_length == 0 {
            return Err(MentalisError::invalid_config("ngram_length must be at least 1"));
        }
        if self.config.maximum_ngrams_count == 0 {
            return Err(MentalisError::invalid_config(
                "maximum_ngrams_count must be at least 1",
            ));
        }

        let labels = LabelSpace::fit(records.iter().map(|r| r.label.as_str()))?;
        let analyzer = statement_analyzer(self.config.remove_stop_words)?;

        let mut token_keys: HashMap<String, u32> = HashMap::new();
        let mut tokens: Vec<String> = Vec::new();
        let mut stats: HashMap<Vec<u32>, NgramStats> = HashMap::new();

        for record in records {
            let keys: Vec<u32> = analyzer
                .token_texts(&record.statement)?
                .into_iter()
                .map(|text| {
                    *token_keys.entry(text.clone()).or_insert_with(|| {
                        tokens.push(text);
                        (tokens.len() - 1) as u32
                    })
                })
                .collect();

            let mut in_document: HashSet<&[u32]> = HashSet::new();
            for n in self.config.lengths() {
                for gram in keys.windows(n) {
                    let seen = stats.len();
                    let entry = stats.entry(gram.to_vec()).or_insert(NgramStats {
                        first_seen: seen,
                        count: 0,
                        document_frequency: 0,
                    });
                    entry.count += 1;
                    if in_document.insert(gram) {
                        entry.document_frequency += 1;
                    }
                }
            }
        }

        let mut ranked: Vec<(Vec<u32>, NgramStats)> = stats.into_iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        ranked.truncate(self.config.maximum_ngrams_count);
        ranked.sort_by_key(|(_, s)| s.first_seen);

        let documents = records.len() as f64;
        let idf: Vec<f64> = ranked
            .iter()
            .map(|(_, s)| ((documents + 1.0) / (s.document_frequency as f64 + 1.0)).ln() + 1.0)
            .collect();
        let ngrams: Vec<Vec<u32>> = ranked.into_iter().map(|(gram, _)| gram).collect();

        debug!(
            "Featurizer fit: {} documents, {} labels, {} tokens, {} n-grams",
            records.len(),
            labels.len(),
            tokens.len(),
            ngrams.len()
        );

        FittedFeaturizer::from_state(FeaturizerState {
            config: self.config.clone(),
            labels,
            tokens,
            ngrams,
            idf,
        })
    }
}

/// Persisted form of a fitted featurizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturizerState {
    config: FeaturizerConfig,
    labels: LabelSpace,
    /// Token vocabulary in key order.
    tokens: Vec<String>,
    /// Selected n-grams in feature order, as token keys.
    ngrams: Vec<Vec<u32>>,
    idf: Vec<f64>,
}

/// Training rows ready for a trainer.
#[derive(Debug, Clone)]
pub struct LabeledFeatures {
    pub rows: Vec<SparseVector>,
    pub labels: Vec<u32>,
    pub dimension: usize,
    pub num_classes: usize,
}

impl LabeledFeatures {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A featurizer with frozen vocabulary and weights.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "FeaturizerState", into = "FeaturizerState")]
pub struct FittedFeaturizer {
    state: FeaturizerState,
    token_keys: HashMap<String, u32>,
    ngram_index: HashMap<Vec<u32>, u32>,
    analyzer: PipelineAnalyzer,
}

impl std::fmt::Debug for FittedFeaturizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FittedFeaturizer")
            .field("labels", &self.state.labels.labels())
            .field("vocabulary_size", &self.state.tokens.len())
            .field("dimension", &self.dimension())
            .field("analyzer", &self.analyzer)
            .finish()
    }
}

impl FittedFeaturizer {
    fn from_state(state: FeaturizerState) -> Result<Self> {
        if state.ngrams.len() != state.idf.len() {
            return Err(MentalisError::model_load(format!(
                "featurizer has {} n-grams but {} IDF weights",
                state.ngrams.len(),
                state.idf.len()
            )));
        }
        if state.labels.is_empty() {
            return Err(MentalisError::model_load("featurizer has no labels"));
        }
        let vocabulary = state.tokens.len() as u32;
        if state.ngrams.iter().flatten().any(|&key| key >= vocabulary) {
            return Err(MentalisError::model_load(
                "featurizer n-gram refers to an unknown token",
            ));
        }

        let token_keys = state
            .tokens
            .iter()
            .enumerate()
            .map(|(key, token)| (token.clone(), key as u32))
            .collect();
        let ngram_index = state
            .ngrams
            .iter()
            .enumerate()
            .map(|(index, gram)| (gram.clone(), index as u32))
            .collect();
        let analyzer = statement_analyzer(state.config.remove_stop_words)?;

        Ok(FittedFeaturizer {
            state,
            token_keys,
            ngram_index,
            analyzer,
        })
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.state.labels
    }

    pub fn config(&self) -> &FeaturizerConfig {
        &self.state.config
    }

    /// Width of the feature vectors.
    pub fn dimension(&self) -> usize {
        self.state.ngrams.len()
    }

    /// Human-readable text of feature `index`, tokens joined by a space.
    pub fn feature_name(&self, index: usize) -> Option<String> {
        self.state.ngrams.get(index).map(|gram| {
            gram.iter()
                .map(|&key| self.state.tokens[key as usize].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    /// Transform one statement into a TF-IDF vector.
    ///
    /// Tokens unseen at fit time break n-grams rather than being skipped over,
    /// so an n-gram containing one contributes nothing.
    pub fn transform(&self, statement: &str) -> Result<SparseVector> {
        let keys: Vec<Option<u32>> = self
            .analyzer
            .token_texts(statement)?
            .iter()
            .map(|text| self.token_keys.get(text).copied())
            .collect();

        let mut pairs: Vec<(u32, f64)> = Vec::new();
        let mut gram: Vec<u32> = Vec::with_capacity(self.state.config.ngram_length);
        for n in self.state.config.lengths() {
            'window: for window in keys.windows(n) {
                gram.clear();
                for key in window {
                    match key {
                        Some(key) => gram.push(*key),
                        None => continue 'window,
                    }
                }
                if let Some(&index) = self.ngram_index.get(&gram) {
                    pairs.push((index, 1.0));
                }
            }
        }

        let mut vector = SparseVector::from_pairs(self.dimension(), pairs);
        let weighted = vector
            .iter()
            .map(|(i, tf)| (i as u32, tf * self.state.idf[i]))
            .collect();
        vector = SparseVector::from_pairs(self.dimension(), weighted);
        if self.state.config.normalize {
            vector.normalize_l2();
        }
        Ok(vector)
    }

    /// Transform labelled records for training.
    ///
    /// Every label must belong to the fitted label space.
    pub fn featurize(&self, records: &[CleanedRecord]) -> Result<LabeledFeatures> {
        let mut rows = Vec::with_capacity(records.len());
        let mut labels = Vec::with_capacity(records.len());
        for record in records {
            let key = self.state.labels.label_to_key(&record.label).ok_or_else(|| {
                MentalisError::data(format!(
                    "label '{}' of record {} was not seen at fit time",
                    record.label, record.id
                ))
            })?;
            rows.push(self.transform(&record.statement)?);
            labels.push(key);
        }

        Ok(LabeledFeatures {
            rows,
            labels,
            dimension: self.dimension(),
            num_classes: self.state.labels.len(),
        })
    }
}

impl TryFrom<FeaturizerState> for FittedFeaturizer {
    type Error = MentalisError;

    fn try_from(state: FeaturizerState) -> Result<Self> {
        FittedFeaturizer::from_state(state)
    }
}

impl From<FittedFeaturizer> for FeaturizerState {
    fn from(featurizer: FittedFeaturizer) -> Self {
        featurizer.state
    }
}
