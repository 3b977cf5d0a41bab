//! Common test utilities for prediction-bias integration tests.
#![allow(dead_code)]

use ndarray::Array2;
use prediction_bias::*;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Label vocabulary of the synthetic corpus, most frequent first.
pub const TOPICS: [&str; 8] = ["earn", "acq", "crude", "grain", "trade", "money", "ship", "cocoa"];

/// Relative frequency of each topic; roughly Zipfian like a news corpus.
const TOPIC_WEIGHTS: [u32; 8] = [40, 20, 12, 8, 6, 5, 5, 4];

/// Create a seeded multi-label news-like corpus.
///
/// Every document carries one or two topics. Its text usually mentions a
/// keyword per topic, sometimes a keyword of an unrelated topic, and always
/// a few noise words.
pub fn create_test_corpus(num_samples: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let topic_dist = WeightedIndex::new(TOPIC_WEIGHTS).expect("valid weights");

    (0..num_samples)
        .map(|_| {
            let mut labels = BTreeSet::new();
            labels.insert(TOPICS[topic_dist.sample(&mut rng)]);
            if rng.gen_bool(0.2) {
                labels.insert(TOPICS[topic_dist.sample(&mut rng)]);
            }

            let mut words: Vec<String> = Vec::new();
            for topic in &labels {
                if rng.gen_bool(0.9) {
                    words.push(format!("kw_{}", topic));
                }
            }
            if rng.gen_bool(0.1) {
                words.push(format!("kw_{}", TOPICS[rng.gen_range(0..TOPICS.len())]));
            }
            for _ in 0..3 {
                words.push(format!("w{}", rng.gen_range(0..40)));
            }
            words.shuffle(&mut rng);

            Sample::new(words.join(" "), labels)
        })
        .collect()
}

/// Build samples from `(text, labels)` pairs.
pub fn samples(entries: &[(&str, &[&str])]) -> Vec<Sample> {
    entries
        .iter()
        .map(|(text, labels)| Sample::new(*text, labels.iter().copied()))
        .collect()
}

/// Build a label set from names.
pub fn label_set(labels: &[&str]) -> LabelSet {
    labels.iter().map(|l| l.to_string()).collect()
}

/// Token statistics learned by [`KeywordVotingClassifier`].
#[derive(Debug, Clone)]
pub struct KeywordModel {
    vocabulary: Vec<Label>,
    token_documents: HashMap<String, usize>,
    token_label_documents: HashMap<String, Vec<usize>>,
}

/// Scores each label by the strongest vote of a document token, where a
/// token votes `P(label | token)` as seen in the training documents.
#[derive(Debug, Clone, Default)]
pub struct KeywordVotingClassifier {
    /// Number of times `train` was called on this instance
    pub trainings: usize,
}

impl Classifier for KeywordVotingClassifier {
    type Model = KeywordModel;

    fn train(&mut self, samples: &[Sample]) -> Result<Self::Model> {
        self.trainings += 1;
        let vocabulary: Vec<Label> = occurrences(samples.iter().map(|s| s.labels()))
            .into_keys()
            .collect();
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut token_documents = HashMap::new();
        let mut token_label_documents: HashMap<String, Vec<usize>> = HashMap::new();
        for sample in samples {
            let tokens: BTreeSet<&str> = sample.text().split_whitespace().collect();
            for token in tokens {
                *token_documents.entry(token.to_string()).or_insert(0) += 1;
                let counts = token_label_documents
                    .entry(token.to_string())
                    .or_insert_with(|| vec![0; vocabulary.len()]);
                for label in sample.labels() {
                    counts[index[label.as_str()]] += 1;
                }
            }
        }

        Ok(KeywordModel {
            vocabulary,
            token_documents,
            token_label_documents,
        })
    }

    fn vocabulary<'m>(&self, model: &'m Self::Model) -> &'m [Label] {
        &model.vocabulary
    }

    fn predict_scores(&self, model: &Self::Model, samples: &[Sample]) -> Result<Array2<Score>> {
        let mut scores = Array2::zeros((samples.len(), model.vocabulary.len()));
        for (i, sample) in samples.iter().enumerate() {
            for token in sample.text().split_whitespace() {
                let (Some(&total), Some(counts)) = (
                    model.token_documents.get(token),
                    model.token_label_documents.get(token),
                ) else {
                    continue;
                };
                for (j, &count) in counts.iter().enumerate() {
                    let vote = count as f64 / total as f64;
                    if vote > scores[[i, j]] {
                        scores[[i, j]] = vote;
                    }
                }
            }
        }
        Ok(scores)
    }
}

/// Classifier that always fails to train.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    type Model = Vec<Label>;

    fn train(&mut self, _samples: &[Sample]) -> Result<Self::Model> {
        Err(PredictionBiasError::classifier("training diverged"))
    }

    fn vocabulary<'m>(&self, model: &'m Self::Model) -> &'m [Label] {
        model
    }

    fn predict_scores(&self, _model: &Self::Model, samples: &[Sample]) -> Result<Array2<Score>> {
        Ok(Array2::zeros((samples.len(), 0)))
    }
}

/// Compare two records treating NaN as equal to NaN.
pub fn assert_records_eq(left: &MetricsRecord, right: &MetricsRecord) {
    for key in MetricKey::ALL {
        let (a, b) = (left.get(key), right.get(key));
        assert!(
            (a.is_nan() && b.is_nan()) || a == b,
            "{} differs: {} vs {}",
            key,
            a,
            b
        );
    }
}
