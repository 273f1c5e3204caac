// Classifier - nearest-reference condition classification
//
// This module turns similarity scores against the reference corpus into a
// probability distribution over condition labels:
//
// 1. Score the query against every reference sample (best fingerprint each)
// 2. Stable sort by similarity, keep the top K matches
// 3. Per label: aggregate = sum(similarity) * count over the top K
// 4. Normalize aggregates to percentages (even split if every aggregate is 0)
// 5. Bucket each label's average similarity into low / medium / high
//
// The dominant condition is the highest probability, ties broken by higher
// average similarity, then by first appearance among the top matches.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::analysis::clock::{Clock, SystemClock};
use crate::analysis::cough_gate::CoughDecision;
use crate::analysis::features::AcousticDescriptor;
use crate::analysis::similarity::{SimilarityResult, SimilarityScorer};
use crate::config::{ClassifierConfig, SimilarityConfig};
use crate::corpus::ReferenceCorpus;
use crate::error::AnalysisError;

/// Dominant condition reported when the cough gate rejects the input
pub const NO_COUGH_LABEL: &str = "No cough detected";

/// Confidence bucket derived from average similarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Bucket a similarity: `> high` → High, `> medium` → Medium, else Low
    pub fn from_similarity(similarity: f32, config: &ClassifierConfig) -> Self {
        if similarity > config.high_confidence {
            Confidence::High
        } else if similarity > config.medium_confidence {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Probability of one condition label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionProbability {
    pub name: String,
    /// Percentage (0.0 to 100.0)
    pub probability: f32,
    pub confidence: Confidence,
    /// Mean similarity of this label's samples among the top matches
    pub average_similarity: f32,
}

/// Outcome of classifying one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Conditions by descending probability
    pub conditions: Vec<ConditionProbability>,
    pub dominant_condition: String,
    pub confidence: Confidence,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Reference matches the probabilities were computed from
    pub top_matches: Vec<SimilarityResult>,
    /// Cough gate outcome, when the gate ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cough_detection: Option<CoughDecision>,
}

impl ClassificationResult {
    /// Condition entry by label
    pub fn condition(&self, name: &str) -> Option<&ConditionProbability> {
        self.conditions.iter().find(|c| c.name == name)
    }

    /// Sum of all condition probabilities
    pub fn total_probability(&self) -> f32 {
        self.conditions.iter().map(|c| c.probability).sum()
    }
}

/// Per-label aggregation over the top matches
struct LabelAggregate<'a> {
    label: &'a str,
    similarity_sum: f32,
    count: usize,
}

impl LabelAggregate<'_> {
    fn score(&self) -> f32 {
        self.similarity_sum * self.count as f32
    }

    fn average(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.similarity_sum / self.count as f32
        }
    }
}

/// Classifier over a shared reference corpus
///
/// Holds no mutable state; one instance can serve many threads.
pub struct Classifier {
    scorer: SimilarityScorer,
    config: ClassifierConfig,
    clock: Arc<dyn Clock>,
}

impl Classifier {
    /// Create a classifier stamping results with the system clock
    ///
    /// # Arguments
    /// * `similarity` - Component weights and scales for the scorer
    /// * `config` - Top-K and confidence thresholds
    pub fn new(similarity: SimilarityConfig, config: ClassifierConfig) -> Self {
        Self {
            scorer: SimilarityScorer::new(similarity),
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a query descriptor against the corpus
    ///
    /// # Returns
    /// ClassificationResult whose probabilities sum to 100, or
    /// `AnalysisError::ModelNotLoaded` when the corpus is empty
    pub fn classify(
        &self,
        query: &AcousticDescriptor,
        corpus: &ReferenceCorpus,
    ) -> Result<ClassificationResult, AnalysisError> {
        if corpus.is_empty() {
            return Err(AnalysisError::ModelNotLoaded);
        }

        let mut matches = self.scorer.score_all(query, corpus);
        // sort_by is stable: equal similarities keep corpus order
        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        matches.truncate(self.config.top_k.max(1));

        let mut aggregates: Vec<LabelAggregate> = Vec::new();
        for m in &matches {
            match aggregates.iter_mut().find(|a| a.label == m.label) {
                Some(aggregate) => {
                    aggregate.similarity_sum += m.similarity;
                    aggregate.count += 1;
                }
                None => aggregates.push(LabelAggregate {
                    label: &m.label,
                    similarity_sum: m.similarity,
                    count: 1,
                }),
            }
        }

        let total: f32 = aggregates.iter().map(LabelAggregate::score).sum();
        let mut conditions: Vec<ConditionProbability> = aggregates
            .iter()
            .map(|aggregate| {
                let probability = if total > f32::EPSILON {
                    aggregate.score() / total * 100.0
                } else {
                    100.0 / aggregates.len() as f32
                };
                ConditionProbability {
                    name: aggregate.label.to_string(),
                    probability,
                    confidence: Confidence::from_similarity(aggregate.average(), &self.config),
                    average_similarity: aggregate.average(),
                }
            })
            .collect();

        // Stable: full ties keep first-appearance order
        conditions.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.average_similarity
                        .partial_cmp(&a.average_similarity)
                        .unwrap_or(Ordering::Equal)
                })
        });

        let mean_similarity =
            matches.iter().map(|m| m.similarity).sum::<f32>() / matches.len() as f32;
        let dominant_condition = conditions
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_default();

        Ok(ClassificationResult {
            conditions,
            dominant_condition,
            confidence: Confidence::from_similarity(mean_similarity, &self.config),
            timestamp: self.clock.now_ms(),
            top_matches: matches,
            cough_detection: None,
        })
    }

    /// Fixed result for input the cough gate rejected
    ///
    /// Every corpus label gets `fallback_probability` percent with low
    /// confidence; the dominant condition is [`NO_COUGH_LABEL`].
    pub fn no_cough_result(
        &self,
        corpus: &ReferenceCorpus,
        fallback_probability: f32,
        decision: CoughDecision,
    ) -> ClassificationResult {
        let conditions = corpus
            .labels()
            .into_iter()
            .map(|label| ConditionProbability {
                name: label.to_string(),
                probability: fallback_probability,
                confidence: Confidence::Low,
                average_similarity: 0.0,
            })
            .collect();

        ClassificationResult {
            conditions,
            dominant_condition: NO_COUGH_LABEL.to_string(),
            confidence: Confidence::Low,
            timestamp: self.clock.now_ms(),
            top_matches: Vec::new(),
            cough_detection: Some(decision),
        }
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
