// Local Classifier Adapter
// Boundary for the pretrained binary rumor classifier, plus a stylometry-backed
// default implementation for deployments without a model service.

use crate::models::ClassifierOutput;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Local classifier boundary.
///
/// Implementations must not fail for any input within the accepted length cap;
/// the returned probability is the rumor-class probability in [0, 1].
pub trait Classifier: Send + Sync {
    fn predict(&self, text: &str) -> ClassifierOutput;
}

/// Stylometry-based classifier using continuous soft-threshold scoring.
///
/// Rumor-style text tends toward low lexical diversity, heavy token and
/// phrase repetition, and short exclamatory sentences; each signal contributes
/// in logit space so no single metric dominates.
#[derive(Debug, Default)]
pub struct StylometryClassifier;

#[derive(Debug, Default)]
struct StylometryMetrics {
    ttr: f64,
    avg_sentence_len: f64,
    repeat_ratio: f64,
    ngram_repeat_rate: f64,
}

#[inline]
fn sigmoid(x: f64, center: f64, k: f64) -> f64 {
    1.0 / (1.0 + ((x - center) / k).exp())
}

#[inline]
fn sigmoid_inv(x: f64, center: f64, k: f64) -> f64 {
    1.0 - sigmoid(x, center, k)
}

#[inline]
fn from_logit(logit: f64) -> f64 {
    1.0 / (1.0 + (-logit).exp())
}

fn compute_metrics(text: &str) -> StylometryMetrics {
    let word_re = Regex::new(r"[A-Za-z0-9_]+|[\u{4e00}-\u{9fff}]").unwrap();
    let words: Vec<&str> = word_re.find_iter(text).map(|m| m.as_str()).collect();
    let total_words = words.len();

    if total_words == 0 {
        return StylometryMetrics::default();
    }

    // Type-Token Ratio
    let unique_words: HashSet<&str> = words.iter().cloned().collect();
    let ttr = unique_words.len() as f64 / total_words as f64;

    // Average sentence length in chars (CJK-aware terminator set)
    let sentence_re = Regex::new(r"[^。！？.!?]+").unwrap();
    let lens: Vec<usize> = sentence_re
        .find_iter(text)
        .map(|m| m.as_str().trim().chars().count())
        .filter(|l| *l > 0)
        .collect();
    let avg_sentence_len = if lens.is_empty() {
        text.chars().count() as f64
    } else {
        lens.iter().sum::<usize>() as f64 / lens.len() as f64
    };

    // Repeat ratio: fraction of vocab items that occur >= 3 times
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for t in &words {
        *freq.entry(*t).or_insert(0) += 1;
    }
    let repeat_ratio = freq.values().filter(|&&v| v >= 3).count() as f64 / freq.len().max(1) as f64;

    let ngram_repeat_rate = ngram_repeat_rate(&words, 3);

    StylometryMetrics {
        ttr,
        avg_sentence_len,
        repeat_ratio,
        ngram_repeat_rate,
    }
}

fn ngram_repeat_rate(tokens: &[&str], n: usize) -> f64 {
    if n == 0 || tokens.len() < n + 1 {
        return 0.0;
    }
    let mut counts: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut total = 0usize;
    for i in 0..=tokens.len().saturating_sub(n) {
        let key: Vec<&str> = tokens[i..i + n].to_vec();
        *counts.entry(key).or_insert(0) += 1;
        total += 1;
    }
    let repeats = counts.values().filter(|&&c| c >= 2).map(|&c| c - 1).sum::<usize>();
    repeats as f64 / total.max(1) as f64
}

/// Continuous rumor-likeness score from stylometry signals.
fn score_text(text: &str) -> f64 {
    let metrics = compute_metrics(text);

    let ttr = metrics.ttr;
    let rep = metrics.repeat_ratio;
    let ngram = metrics.ngram_repeat_rate;
    let avg_len = metrics.avg_sentence_len;

    // Start in logit space
    let mut logit: f64 = 0.0;

    // Low lexical diversity pushes toward rumor; very high diversity pulls back
    let ttr_low_contrib = sigmoid(ttr, 0.58, 0.08) * 1.0;
    let ttr_high_contrib = sigmoid_inv(ttr, 0.78, 0.06) * (-0.7);
    logit += ttr_low_contrib + ttr_high_contrib;

    // Token repetition contribution
    let rep_contrib = sigmoid_inv(rep, 0.18, 0.06) * 0.8;
    logit += rep_contrib;

    // Phrase (3-gram) repetition contribution
    let ngram_contrib = sigmoid_inv(ngram, 0.10, 0.04) * 0.9;
    logit += ngram_contrib;

    // Sentence length contribution: short exclamatory bursts score higher
    let len_short_contrib = sigmoid(avg_len, 20.0, 8.0) * 0.4;
    logit += len_short_contrib;

    from_logit(logit).clamp(0.02, 0.98)
}

impl Classifier for StylometryClassifier {
    fn predict(&self, text: &str) -> ClassifierOutput {
        let probability = score_text(text);
        ClassifierOutput {
            label: u8::from(probability > 0.5),
            probability,
        }
    }
}
