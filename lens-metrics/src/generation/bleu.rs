//! Corpus-level BLEU over whitespace tokens.

use std::collections::HashMap;

use crate::config::BleuConfig;
use crate::error::Result;

/// Sufficient statistics for corpus BLEU, accumulated sentence by sentence.
#[derive(Debug, Clone, PartialEq)]
struct BleuStats {
    matches: Vec<usize>,
    totals: Vec<usize>,
    sys_len: usize,
    ref_len: usize,
}

impl BleuStats {
    fn new(max_order: usize) -> Self {
        Self {
            matches: vec![0; max_order],
            totals: vec![0; max_order],
            sys_len: 0,
            ref_len: 0,
        }
    }

    fn add_sentence(&mut self, hypothesis: &str, reference: &str) {
        let hyp: Vec<&str> = hypothesis.split_whitespace().collect();
        let refs: Vec<&str> = reference.split_whitespace().collect();
        self.sys_len += hyp.len();
        self.ref_len += refs.len();

        for (order, (matches, totals)) in self
            .matches
            .iter_mut()
            .zip(self.totals.iter_mut())
            .enumerate()
        {
            let n = order + 1;
            let hyp_counts = ngram_counts(&hyp, n);
            let ref_counts = ngram_counts(&refs, n);
            for (gram, count) in &hyp_counts {
                *totals += count;
                *matches += (*count).min(ref_counts.get(gram).copied().unwrap_or(0));
            }
        }
    }

    /// Combine the statistics into a 0-100 score.
    ///
    /// Orders with no hypothesis n-grams are dropped from the geometric
    /// mean; orders with no matches use `smooth_value / total` instead of
    /// zero.
    fn score(&self, smooth_value: f64) -> f64 {
        if self.sys_len == 0 {
            return 0.0;
        }

        let mut log_sum = 0.0;
        let mut effective_order = 0usize;
        for (&matches, &total) in self.matches.iter().zip(&self.totals) {
            if total == 0 {
                break;
            }
            effective_order += 1;
            let precision = if matches == 0 {
                smooth_value / total as f64
            } else {
                matches as f64 / total as f64
            };
            log_sum += precision.ln();
        }
        if effective_order == 0 {
            return 0.0;
        }

        let brevity_penalty = if self.sys_len < self.ref_len {
            (1.0 - self.ref_len as f64 / self.sys_len as f64).exp()
        } else {
            1.0
        };
        100.0 * brevity_penalty * (log_sum / effective_order as f64).exp()
    }
}

fn ngram_counts<'a>(tokens: &'a [&'a str], n: usize) -> HashMap<&'a [&'a str], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

/// BLEU of `hypotheses` against one reference each.
///
/// Tokens are whitespace-separated and compared exactly. Returns 0 when the
/// hypotheses contain no tokens at all. Fails with [`Error::Config`] when
/// `config` does not pass [`BleuConfig::validate`].
pub fn corpus_bleu(hypotheses: &[&str], references: &[&str], config: &BleuConfig) -> Result<f64> {
    config.validate()?;
    let mut stats = BleuStats::new(config.max_order);
    for (hypothesis, reference) in hypotheses.iter().zip(references) {
        stats.add_sentence(hypothesis, reference);
    }
    Ok(stats.score(config.smooth_value))
}
