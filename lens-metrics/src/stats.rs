//! Numeric helpers shared by the metric families.
//!
//! Every function returns `None` when the statistic is undefined for its
//! input (empty slices, zero variance, a missing class) instead of NaN.

use std::cmp::Ordering;

/// Arithmetic mean.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean squared difference between two parallel slices.
pub(crate) fn mean_squared_error(targets: &[f64], predictions: &[f64]) -> Option<f64> {
    if targets.is_empty() || targets.len() != predictions.len() {
        return None;
    }
    let total: f64 = targets
        .iter()
        .zip(predictions)
        .map(|(t, p)| (p - t).powi(2))
        .sum();
    Some(total / targets.len() as f64)
}

/// Pearson product-moment correlation.
///
/// Undefined when either input has zero variance.
pub(crate) fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    // Rounding can push a perfect correlation a hair past 1.
    Some(r.clamp(-1.0, 1.0))
}

/// Ranks starting at 1, with tied values sharing their average rank.
pub(crate) fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end (0-based) hold ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Spearman rank correlation: Pearson over average ranks.
pub(crate) fn spearman(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() {
        return None;
    }
    pearson(&average_ranks(xs), &average_ranks(ys))
}

/// Index of the largest value; ties go to the lowest index.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, top)) if value <= top => {}
            _ if value.is_nan() => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Jensen-Shannon divergence in nats, bounded by ln 2.
///
/// Both inputs are normalised to sum to one first. Undefined for vectors of
/// different lengths or with a non-positive total.
pub(crate) fn jensen_shannon(p: &[f64], q: &[f64]) -> Option<f64> {
    if p.len() != q.len() || p.is_empty() {
        return None;
    }
    let p = normalize(p)?;
    let q = normalize(q)?;

    let mut divergence = 0.0;
    for (pi, qi) in p.iter().zip(&q) {
        let mi = 0.5 * (pi + qi);
        divergence += 0.5 * relative_entropy_term(*pi, mi);
        divergence += 0.5 * relative_entropy_term(*qi, mi);
    }
    Some(divergence.max(0.0))
}

fn relative_entropy_term(x: f64, m: f64) -> f64 {
    if x > 0.0 && m > 0.0 {
        x * (x / m).ln()
    } else {
        0.0
    }
}

fn normalize(values: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = values.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some(values.iter().map(|v| v / total).collect())
}

/// Area under the ROC curve for binary targets.
///
/// Computed as the Mann-Whitney statistic, counting tied scores as half a
/// correct ordering. Needs at least one positive and one negative.
pub(crate) fn roc_auc(is_positive: &[bool], scores: &[f64]) -> Option<f64> {
    if is_positive.len() != scores.len() {
        return None;
    }
    let positives = is_positive.iter().filter(|&&p| p).count();
    let negatives = is_positive.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let ranks = average_ranks(scores);
    let positive_rank_sum: f64 = ranks
        .iter()
        .zip(is_positive)
        .filter(|(_, p)| **p)
        .map(|(r, _)| r)
        .sum();
    let pos = positives as f64;
    let neg = negatives as f64;
    Some((positive_rank_sum - pos * (pos + 1.0) / 2.0) / (pos * neg))
}

/// Average precision: the step-wise area under the precision-recall curve.
///
/// Examples sharing a score form a single threshold. Needs at least one
/// positive.
pub(crate) fn average_precision(is_positive: &[bool], scores: &[f64]) -> Option<f64> {
    if is_positive.len() != scores.len() {
        return None;
    }
    let positives = is_positive.iter().filter(|&&p| p).count();
    if positives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut true_pos = 0usize;
    let mut seen = 0usize;
    let mut prev_recall = 0.0;
    let mut area = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        true_pos += order[start..end]
            .iter()
            .filter(|&&idx| is_positive[idx])
            .count();
        seen += end - start;

        let recall = true_pos as f64 / positives as f64;
        let precision = true_pos as f64 / seen as f64;
        area += (recall - prev_recall) * precision;
        prev_recall = recall;
        start = end;
    }
    Some(area)
}
