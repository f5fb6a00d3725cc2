//! ROUGE-L: longest-common-subsequence overlap between two token sequences.

use super::stem::stem;

/// Tokens shorter than this are never stemmed.
const MIN_STEM_LEN: usize = 4;

/// Lowercase `text` and split it into runs of ASCII letters and digits.
///
/// Everything else, including non-ASCII characters, separates tokens.
pub fn tokenize(text: &str, use_stemmer: bool) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|token| !token.is_empty())
        .map(|token| {
            if use_stemmer && token.len() >= MIN_STEM_LEN {
                stem(token)
            } else {
                token.to_owned()
            }
        })
        .collect()
}

/// Length of the longest common subsequence of `a` and `b`.
fn lcs_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// ROUGE-L F-measure of one prediction against its reference, in `[0, 1]`.
///
/// Either side tokenizing to nothing scores 0.
pub fn rouge_l(reference: &str, prediction: &str, use_stemmer: bool) -> f64 {
    let target = tokenize(reference, use_stemmer);
    let output = tokenize(prediction, use_stemmer);
    if target.is_empty() || output.is_empty() {
        return 0.0;
    }

    let lcs = lcs_len(&target, &output) as f64;
    let precision = lcs / output.len() as f64;
    let recall = lcs / target.len() as f64;
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        assert_eq!(tokenize("This is a TEST.", false), ["this", "is", "a", "test"]);
        assert_eq!(tokenize("e-mail, 2nd try!", false), ["e", "mail", "2nd", "try"]);
        assert!(tokenize("  ...  ", false).is_empty());
    }

    #[test]
    fn tokenize_stems_long_tokens_only() {
        assert_eq!(tokenize("running dogs ran", true), ["run", "dog", "ran"]);
        assert_eq!(tokenize("was", true), ["was"]);
    }

    #[test]
    fn lcs_is_order_sensitive() {
        assert_eq!(lcs_len(&["a", "b", "c", "d"], &["a", "c", "d"]), 3);
        assert_eq!(lcs_len(&["a", "b"], &["b", "a"]), 1);
        assert_eq!(lcs_len::<&str>(&[], &["a"]), 0);
    }

    #[test]
    fn identical_text_scores_one() {
        assert_eq!(rouge_l("A third test example", "a third TEST example", true), 1.0);
    }

    #[test]
    fn partial_overlap_is_f_measure() {
        // lcs 3, precision 3/4, recall 3/3
        let score = rouge_l("A third test", "A third test example", true);
        assert!((score - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(rouge_l("", "something", true), 0.0);
        assert_eq!(rouge_l("something", "", true), 0.0);
        assert_eq!(rouge_l("no", "overlap", true), 0.0);
    }

    #[test]
    fn stemming_matches_inflections() {
        assert_eq!(rouge_l("the cats", "the cat", true), 1.0);
        assert!(rouge_l("the cats", "the cat", false) < 1.0);
    }
}
