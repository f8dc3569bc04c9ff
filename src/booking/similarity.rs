//! String similarity on a 0..=100 scale

use strsim::normalized_levenshtein;

/// Similarity between a catalog key and a phrase heard on the call
pub trait Scorer: Send + Sync {
    fn score(&self, candidate: &str, phrase: &str) -> u8;
}

fn to_percent(similarity: f64) -> u8 {
    (similarity * 100.0).floor().clamp(0.0, 100.0) as u8
}

/// Whole-string edit-distance similarity
#[derive(Debug, Clone, Copy, Default)]
pub struct Ratio;

impl Scorer for Ratio {
    fn score(&self, candidate: &str, phrase: &str) -> u8 {
        to_percent(normalized_levenshtein(candidate, phrase))
    }
}

/// Best alignment of the shorter string against every same-length window
/// of the longer one, so "tata ac" scores high against "tata ace".
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

impl Scorer for PartialRatio {
    fn score(&self, candidate: &str, phrase: &str) -> u8 {
        let a: Vec<char> = candidate.chars().collect();
        let b: Vec<char> = phrase.chars().collect();
        let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

        if short.is_empty() {
            return if long.is_empty() { 100 } else { 0 };
        }

        let short: String = short.into_iter().collect();
        let best = long
            .windows(short.chars().count())
            .map(|window| {
                let window: String = window.iter().collect();
                normalized_levenshtein(&short, &window)
            })
            .fold(0.0_f64, f64::max);

        to_percent(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(Ratio.score("dost", "dost"), 100);
        assert_eq!(Ratio.score("abcd", "wxyz"), 0);
    }

    #[test]
    fn test_ratio_misheard_vehicle() {
        // two edits over eight characters
        assert_eq!(Ratio.score("tata ace", "tata ic"), 75);
    }

    #[test]
    fn test_partial_ratio_substring_is_full_score() {
        assert_eq!(PartialRatio.score("tata ace", "tata ac"), 100);
        assert_eq!(PartialRatio.score("tata ac", "tata ace"), 100);
    }

    #[test]
    fn test_partial_ratio_single_substitution() {
        assert_eq!(PartialRatio.score("tata ace", "tata ic"), 85);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(PartialRatio.score("", ""), 100);
        assert_eq!(PartialRatio.score("", "dost"), 0);
    }
}
