// Token estimation strategies
// Author: kelexine (https://github.com/kelexine)

use tracing::warn;

/// Estimates the token count of a text fragment.
///
/// Returning `None` means the fragment could not be estimated (for example
/// undecodable bytes). Callers count such fragments as zero tokens.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, fragment: &[u8]) -> Option<u64>;
}

/// Characters-to-tokens heuristic: 1 token ≈ 4 characters, rounded up.
///
/// An approximation for cost estimation only, not a billing-accurate tokenizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharHeuristic;

impl TokenEstimator for CharHeuristic {
    fn estimate(&self, fragment: &[u8]) -> Option<u64> {
        let text = std::str::from_utf8(fragment).ok()?;
        Some((text.chars().count() as u64).div_ceil(4))
    }
}

impl<F> TokenEstimator for F
where
    F: Fn(&[u8]) -> Option<u64> + Send + Sync,
{
    fn estimate(&self, fragment: &[u8]) -> Option<u64> {
        self(fragment)
    }
}

/// Sum estimates over fragments, counting unestimable fragments as zero
pub fn estimate_fragments(estimator: &dyn TokenEstimator, fragments: &[&[u8]]) -> u64 {
    fragments
        .iter()
        .enumerate()
        .map(|(index, fragment)| {
            estimator.estimate(fragment).unwrap_or_else(|| {
                warn!(
                    "Token estimation failed for fragment {} ({} bytes), counting as 0",
                    index,
                    fragment.len()
                );
                0
            })
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_heuristic_rounds_up() {
        let estimator = CharHeuristic;
        assert_eq!(estimator.estimate(b""), Some(0));
        assert_eq!(estimator.estimate(b"a"), Some(1));
        assert_eq!(estimator.estimate(b"abcd"), Some(1));
        assert_eq!(estimator.estimate(b"abcde"), Some(2));
    }

    #[test]
    fn test_char_heuristic_counts_characters_not_bytes() {
        // four 3-byte characters
        assert_eq!(CharHeuristic.estimate("日本語文".as_bytes()), Some(1));
    }

    #[test]
    fn test_undecodable_fragment_contributes_zero() {
        let fragments: [&[u8]; 2] = [&[0xff, 0xfe, 0xfd], b"abcdefgh"];
        assert_eq!(estimate_fragments(&CharHeuristic, &fragments), 2);
    }

    #[test]
    fn test_closure_estimator() {
        let by_bytes = |fragment: &[u8]| Some(fragment.len() as u64);
        let fragments: [&[u8]; 2] = [b"abc", b"de"];
        assert_eq!(estimate_fragments(&by_bytes, &fragments), 5);
    }
}
