//! String similarity scoring on a 0-100 scale.

/// Scores how alike two strings are, 0 (nothing shared) to 100 (identical).
pub trait SimilarityScorer {
    fn ratio(&self, a: &str, b: &str) -> u8;
}

/// Normalized indel similarity:
/// `round(100 * (1 - indel_distance / (len_a + len_b)))`, over chars.
///
/// The indel distance counts insertions and deletions only, so it equals
/// `len_a + len_b - 2 * lcs(a, b)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

impl SimilarityScorer for IndelRatio {
    fn ratio(&self, a: &str, b: &str) -> u8 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let total = a.len() + b.len();
        if total == 0 {
            return 100;
        }

        let lcs = lcs_len(&a, &b);
        let score = (200 * lcs) as f64 / total as f64;
        score.round() as u8
    }
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indel_ratio() {
        let scorer = IndelRatio;
        assert_eq!(scorer.ratio("paracetamol", "paracetamol"), 100);
        assert_eq!(scorer.ratio("this is a test", "this is a test!"), 97);
        assert_eq!(scorer.ratio("panadol", "paracetamol"), 56);
        assert_eq!(scorer.ratio("abc", "xyz"), 0);
        assert_eq!(scorer.ratio("", ""), 100);
        assert_eq!(scorer.ratio("abc", ""), 0);
    }

    #[test]
    fn test_ratio_is_symmetric() {
        let scorer = IndelRatio;
        assert_eq!(
            scorer.ratio("amoxicillin", "amoxil"),
            scorer.ratio("amoxil", "amoxicillin")
        );
    }
}
