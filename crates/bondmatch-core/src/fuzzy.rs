//! Fuzzy client-name similarity
//!
//! Names are compared with a normalized Indel ratio on a 0-100 scale:
//! `100 * (1 - indel_distance / (len_a + len_b))`, where the Indel distance
//! counts insertions and deletions only. Equivalently
//! `200 * lcs(a, b) / (len_a + len_b)`. Lengths are in characters.

/// Trim and uppercase a name before comparison
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Length of the longest common subsequence of two character slices
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Indel similarity ratio of two strings as given (no normalization)
///
/// Two empty strings are identical and score 100.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Similarity of two client names, case-insensitive and trimmed
pub fn name_similarity(a: &str, b: &str) -> f64 {
    ratio(&normalize_name(a), &normalize_name(b))
}

/// Best-scoring candidate for a query name
///
/// Returns `(index, score)` of the highest similarity; ties go to the
/// earliest candidate. `None` when there are no candidates.
pub fn best_match<'a, I>(query: &str, candidates: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, f64)> = None;

    for (idx, candidate) in candidates.into_iter().enumerate() {
        let score = name_similarity(query, candidate);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert!(approx(ratio("JOHN SMITH", "JOHN SMITH"), 100.0));
        assert!(approx(ratio("ABC", "XYZ"), 0.0));
        assert!(approx(ratio("", ""), 100.0));
        assert!(approx(ratio("ABC", ""), 0.0));
    }

    #[test]
    fn test_ratio_indel() {
        // lcs("KITTEN", "SITTING") = 4 ("ITTN"), 200 * 4 / 13
        assert!(approx(ratio("KITTEN", "SITTING"), 800.0 / 13.0));
        // One dropped letter out of 10 + 9 characters
        assert!(approx(ratio("JOHN SMITH", "JOHN SMTH"), 1800.0 / 19.0));
    }

    #[test]
    fn test_name_similarity_case_and_whitespace() {
        assert!(approx(name_similarity("  john smith ", "JOHN SMITH"), 100.0));
    }

    #[test]
    fn test_best_match_first_wins_ties() {
        let candidates = ["JANE DOE", "JOHN SMITH", "john smith"];
        let (idx, score) = best_match("John Smith", candidates).unwrap();
        assert_eq!(idx, 1);
        assert!(approx(score, 100.0));
    }

    #[test]
    fn test_best_match_picks_highest() {
        let candidates = ["JOHN SMYTHE", "JOHN SMITH JR", "JOHN SMITH"];
        let (idx, _) = best_match("JOHN SMITH", candidates).unwrap();
        assert_eq!(idx, 2);
    }

    #[test]
    fn test_best_match_empty() {
        assert_eq!(best_match("JOHN", Vec::<&str>::new()), None);
    }

    #[test]
    fn test_unicode_counts_characters() {
        // lcs = 3 over 4 + 4 characters
        assert!(approx(ratio("ÉLAN", "ELAN"), 75.0));
    }
}
