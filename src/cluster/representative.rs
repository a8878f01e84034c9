//! Representative selection for finished clusters.

use super::incremental::{centroid_of, cosine_similarity};

/// Choose the representative text for a cluster: the member whose vector is
/// most similar to the cluster centroid.
///
/// The centroid is recomputed here as a fresh mean over exactly the final
/// members, independent of the running mean maintained during assignment.
/// Ties go to the earliest-inserted member. A singleton cluster returns its
/// only member's text directly. An empty member list returns `None`.
pub fn pick_representative(
    members: &[usize],
    texts: &[String],
    vectors: &[Vec<f32>],
) -> Option<String> {
    if members.is_empty() {
        return None;
    }
    if members.len() == 1 {
        return texts.get(members[0]).cloned();
    }

    let member_vecs: Vec<&[f32]> = members.iter().map(|&m| vectors[m].as_slice()).collect();
    let centroid = centroid_of(&member_vecs);

    // Strict > keeps the first maximum, so ties go to the lowest member index.
    let mut best_member = members[0];
    let mut best_sim = f32::NEG_INFINITY;
    for &m in members {
        let sim = cosine_similarity(&vectors[m], &centroid);
        if sim > best_sim {
            best_sim = sim;
            best_member = m;
        }
    }

    texts.get(best_member).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_members_returns_none() {
        assert_eq!(pick_representative(&[], &[], &[]), None);
    }

    #[test]
    fn test_singleton_returns_its_member() {
        let t = texts(&["only note"]);
        let v = vec![vec![1.0, 0.0]];
        assert_eq!(pick_representative(&[0], &t, &v), Some("only note".to_string()));
    }

    #[test]
    fn test_picks_member_closest_to_mean() {
        // Mean is [0.95, 0.05]; the first vector is clearly closer to it.
        let t = texts(&["close", "farther"]);
        let v = vec![vec![1.0, 0.0], vec![0.9, 0.1]];
        assert_eq!(pick_representative(&[0, 1], &t, &v), Some("close".to_string()));
    }

    #[test]
    fn test_tie_goes_to_lowest_member_index() {
        // Identical vectors have identical similarity to the mean.
        let t = texts(&["first", "second"]);
        let v = vec![vec![0.5, 0.5], vec![0.5, 0.5]];
        assert_eq!(pick_representative(&[0, 1], &t, &v), Some("first".to_string()));
    }
}
