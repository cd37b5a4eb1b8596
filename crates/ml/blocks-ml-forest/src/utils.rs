//! Shared glue: the in-place shuffle used to draw each tree's bag/OOB split.

use rand::Rng;

/// Shuffle `data` in place by, for every position `i`, swapping it with a
/// position drawn uniformly from the *entire* slice (not the shrinking
/// `i..len` suffix a textbook Fisher-Yates would use). This is the same
/// algorithm the ensemble's bagging step has always used; it is not
/// perfectly uniform over permutations, but no invariant here depends on
/// that — only on every sample having a fair chance of landing in the bag
/// versus the OOB set across many trees.
pub fn shuffle<T>(data: &mut [T], rng: &mut impl Rng) {
    let len = data.len();
    if len < 2 {
        return;
    }
    for i in 0..len {
        let j = rng.gen_range(0..len);
        data.swap(i, j);
    }
}
