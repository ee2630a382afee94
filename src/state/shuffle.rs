use rand::Rng;

/// In-place Fisher-Yates shuffle.
///
/// Walks the slice from the back, swapping each slot with a uniformly drawn
/// slot at or before it. With an unbiased generator every permutation is
/// equally likely; callers that need reproducible output pass a seeded one.
pub fn shuffle<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
