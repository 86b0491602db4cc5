//! Unbiased in-place shuffle shared by the engines

use rand::Rng;

/// Fisher-Yates shuffle: every permutation of `items` is equally likely
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut items: Vec<u32> = (0..32).collect();
        shuffle(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_handles_tiny_slices() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut empty: [u8; 0] = [];
        shuffle(&mut empty, &mut rng);
        let mut one = [9];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, [9]);
    }

    #[test]
    fn test_shuffle_is_roughly_uniform() {
        // Each of the 6 orderings of 3 items should show up about 1/6 of the time
        let mut rng = Pcg32::seed_from_u64(42);
        let mut counts = std::collections::HashMap::new();
        for _ in 0..6000 {
            let mut items = [0u8, 1, 2];
            shuffle(&mut items, &mut rng);
            *counts.entry(items).or_insert(0u32) += 1;
        }
        assert_eq!(counts.len(), 6);
        for &count in counts.values() {
            assert!((800..1200).contains(&count), "skewed count {count}");
        }
    }
}
