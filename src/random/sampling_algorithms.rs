//! Uniform sampling without replacement from containers that can be iterated but not
//! necessarily indexed.

use crate::rand::seq::index::sample as choose_range;
use crate::rand::Rng;

/// Sample `requested` elements uniformly without replacement from an iterator of known length,
/// preserving iteration order in the result.
///
/// Requests larger than the container are clamped: the whole container is returned.
pub fn sample_multiple_from_known_length<I, R, T>(rng: &mut R, iter: I, requested: usize) -> Vec<T>
where
    R: Rng,
    I: IntoIterator<Item = T>,
    I::IntoIter: ExactSizeIterator,
{
    let iter = iter.into_iter();
    let length = iter.len();
    if requested >= length {
        return iter.collect();
    }
    if requested == 0 {
        return Vec::new();
    }

    let mut indexes = choose_range(rng, length, requested).into_vec();
    indexes.sort_unstable();
    let mut index_iterator = indexes.into_iter().peekable();
    let mut selected = Vec::with_capacity(requested);

    for (idx, item) in iter.enumerate() {
        match index_iterator.peek() {
            Some(&next_idx) if next_idx == idx => {
                selected.push(item);
                index_iterator.next();
            }
            Some(_) => {}
            None => break,
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::HashSet;

    #[test]
    fn sample_has_requested_size_without_duplicates() {
        let data: Vec<u32> = (0..1000).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let sample = sample_multiple_from_known_length(&mut rng, data.iter().copied(), 100);

        assert_eq!(sample.len(), 100);
        assert!(sample.iter().all(|v| *v < 1000));
        let unique: HashSet<_> = sample.iter().collect();
        assert_eq!(unique.len(), sample.len());
        // Order of the source is preserved.
        assert!(sample.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn oversized_requests_are_clamped() {
        let mut rng = StdRng::seed_from_u64(1);
        let sample = sample_multiple_from_known_length(&mut rng, vec![4, 5, 6], 10);
        assert_eq!(sample, vec![4, 5, 6]);
        let sample = sample_multiple_from_known_length(&mut rng, Vec::<u8>::new(), 3);
        assert!(sample.is_empty());
    }

    #[test]
    fn zero_requested_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let sample = sample_multiple_from_known_length(&mut rng, vec![1, 2, 3], 0);
        assert!(sample.is_empty());
    }

    // Each of 10 items should be picked in about 30% of 3-out-of-10 samples.
    #[test]
    fn every_item_is_equally_likely() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; 10];
        let runs = 10_000;
        for _ in 0..runs {
            for item in sample_multiple_from_known_length(&mut rng, 0..10usize, 3) {
                counts[item] += 1;
            }
        }
        for count in counts {
            let share = count as f64 / runs as f64;
            assert!((share - 0.3).abs() < 0.03, "share {share} too far from 0.3");
        }
    }
}
