// random.rs
//
// Copyright (c) 2025  Douglas Lau
//
use super::{Color, histogram};
use rand::{SeedableRng, rngs::StdRng, seq::index};

/// Random sample quantizer.
///
/// Picks distinct colors uniformly at random.  The generator is seeded
/// explicitly, so results are reproducible.
#[derive(Debug)]
pub struct RandomSample {
    seed: u64,
    pub(crate) colors: Vec<Color>,
}

impl RandomSample {
    /// Create a random sample quantizer with a seed
    pub fn with_seed(seed: u64) -> Self {
        RandomSample {
            seed,
            colors: Vec::new(),
        }
    }

    pub(crate) fn quantize(&mut self, colors: &[Color], max_colors: usize) -> &[Color] {
        let distinct: Vec<Color> =
            histogram(colors).into_iter().map(|(clr, _)| clr).collect();
        if distinct.len() <= max_colors {
            self.colors = distinct;
        } else {
            let mut rng = StdRng::seed_from_u64(self.seed);
            self.colors = index::sample(&mut rng, distinct.len(), max_colors)
                .iter()
                .map(|i| distinct[i])
                .collect();
        }
        &self.colors
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::quantize::test::gradient;

    #[test]
    fn sample_is_distinct_input() {
        let colors = gradient(32, 32);
        let mut q = RandomSample::with_seed(7);
        let out = q.quantize(&colors, 50).to_vec();
        assert_eq!(out.len(), 50);
        let mut dedup = out.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 50);
        assert!(out.iter().all(|c| colors.contains(c)));
    }

    #[test]
    fn seeded() {
        let colors = gradient(32, 32);
        let a = RandomSample::with_seed(1).quantize(&colors, 16).to_vec();
        let b = RandomSample::with_seed(1).quantize(&colors, 16).to_vec();
        let c = RandomSample::with_seed(2).quantize(&colors, 16).to_vec();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
