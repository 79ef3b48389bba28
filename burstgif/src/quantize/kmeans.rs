// kmeans.rs
//
// Copyright (c) 2025  Douglas Lau
//
use super::{Color, ColorSum, MedianCut, distance_sq, histogram};

/// Maximum number of refinement iterations
const MAX_ITERATIONS: usize = 16;

/// K-means quantizer.
///
/// Centroids start from a median cut palette, then are refined until no
/// color changes cluster, or the iteration limit is reached.
#[derive(Debug, Default)]
pub struct KMeans {
    pub(crate) colors: Vec<Color>,
}

/// Find the nearest centroid (first one wins ties)
fn nearest(centroids: &[Color], clr: Color) -> usize {
    let mut best = (0, u32::MAX);
    for (i, c) in centroids.iter().enumerate() {
        let d = distance_sq(*c, clr);
        if d < best.1 {
            best = (i, d);
        }
    }
    best.0
}

impl KMeans {
    pub(crate) fn quantize(&mut self, colors: &[Color], max_colors: usize) -> &[Color] {
        let hist = histogram(colors);
        let mut centroids =
            MedianCut::default().quantize(colors, max_colors).to_vec();
        let k = centroids.len();
        let mut assigned = vec![usize::MAX; hist.len()];
        for _ in 0..MAX_ITERATIONS {
            let mut changed = false;
            let mut sums = vec![ColorSum::default(); k];
            for ((clr, n), a) in hist.iter().zip(assigned.iter_mut()) {
                let i = nearest(&centroids, *clr);
                if *a != i {
                    *a = i;
                    changed = true;
                }
                sums[i].add(*clr, *n);
            }
            if !changed {
                break;
            }
            for (c, sum) in centroids.iter_mut().zip(&sums) {
                // empty clusters keep their centroid
                if let Some(mean) = sum.mean() {
                    *c = mean;
                }
            }
        }
        self.colors = centroids;
        &self.colors
    }
}
