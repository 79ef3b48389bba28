// quantize/mod.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Color quantization
//!
//! A [Quantizer] reduces the colors of a frame to a palette with at most
//! 256 entries.  Each [QuantizerKind] is a separate algorithm:
//!
//! * `Uniform`: fixed grid binning of the RGB cube (fastest)
//! * `MedianCut`: recursive median split of the most populous color box
//! * `KMeans`: iterative centroid refinement of a median cut palette
//! * `Random`: seeded random sample of distinct colors
//! * `Octree`: color tree with bottom-up merging
//! * `NeuQuant`: neural network learning quantizer (slowest, best quality)
mod kmeans;
mod median_cut;
mod neuquant;
mod octree;
mod random;
mod uniform;

use pix::{Palette, rgb::SRgb8};
use std::collections::{HashMap, HashSet};

pub use kmeans::KMeans;
pub use median_cut::MedianCut;
pub use neuquant::NeuQuant;
pub use octree::Octree;
pub use random::RandomSample;
pub use uniform::Uniform;

/// An RGB color
pub type Color = [u8; 3];

/// Maximum number of palette entries
pub const MAX_COLORS: usize = 256;

/// Default seed for the random quantizer
pub const DEFAULT_SEED: u64 = 0x6275_7273_7467_6966;

/// Color quantization algorithm
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QuantizerKind {
    /// Uniform binning of the RGB cube
    #[default]
    Uniform,
    /// Median cut
    MedianCut,
    /// K-means clustering
    KMeans,
    /// Random sampling
    Random,
    /// Octree
    Octree,
    /// NeuQuant neural network
    NeuQuant,
}

impl From<u8> for QuantizerKind {
    fn from(n: u8) -> Self {
        use self::QuantizerKind::*;
        match n % 6 {
            0 => Uniform,
            1 => MedianCut,
            2 => KMeans,
            3 => Random,
            4 => Octree,
            _ => NeuQuant,
        }
    }
}

impl std::str::FromStr for QuantizerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use self::QuantizerKind::*;
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(Uniform),
            "mediancut" | "median-cut" => Ok(MedianCut),
            "kmeans" | "k-means" => Ok(KMeans),
            "random" => Ok(Random),
            "octree" => Ok(Octree),
            "neuquant" => Ok(NeuQuant),
            _ => Err(()),
        }
    }
}

/// Color quantizer, holding the state of one algorithm
#[derive(Debug)]
pub enum Quantizer {
    Uniform(Uniform),
    MedianCut(MedianCut),
    KMeans(KMeans),
    Random(RandomSample),
    Octree(Octree),
    NeuQuant(NeuQuant),
}

impl Quantizer {
    /// Create a new quantizer
    pub fn new(kind: QuantizerKind) -> Self {
        Self::with_seed(kind, DEFAULT_SEED)
    }

    /// Create a new quantizer with a seed (used by `Random` only)
    pub fn with_seed(kind: QuantizerKind, seed: u64) -> Self {
        match kind {
            QuantizerKind::Uniform => Quantizer::Uniform(Uniform::default()),
            QuantizerKind::MedianCut => {
                Quantizer::MedianCut(MedianCut::default())
            }
            QuantizerKind::KMeans => Quantizer::KMeans(KMeans::default()),
            QuantizerKind::Random => {
                Quantizer::Random(RandomSample::with_seed(seed))
            }
            QuantizerKind::Octree => Quantizer::Octree(Octree::default()),
            QuantizerKind::NeuQuant => {
                Quantizer::NeuQuant(NeuQuant::default())
            }
        }
    }

    /// Get the algorithm kind
    pub fn kind(&self) -> QuantizerKind {
        match self {
            Quantizer::Uniform(_) => QuantizerKind::Uniform,
            Quantizer::MedianCut(_) => QuantizerKind::MedianCut,
            Quantizer::KMeans(_) => QuantizerKind::KMeans,
            Quantizer::Random(_) => QuantizerKind::Random,
            Quantizer::Octree(_) => QuantizerKind::Octree,
            Quantizer::NeuQuant(_) => QuantizerKind::NeuQuant,
        }
    }

    /// Quantize colors, returning the number of palette entries.
    ///
    /// `max_colors` is clamped to 1..=256.  Zero is returned only when
    /// there are no colors to quantize.
    pub fn quantize(&mut self, colors: &[Color], max_colors: usize) -> usize {
        let max_colors = max_colors.clamp(1, MAX_COLORS);
        if colors.is_empty() {
            return 0;
        }
        let entries = match self {
            Quantizer::Uniform(q) => q.quantize(colors, max_colors),
            Quantizer::MedianCut(q) => q.quantize(colors, max_colors),
            Quantizer::KMeans(q) => q.quantize(colors, max_colors),
            Quantizer::Random(q) => q.quantize(colors, max_colors),
            Quantizer::Octree(q) => q.quantize(colors, max_colors),
            Quantizer::NeuQuant(q) => q.quantize(colors, max_colors),
        };
        debug_assert!(entries.len() <= max_colors);
        entries.len()
    }

    /// Get the quantized colors, in algorithm order
    pub fn colors(&self) -> &[Color] {
        match self {
            Quantizer::Uniform(q) => &q.colors,
            Quantizer::MedianCut(q) => &q.colors,
            Quantizer::KMeans(q) => &q.colors,
            Quantizer::Random(q) => &q.colors,
            Quantizer::Octree(q) => &q.colors,
            Quantizer::NeuQuant(q) => &q.colors,
        }
    }

    /// Get the color palette
    pub fn palette(&self) -> Palette {
        make_palette(self.colors())
    }
}

/// Make a palette from a slice of colors
pub(crate) fn make_palette(colors: &[Color]) -> Palette {
    let mut palette = Palette::new(colors.len().clamp(1, MAX_COLORS));
    for [r, g, b] in colors.iter().take(MAX_COLORS) {
        palette.set_entry(SRgb8::new(*r, *g, *b));
    }
    palette
}

/// Get the distinct colors in first-occurrence order.
///
/// Returns `None` if there are more than `limit` distinct colors.
pub(crate) fn distinct_colors(colors: &[Color], limit: usize) -> Option<Vec<Color>> {
    let mut seen = HashSet::with_capacity(limit + 1);
    let mut distinct = Vec::with_capacity(limit);
    for clr in colors {
        if seen.insert(*clr) {
            if distinct.len() == limit {
                return None;
            }
            distinct.push(*clr);
        }
    }
    Some(distinct)
}

/// Get a histogram of distinct colors, sorted by color
pub(crate) fn histogram(colors: &[Color]) -> Vec<(Color, u32)> {
    let mut counts: HashMap<Color, u32> = HashMap::new();
    for clr in colors {
        *counts.entry(*clr).or_default() += 1;
    }
    let mut hist: Vec<(Color, u32)> = counts.into_iter().collect();
    hist.sort_unstable_by_key(|(clr, _)| *clr);
    hist
}

/// Get the squared distance between two colors
pub(crate) fn distance_sq(a: Color, b: Color) -> u32 {
    a.iter()
        .zip(b)
        .map(|(a, b)| {
            let d = i32::from(*a) - i32::from(b);
            (d * d) as u32
        })
        .sum()
}

/// Weighted sum of colors, for computing means
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ColorSum {
    sum: [u64; 3],
    count: u64,
}

impl ColorSum {
    /// Add a color with a weight
    pub fn add(&mut self, clr: Color, weight: u32) {
        for (s, c) in self.sum.iter_mut().zip(clr) {
            *s += u64::from(c) * u64::from(weight);
        }
        self.count += u64::from(weight);
    }

    /// Merge another sum into this one
    pub fn merge(&mut self, other: &ColorSum) {
        for (s, o) in self.sum.iter_mut().zip(other.sum) {
            *s += o;
        }
        self.count += other.count;
    }

    /// Get the total weight
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Get the mean color (rounded)
    pub fn mean(&self) -> Option<Color> {
        if self.count == 0 {
            return None;
        }
        let c = self.count;
        Some(self.sum.map(|s| ((s + c / 2) / c) as u8))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use pix::rgb::Rgb;

    const KINDS: [QuantizerKind; 6] = [
        QuantizerKind::Uniform,
        QuantizerKind::MedianCut,
        QuantizerKind::KMeans,
        QuantizerKind::Random,
        QuantizerKind::Octree,
        QuantizerKind::NeuQuant,
    ];

    /// Smooth gradient with many distinct colors
    pub(crate) fn gradient(width: usize, height: usize) -> Vec<Color> {
        let mut colors = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width.max(2).saturating_sub(1)) as u8;
                let g = (y * 255 / height.max(2).saturating_sub(1)) as u8;
                let b = ((x + y) * 7 % 256) as u8;
                colors.push([r, g, b]);
            }
        }
        colors
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("MedianCut".parse(), Ok(QuantizerKind::MedianCut));
        assert_eq!("k-means".parse(), Ok(QuantizerKind::KMeans));
        assert_eq!("neuquant".parse(), Ok(QuantizerKind::NeuQuant));
        assert!("popularity".parse::<QuantizerKind>().is_err());
    }

    #[test]
    fn empty_input() {
        for kind in KINDS {
            let mut q = Quantizer::new(kind);
            assert_eq!(q.quantize(&[], 256), 0, "{kind:?}");
            assert!(q.colors().is_empty());
        }
    }

    #[test]
    fn bounded_palette() {
        let colors = gradient(64, 64);
        for kind in KINDS {
            for max in [2, 16, 100, 256] {
                let mut q = Quantizer::new(kind);
                let n = q.quantize(&colors, max);
                assert!(n > 0, "{kind:?} {max}");
                assert!(n <= max, "{kind:?} {max}: {n}");
                assert_eq!(q.colors().len(), n);
                assert!(q.palette().len() <= n);
            }
        }
    }

    #[test]
    fn deterministic() {
        let colors = gradient(40, 30);
        for kind in KINDS {
            let mut a = Quantizer::new(kind);
            let mut b = Quantizer::new(kind);
            a.quantize(&colors, 64);
            b.quantize(&colors, 64);
            assert_eq!(a.colors(), b.colors(), "{kind:?}");
        }
    }

    #[test]
    fn distinct_first_occurrence() {
        let colors = [[9, 9, 9], [1, 2, 3], [9, 9, 9], [4, 5, 6], [1, 2, 3]];
        assert_eq!(
            distinct_colors(&colors, 256),
            Some(vec![[9, 9, 9], [1, 2, 3], [4, 5, 6]])
        );
        assert_eq!(distinct_colors(&colors, 2), None);
        assert_eq!(distinct_colors(&colors, 3).map(|d| d.len()), Some(3));
    }

    #[test]
    fn palette_round_trip() {
        let colors: Vec<Color> = (0..=255u8)
            .map(|i| [i, 255 - i, i.wrapping_mul(3)])
            .collect();
        let distinct = distinct_colors(&colors, 256).unwrap();
        let palette = make_palette(&distinct);
        assert_eq!(palette.len(), 256);
        for (i, [r, g, b]) in colors.iter().enumerate() {
            let clr = palette.entry(i).unwrap();
            assert_eq!(u8::from(Rgb::red(clr)), *r);
            assert_eq!(u8::from(Rgb::green(clr)), *g);
            assert_eq!(u8::from(Rgb::blue(clr)), *b);
        }
    }

    #[test]
    fn histogram_sorted() {
        let hist = histogram(&[[3, 0, 0], [1, 0, 0], [3, 0, 0]]);
        assert_eq!(hist, [([1, 0, 0], 1), ([3, 0, 0], 2)]);
    }

    #[test]
    fn color_sum_mean() {
        let mut s = ColorSum::default();
        assert_eq!(s.mean(), None);
        s.add([10, 0, 255], 1);
        s.add([20, 1, 255], 3);
        assert_eq!(s.count(), 4);
        assert_eq!(s.mean(), Some([18, 1, 255]));
    }
}
