// neuquant.rs
//
// Copyright (c) 2025  Douglas Lau
//
use super::{Color, distinct_colors};

/// Maximum number of pixels used for learning
const MAX_SAMPLES: usize = 1 << 16;

/// Minimum number of pixels needed for the learning cycles
const MIN_SAMPLES: usize = 1 << 10;

/// Sampling factor (1 is best quality, 30 is fastest)
const SAMPLE_FACTOR: i32 = 10;

/// NeuQuant quantizer.
///
/// A self-organizing map (Kohonen network) learns the palette.  Large
/// images are strided down to a bounded number of samples, so running time
/// does not depend on image size.
#[derive(Debug, Default)]
pub struct NeuQuant {
    pub(crate) colors: Vec<Color>,
}

/// Gather RGBA training pixels
fn training_pixels(colors: &[Color]) -> (Vec<u8>, i32) {
    let stride = colors.len().div_ceil(MAX_SAMPLES).max(1);
    let n_samples = colors.len().div_ceil(stride).max(MIN_SAMPLES);
    let mut pixels = Vec::with_capacity(n_samples * 4);
    for clr in colors.iter().step_by(stride).cycle().take(n_samples) {
        pixels.extend_from_slice(clr);
        pixels.push(0xFF);
    }
    let sample_factor = if n_samples / (SAMPLE_FACTOR as usize) < MIN_SAMPLES
    {
        1
    } else {
        SAMPLE_FACTOR
    };
    (pixels, sample_factor)
}

impl NeuQuant {
    pub(crate) fn quantize(&mut self, colors: &[Color], max_colors: usize) -> &[Color] {
        if let Some(mut distinct) = distinct_colors(colors, max_colors) {
            distinct.sort_unstable();
            self.colors = distinct;
            return &self.colors;
        }
        let (pixels, sample_factor) = training_pixels(colors);
        log::debug!(
            "NeuQuant: {} samples, factor {sample_factor}",
            pixels.len() / 4
        );
        let nq = color_quant::NeuQuant::new(sample_factor, max_colors, &pixels);
        self.colors = nq
            .color_map_rgba()
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        &self.colors
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bounded_samples() {
        let colors = vec![[1, 2, 3]; 1_000_000];
        let (pixels, factor) = training_pixels(&colors);
        assert!(pixels.len() / 4 <= MAX_SAMPLES);
        assert_eq!(factor, SAMPLE_FACTOR);
        assert_eq!(&pixels[..4], [1, 2, 3, 0xFF]);
    }

    #[test]
    fn small_input_repeated() {
        let colors = [[1, 1, 1], [2, 2, 2], [3, 3, 3]];
        let (pixels, factor) = training_pixels(&colors);
        assert_eq!(pixels.len() / 4, MIN_SAMPLES);
        assert_eq!(factor, 1);
        let mut q = NeuQuant::default();
        assert_eq!(q.quantize(&colors, 2).len(), 2);
    }

    #[test]
    fn exact_when_few() {
        let mut q = NeuQuant::default();
        let colors = [[9, 9, 9], [1, 1, 1], [9, 9, 9]];
        assert_eq!(q.quantize(&colors, 4), [[1, 1, 1], [9, 9, 9]]);
    }
}
