// uniform.rs
//
// Copyright (c) 2025  Douglas Lau
//
use super::{Color, ColorSum};

/// Uniform quantizer.
///
/// The RGB cube is split into a fixed grid of bins (3-3-2 bits for 256
/// colors); every occupied bin becomes the mean of its colors.
#[derive(Debug, Default)]
pub struct Uniform {
    pub(crate) colors: Vec<Color>,
}

/// Get the bits per channel (red, green, blue) for a palette size
fn channel_bits(max_colors: usize) -> [u32; 3] {
    let total = max_colors.max(1).ilog2().min(8);
    [(total + 1) / 3, (total + 2) / 3, total / 3]
}

/// Get the bin of a color
fn bin_index(clr: Color, bits: [u32; 3]) -> usize {
    let [br, bg, bb] = bits;
    let r = u32::from(clr[0]) >> (8 - br);
    let g = u32::from(clr[1]) >> (8 - bg);
    let b = u32::from(clr[2]) >> (8 - bb);
    ((r << (bg + bb)) | (g << bb) | b) as usize
}

impl Uniform {
    pub(crate) fn quantize(&mut self, colors: &[Color], max_colors: usize) -> &[Color] {
        let bits = channel_bits(max_colors);
        let mut bins = vec![ColorSum::default(); 1 << bits.iter().sum::<u32>()];
        for clr in colors {
            bins[bin_index(*clr, bits)].add(*clr, 1);
        }
        self.colors = bins.iter().filter_map(ColorSum::mean).collect();
        &self.colors
    }
}
