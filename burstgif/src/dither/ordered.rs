// ordered.rs
//
// Copyright (c) 2025  Douglas Lau
//
use super::Nearest;
use crate::quantize::Color;

/// 2x2 threshold matrix
pub(crate) const BAYER_2: [&[u8]; 2] = [&[0, 2], &[3, 1]];

/// 8x8 Bayer threshold matrix
pub(crate) const BAYER_8: [&[u8]; 8] = [
    &[0, 32, 8, 40, 2, 34, 10, 42],
    &[48, 16, 56, 24, 50, 18, 58, 26],
    &[12, 44, 4, 36, 14, 46, 6, 38],
    &[60, 28, 52, 20, 62, 30, 54, 22],
    &[3, 35, 11, 43, 1, 33, 9, 41],
    &[51, 19, 59, 27, 49, 17, 57, 25],
    &[15, 47, 7, 39, 13, 45, 5, 37],
    &[63, 31, 55, 23, 61, 29, 53, 21],
];

/// Get the spread of threshold offsets for a palette size.
///
/// This is the expected channel spacing of a palette spread evenly over
/// the RGB cube.
fn strength(n_colors: usize) -> f32 {
    256.0 / (n_colors.max(1) as f32).cbrt()
}

/// Get the offset for a threshold value in an `n` x `n` matrix
fn offset(threshold: u8, n: usize, strength: f32) -> i32 {
    let last = (n * n - 1) as f32;
    ((f32::from(threshold) / last - 0.5) * strength).round() as i32
}

/// Dither with a threshold matrix
pub(crate) fn dither(
    matrix: &[&[u8]],
    pixels: &[Color],
    width: usize,
    nearest: &mut Nearest,
) -> Vec<u8> {
    let n = matrix.len();
    let strength = strength(nearest.palette().len());
    let offsets: Vec<Vec<i32>> = matrix
        .iter()
        .map(|row| row.iter().map(|t| offset(*t, n, strength)).collect())
        .collect();
    pixels
        .iter()
        .enumerate()
        .map(|(i, clr)| {
            let (x, y) = (i % width, i / width);
            let off = offsets[y % n][x % n];
            let clr = clr.map(|c| (i32::from(c) + off).clamp(0, 255) as u8);
            nearest.index(clr)
        })
        .collect()
}
