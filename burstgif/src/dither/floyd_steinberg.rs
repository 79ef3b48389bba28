// floyd_steinberg.rs
//
// Copyright (c) 2025  Douglas Lau
//
use super::Nearest;
use crate::quantize::Color;

/// Channel errors
type Error3 = [i32; 3];

/// Error diffusion kernel
struct Kernel {
    /// (dx, dy, weight) of each unprocessed neighbor
    entries: &'static [(isize, usize, i32)],
    /// Divisor for all weights
    divisor: i32,
}

/// Floyd-Steinberg kernel
///
/// ```text
///        X   7
///    3   5   1
/// ```
const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
    divisor: 16,
};

/// Dither with Floyd-Steinberg error diffusion.
///
/// Pixels are processed in raster order.  Error pushed past the left or
/// right edge, or below the last row, is dropped.  Weighted errors are
/// truncated toward zero.
pub(crate) fn dither(
    pixels: &[Color],
    width: usize,
    nearest: &mut Nearest,
) -> Vec<u8> {
    let kernel = &FLOYD_STEINBERG;
    let mut indices = Vec::with_capacity(pixels.len());
    // error rows: current, next
    let mut rows: [Vec<Error3>; 2] = [vec![[0; 3]; width], vec![[0; 3]; width]];
    for row in pixels.chunks(width.max(1)) {
        for (x, clr) in row.iter().enumerate() {
            let e = rows[0][x];
            let adjusted: Color =
                [0, 1, 2].map(|c| (i32::from(clr[c]) + e[c]).clamp(0, 255) as u8);
            let idx = nearest.index(adjusted);
            let chosen = nearest.palette()[usize::from(idx)];
            let err = [0, 1, 2]
                .map(|c| i32::from(adjusted[c]) - i32::from(chosen[c]));
            for &(dx, dy, weight) in kernel.entries {
                let Some(nx) = x.checked_add_signed(dx) else {
                    continue;
                };
                if nx < width {
                    for (a, b) in rows[dy][nx].iter_mut().zip(err) {
                        *a += b * weight / kernel.divisor;
                    }
                }
            }
            indices.push(idx);
        }
        rows.swap(0, 1);
        rows[1].iter_mut().for_each(|e| *e = [0; 3]);
    }
    indices
}
