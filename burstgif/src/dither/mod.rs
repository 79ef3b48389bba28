// dither/mod.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Dithering
//!
//! A [Ditherer] maps every pixel of a frame to an index into a quantized
//! palette.  Ordered ditherers (`Bayer`, `M2`) perturb each pixel by a
//! threshold matrix before the nearest color lookup.  `FloydSteinberg`
//! diffuses the error of each pixel to its unprocessed neighbors.
mod accel;
mod floyd_steinberg;
mod ordered;

use crate::{
    Error, Result,
    quantize::{Color, distance_sq},
};
use pix::{Palette, Raster, gray::Gray8, rgb::Rgb};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use accel::{AccelContext, DitherBackend};

/// Dithering algorithm
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DitherKind {
    /// Nearest color only
    #[default]
    None,
    /// Ordered dithering with an 8x8 Bayer matrix
    Bayer,
    /// Floyd-Steinberg error diffusion
    FloydSteinberg,
    /// Ordered dithering with a 2x2 matrix
    M2,
}

impl From<u8> for DitherKind {
    fn from(n: u8) -> Self {
        use self::DitherKind::*;
        match n % 4 {
            0 => None,
            1 => M2,
            2 => Bayer,
            _ => FloydSteinberg,
        }
    }
}

impl std::str::FromStr for DitherKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use self::DitherKind::*;
        match s.to_ascii_lowercase().as_str() {
            "none" | "no" => Ok(None),
            "bayer" => Ok(Bayer),
            "floydsteinberg" | "floyd-steinberg" | "fs" => Ok(FloydSteinberg),
            "m2" => Ok(M2),
            _ => Err(()),
        }
    }
}

/// Ditherer for one frame
#[derive(Clone)]
pub enum Ditherer {
    /// Nearest color only
    None,
    /// 8x8 ordered dithering
    Bayer,
    /// Error diffusion
    FloydSteinberg,
    /// 2x2 ordered dithering
    M2,
    /// Platform backend, falling back to software
    Accelerated(DitherKind, Arc<dyn DitherBackend>),
}

impl fmt::Debug for Ditherer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ditherer::Accelerated(kind, backend) => {
                write!(fmt, "Accelerated({kind:?}, {})", backend.name())
            }
            _ => write!(fmt, "{:?}", self.kind()),
        }
    }
}

impl From<DitherKind> for Ditherer {
    fn from(kind: DitherKind) -> Self {
        match kind {
            DitherKind::None => Ditherer::None,
            DitherKind::Bayer => Ditherer::Bayer,
            DitherKind::FloydSteinberg => Ditherer::FloydSteinberg,
            DitherKind::M2 => Ditherer::M2,
        }
    }
}

/// Nearest palette color lookup, with a cache
pub(crate) struct Nearest<'a> {
    palette: &'a [Color],
    cache: HashMap<Color, u8>,
}

impl<'a> Nearest<'a> {
    pub fn new(palette: &'a [Color]) -> Self {
        debug_assert!(!palette.is_empty() && palette.len() <= 256);
        Nearest {
            palette,
            cache: HashMap::new(),
        }
    }

    /// Get the palette
    pub fn palette(&self) -> &[Color] {
        self.palette
    }

    /// Find the index of the nearest color (first one wins ties)
    pub fn index(&mut self, clr: Color) -> u8 {
        let palette = self.palette;
        *self.cache.entry(clr).or_insert_with(|| {
            let mut best = (0, u32::MAX);
            for (i, p) in palette.iter().enumerate() {
                let d = distance_sq(*p, clr);
                if d < best.1 {
                    best = (i, d);
                }
            }
            best.0 as u8
        })
    }
}

/// Get the colors of a palette
pub(crate) fn palette_colors(palette: &Palette) -> Vec<Color> {
    (0..palette.len())
        .filter_map(|i| palette.entry(i))
        .map(|c| {
            [
                u8::from(Rgb::red(c)),
                u8::from(Rgb::green(c)),
                u8::from(Rgb::blue(c)),
            ]
        })
        .collect()
}

impl Ditherer {
    /// Get the dithering algorithm
    pub fn kind(&self) -> DitherKind {
        match self {
            Ditherer::None => DitherKind::None,
            Ditherer::Bayer => DitherKind::Bayer,
            Ditherer::FloydSteinberg => DitherKind::FloydSteinberg,
            Ditherer::M2 => DitherKind::M2,
            Ditherer::Accelerated(kind, _) => *kind,
        }
    }

    /// Dither pixels to an indexed raster.
    ///
    /// Every index in the result is less than the palette length.
    pub fn dither(
        &self,
        pixels: &[Color],
        width: u32,
        height: u32,
        palette: &Palette,
    ) -> Result<Raster<Gray8>> {
        let n_pixels = usize::try_from(width)? * usize::try_from(height)?;
        if pixels.len() != n_pixels {
            return Err(Error::InvalidFrameDimensions);
        }
        let colors = palette_colors(palette);
        if colors.is_empty() {
            return if n_pixels == 0 {
                Ok(Raster::with_clear(width, height))
            } else {
                Err(Error::InvalidColorIndex)
            };
        }
        let indices = match self {
            Ditherer::Accelerated(kind, backend) => {
                match accel::dither(backend.as_ref(), *kind, pixels, width, height, &colors) {
                    Ok(indices) => indices,
                    Err(e) => {
                        log::warn!("{}: {e}, using software", backend.name());
                        Ditherer::from(*kind).dither_sw(pixels, width, &colors)
                    }
                }
            }
            _ => self.dither_sw(pixels, width, &colors),
        };
        Ok(Raster::with_u8_buffer(width, height, indices))
    }

    /// Dither with a software algorithm
    fn dither_sw(&self, pixels: &[Color], width: u32, colors: &[Color]) -> Vec<u8> {
        let width = width as usize;
        let mut nearest = Nearest::new(colors);
        match self.kind() {
            DitherKind::None => {
                pixels.iter().map(|clr| nearest.index(*clr)).collect()
            }
            DitherKind::Bayer => {
                ordered::dither(&ordered::BAYER_8, pixels, width, &mut nearest)
            }
            DitherKind::M2 => {
                ordered::dither(&ordered::BAYER_2, pixels, width, &mut nearest)
            }
            DitherKind::FloydSteinberg => {
                floyd_steinberg::dither(pixels, width, &mut nearest)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::quantize::{Quantizer, QuantizerKind, make_palette, test::gradient};

    const KINDS: [DitherKind; 4] = [
        DitherKind::None,
        DitherKind::Bayer,
        DitherKind::FloydSteinberg,
        DitherKind::M2,
    ];

    #[test]
    fn kind_from_str() {
        assert_eq!("Floyd-Steinberg".parse(), Ok(DitherKind::FloydSteinberg));
        assert_eq!("no".parse(), Ok(DitherKind::None));
        assert_eq!("M2".parse(), Ok(DitherKind::M2));
        assert!("atkinson".parse::<DitherKind>().is_err());
    }

    #[test]
    fn nearest_first_wins() {
        let palette = [[10, 10, 10], [0, 0, 0], [20, 20, 20]];
        let mut n = Nearest::new(&palette);
        assert_eq!(n.index([15, 15, 15]), 0);
        assert_eq!(n.index([1, 0, 0]), 1);
        assert_eq!(n.index([255, 255, 255]), 2);
        assert_eq!(n.index([15, 15, 15]), 0);
    }

    #[test]
    fn indices_in_palette() {
        let (width, height) = (37, 23);
        let pixels = gradient(width, height);
        for max in [2, 5, 64, 256] {
            let mut q = Quantizer::new(QuantizerKind::MedianCut);
            q.quantize(&pixels, max);
            let palette = q.palette();
            for kind in KINDS {
                let raster = Ditherer::from(kind)
                    .dither(&pixels, width as u32, height as u32, &palette)
                    .unwrap();
                assert_eq!(raster.width(), width as u32);
                assert_eq!(raster.height(), height as u32);
                assert!(
                    raster.as_u8_slice().iter().all(|i| usize::from(*i) < palette.len()),
                    "{kind:?} {max}"
                );
            }
        }
    }

    #[test]
    fn exact_colors_kept() {
        let pixels = [[0, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]];
        let palette = make_palette(&pixels);
        let raster = Ditherer::None.dither(&pixels, 2, 2, &palette).unwrap();
        assert_eq!(raster.as_u8_slice(), [0, 1, 2, 3]);
    }

    #[test]
    fn size_mismatch() {
        let palette = make_palette(&[[0, 0, 0]]);
        assert!(matches!(
            Ditherer::None.dither(&[[0, 0, 0]; 3], 2, 2, &palette),
            Err(Error::InvalidFrameDimensions)
        ));
    }
}
