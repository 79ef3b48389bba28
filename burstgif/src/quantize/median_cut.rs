// median_cut.rs
//
// Copyright (c) 2025  Douglas Lau
//
use super::{Color, ColorSum, histogram};

/// Median cut quantizer.
///
/// Distinct colors start in one box.  The box with the most pixels times
/// volume is split at the (weighted) median of its widest channel, until
/// there are enough boxes or no box can be split.
#[derive(Debug, Default)]
pub struct MedianCut {
    pub(crate) colors: Vec<Color>,
}

/// Box of distinct colors with pixel counts
#[derive(Debug)]
struct ColorBox {
    entries: Vec<(Color, u32)>,
}

impl ColorBox {
    /// Get the low and high bounds of each channel
    fn bounds(&self) -> (Color, Color) {
        let mut lo = [u8::MAX; 3];
        let mut hi = [u8::MIN; 3];
        for (clr, _) in &self.entries {
            for c in 0..3 {
                lo[c] = lo[c].min(clr[c]);
                hi[c] = hi[c].max(clr[c]);
            }
        }
        (lo, hi)
    }

    /// Get the split priority: pixel count times box volume
    fn priority(&self) -> u64 {
        let (lo, hi) = self.bounds();
        let volume: u64 = (0..3)
            .map(|c| u64::from(hi[c].saturating_sub(lo[c])) + 1)
            .product();
        let count: u64 = self.entries.iter().map(|(_, n)| u64::from(*n)).sum();
        count * volume
    }

    /// Get the channel with the widest range (red, then green win ties)
    fn widest_channel(&self) -> usize {
        let (lo, hi) = self.bounds();
        let range = |c: usize| hi[c].saturating_sub(lo[c]);
        let mut widest = 0;
        for c in 1..3 {
            if range(c) > range(widest) {
                widest = c;
            }
        }
        widest
    }

    /// Split at the weighted median of a channel
    fn split(&mut self, channel: usize) -> ColorBox {
        self.entries.sort_by_key(|(clr, _)| clr[channel]);
        let total: u64 = self.entries.iter().map(|(_, n)| u64::from(*n)).sum();
        let mut acc = 0;
        let mut at = self.entries.len() - 1;
        for (i, (_, n)) in self.entries.iter().enumerate() {
            acc += u64::from(*n);
            if acc * 2 >= total {
                at = i + 1;
                break;
            }
        }
        let at = at.clamp(1, self.entries.len() - 1);
        ColorBox {
            entries: self.entries.split_off(at),
        }
    }

    /// Get the weighted mean color
    fn mean(&self) -> Option<Color> {
        let mut sum = ColorSum::default();
        for (clr, n) in &self.entries {
            sum.add(*clr, *n);
        }
        sum.mean()
    }
}

impl MedianCut {
    pub(crate) fn quantize(&mut self, colors: &[Color], max_colors: usize) -> &[Color] {
        let mut boxes = vec![ColorBox {
            entries: histogram(colors),
        }];
        while boxes.len() < max_colors {
            let mut best: Option<(usize, u64)> = None;
            for (i, b) in boxes.iter().enumerate() {
                if b.entries.len() < 2 {
                    continue;
                }
                let priority = b.priority();
                if best.map_or(true, |(_, p)| priority > p) {
                    best = Some((i, priority));
                }
            }
            match best {
                Some((i, _)) => {
                    let channel = boxes[i].widest_channel();
                    let upper = boxes[i].split(channel);
                    boxes.push(upper);
                }
                None => break,
            }
        }
        self.colors = boxes.iter().filter_map(ColorBox::mean).collect();
        &self.colors
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn two_clusters() {
        let mut q = MedianCut::default();
        let colors = [
            [0, 0, 0],
            [10, 0, 0],
            [0, 0, 0],
            [250, 255, 255],
            [240, 255, 255],
        ];
        assert_eq!(q.quantize(&colors, 2), [[3, 0, 0], [245, 255, 255]]);
    }

    #[test]
    fn dense_box_split_first() {
        let mut q = MedianCut::default();
        let mut colors = vec![[0, 0, 0]; 10];
        colors.extend([[0, 0, 8]; 10]);
        colors.extend([[200, 0, 0], [255, 0, 0]]);
        // 20 pixels * volume 9 outweighs 2 pixels * volume 56
        assert_eq!(q.quantize(&colors, 3), [[0, 0, 0], [228, 0, 0], [0, 0, 8]]);
    }

    #[test]
    fn stops_when_unsplittable() {
        let mut q = MedianCut::default();
        let colors = [[1, 2, 3], [4, 5, 6], [1, 2, 3]];
        assert_eq!(q.quantize(&colors, 256).len(), 2);
    }

    #[test]
    fn exact_when_few() {
        let mut q = MedianCut::default();
        let colors = [[9, 0, 0], [0, 9, 0], [0, 0, 9], [9, 9, 9]];
        let mut out = q.quantize(&colors, 4).to_vec();
        out.sort();
        let mut expected = colors.to_vec();
        expected.sort();
        assert_eq!(out, expected);
    }
}
