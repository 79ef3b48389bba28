// private.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Private module for top-level items
use crate::{
    Error, Result,
    block::{DisposalMethod, GraphicControl},
    dither::{AccelContext, DitherKind},
    encode::{Canvas, StepEnc},
    quantize::QuantizerKind,
};
use pix::{Raster, rgb::SRgba8};
use rayon::ThreadPoolBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Maximum number of worker threads
const MAX_WORKERS: usize = 8;

/// One step of an animation.
///
/// Holds the frame raster, its position on the canvas, graphic control
/// settings, and the quantizer / ditherer used to encode it.
pub struct Step {
    /// Raster of the animation step
    raster: Raster<SRgba8>,
    /// Left / top position on the canvas
    position: (u16, u16),
    /// Graphic control for the step
    graphic_control_ext: Option<GraphicControl>,
    /// Color quantizer
    quantizer: QuantizerKind,
    /// Ditherer
    dither: DitherKind,
    /// Seed for randomized quantizers
    seed: Option<u64>,
}

// Rasters are copied with `Raster::with_raster`
impl Clone for Step {
    fn clone(&self) -> Self {
        Step {
            raster: Raster::with_raster(&self.raster),
            position: self.position,
            graphic_control_ext: self.graphic_control_ext,
            quantizer: self.quantizer,
            dither: self.dither,
            seed: self.seed,
        }
    }
}

impl Step {
    /// Create an animation step with a true color raster.
    ///
    /// The alpha channel is ignored.
    pub fn with_true_color(raster: Raster<SRgba8>) -> Self {
        Step {
            raster,
            position: (0, 0),
            graphic_control_ext: None,
            quantizer: QuantizerKind::default(),
            dither: DitherKind::default(),
            seed: None,
        }
    }

    /// Create an animation step from packed 32-bit colors.
    ///
    /// Each value holds red in the low byte, then green and blue; the high
    /// byte is unused.
    pub fn with_packed(width: u16, height: u16, pixels: &[u32]) -> Result<Self> {
        if pixels.len() != usize::from(width) * usize::from(height) {
            return Err(Error::InvalidFrameDimensions);
        }
        let buf: Vec<u8> = pixels
            .iter()
            .flat_map(|p| {
                let [r, g, b, _] = p.to_le_bytes();
                [r, g, b, 0xFF]
            })
            .collect();
        let raster = Raster::with_u8_buffer(width.into(), height.into(), buf);
        Ok(Self::with_true_color(raster))
    }

    /// Adjust the position on the canvas.
    pub fn with_position(mut self, left: u16, top: u16) -> Self {
        self.position = (left, top);
        self
    }

    /// Adjust one graphic control setting
    fn adjust_control<F: FnOnce(&mut GraphicControl)>(mut self, f: F) -> Self {
        let mut control = self.graphic_control_ext.unwrap_or_default();
        f(&mut control);
        if control != GraphicControl::default() {
            self.graphic_control_ext = Some(control);
        } else {
            self.graphic_control_ext = None;
        }
        self
    }

    /// Adjust the disposal method.
    pub fn with_disposal_method(self, method: DisposalMethod) -> Self {
        self.adjust_control(|c| c.set_disposal_method(method))
    }

    /// Adjust the transparent color.
    pub fn with_transparent_color(self, clr: Option<u8>) -> Self {
        self.adjust_control(|c| c.set_transparent_color(clr))
    }

    /// Adjust the user input flag.
    pub fn with_user_input(self, user_input: bool) -> Self {
        self.adjust_control(|c| c.set_user_input(user_input))
    }

    /// Adjust the delay time.
    pub fn with_delay_time_cs(self, delay: Option<u16>) -> Self {
        self.adjust_control(|c| c.set_delay_time_cs(delay.unwrap_or_default()))
    }

    /// Adjust the delay time in milliseconds.
    ///
    /// GIF delays have centisecond precision, so the remainder is dropped.
    pub fn with_delay_ms(self, delay_ms: u32) -> Self {
        let delay = u16::try_from(delay_ms / 10).unwrap_or(u16::MAX);
        self.with_delay_time_cs(Some(delay))
    }

    /// Adjust the color quantizer.
    pub fn with_quantizer(mut self, quantizer: QuantizerKind) -> Self {
        self.quantizer = quantizer;
        self
    }

    /// Adjust the ditherer.
    pub fn with_dither(mut self, dither: DitherKind) -> Self {
        self.dither = dither;
        self
    }

    /// Adjust the seed for randomized quantizers.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Get the raster
    pub fn raster(&self) -> &Raster<SRgba8> {
        &self.raster
    }

    /// Get the left / top position
    pub fn position(&self) -> (u16, u16) {
        self.position
    }

    /// Get the transparent color
    pub fn transparent_color(&self) -> Option<u8> {
        self.graphic_control_ext.and_then(|c| c.transparent_color())
    }

    /// Get the delay time in centiseconds
    pub fn delay_time_cs(&self) -> Option<u16> {
        self.graphic_control_ext.map(|c| c.delay_time_cs())
    }

    /// Get the graphic control settings
    pub(crate) fn graphic_control(&self) -> GraphicControl {
        self.graphic_control_ext.unwrap_or_default()
    }

    /// Get the color quantizer
    pub fn quantizer(&self) -> QuantizerKind {
        self.quantizer
    }

    /// Get the ditherer
    pub fn dither(&self) -> DitherKind {
        self.dither
    }

    /// Get the quantizer seed
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Animated GIF encoder
///
/// Configure the canvas, then [open] it to write the file preamble and get
/// a [StepEnc].
///
/// ## Encoding Example
/// ```
/// use burstgif::{DitherKind, Encoder, QuantizerKind, Step};
/// use std::error::Error;
/// use std::io::Write;
///
/// fn encode<W: Write>(w: W) -> Result<W, Box<dyn Error>> {
///     let mut enc = Encoder::new(w, 4, 4).with_workers(2).open()?;
///     let red = vec![0x0000_00FF; 16];
///     let blue = vec![0x00FF_0000; 16];
///     let steps = [
///         Step::with_packed(4, 4, &red)?.with_delay_ms(500),
///         Step::with_packed(4, 4, &blue)?
///             .with_delay_ms(500)
///             .with_quantizer(QuantizerKind::Octree)
///             .with_dither(DitherKind::FloydSteinberg),
///     ];
///     for frame in enc.add_frames(&steps) {
///         enc.flush(frame?)?;
///     }
///     Ok(enc.finish()?)
/// }
/// # encode(Vec::new()).unwrap();
/// ```
///
/// [open]: struct.Encoder.html#method.open
/// [StepEnc]: struct.StepEnc.html
pub struct Encoder<W: Write> {
    /// Writer for output data
    writer: W,
    /// Screen width
    width: u16,
    /// Screen height
    height: u16,
    /// Animation loop count (0 means forever)
    loop_count: u16,
    /// Number of worker threads
    workers: usize,
    /// Accelerator context
    accel: AccelContext,
}

impl Encoder<BufWriter<File>> {
    /// Create a GIF encoder for a new file.
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: u16,
        height: u16,
    ) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), width, height))
    }
}

impl<W: Write> Encoder<W> {
    /// Create a new GIF encoder.
    pub fn new(writer: W, width: u16, height: u16) -> Self {
        Encoder {
            writer,
            width,
            height,
            loop_count: 0,
            workers: 0,
            accel: AccelContext::default(),
        }
    }

    /// Set the animation loop count (0 means loop forever).
    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Set the number of worker threads for
    /// [add_frames](struct.StepEnc.html#method.add_frames).
    ///
    /// At most 8 workers are used; 0 or 1 encodes on the calling thread.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.min(MAX_WORKERS);
        self
    }

    /// Set the accelerator context for dithering.
    pub fn with_accel(mut self, accel: AccelContext) -> Self {
        self.accel = accel;
        self
    }

    /// Write the file preamble and convert into a step encoder.
    ///
    /// The header, logical screen descriptor and looping extension are
    /// written immediately.
    pub fn open(self) -> Result<StepEnc<W>> {
        let pool = if self.workers > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .thread_name(|i| format!("burstgif-{i}"))
                .build()?;
            Some(pool)
        } else {
            None
        };
        let mut accel = self.accel;
        accel.open();
        let canvas = Canvas::new(self.width, self.height, accel);
        StepEnc::open(self.writer, canvas, self.loop_count, pool)
    }
}
