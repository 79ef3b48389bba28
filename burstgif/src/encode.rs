// encode.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! GIF file encoding
use crate::{
    Error, Result,
    block::*,
    dither::AccelContext,
    lzw,
    private::Step,
    quantize::{Color, MAX_COLORS, Quantizer, distinct_colors, make_palette},
};
use pix::rgb::Rgb;
use rayon::{ThreadPool, prelude::*};
use std::io::{self, Write};

impl Header {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Header_.signature())?;
        w.write_all(&self.version())
    }
}

impl LogicalScreenDesc {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(BlockCode::LogicalScreenDesc_.size());
        buf.extend_from_slice(&self.screen_width().to_le_bytes());
        buf.extend_from_slice(&self.screen_height().to_le_bytes());
        buf.push(self.flags());
        buf.push(0); // background color index
        buf.push(0); // pixel aspect ratio
        w.write_all(&buf)
    }
}

impl GraphicControl {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        let mut buf = Vec::with_capacity(7);
        buf.push(ExtensionCode::GraphicControl_.into());
        buf.push(4); // block size
        buf.push(self.flags());
        buf.extend_from_slice(&self.delay_time_cs().to_le_bytes());
        buf.push(self.transparent_color_idx());
        buf.push(0); // block size
        w.write_all(&buf)
    }
}

impl Application {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        w.write_all(&[ExtensionCode::Application_.into()])?;
        for c in self.app_data() {
            debug_assert!(c.len() < 256);
            let len = c.len() as u8;
            w.write_all(&[len])?; // block size
            w.write_all(c)?;
        }
        w.write_all(&[0]) // block size
    }
}

impl ImageDesc {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(BlockCode::ImageDesc_.size());
        buf.extend_from_slice(BlockCode::ImageDesc_.signature());
        buf.extend_from_slice(&self.left().to_le_bytes());
        buf.extend_from_slice(&self.top().to_le_bytes());
        buf.extend_from_slice(&self.width().to_le_bytes());
        buf.extend_from_slice(&self.height().to_le_bytes());
        buf.push(self.flags());
        w.write_all(&buf)
    }
}

impl LocalColorTable {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.colors())
    }
}

impl ImageData {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.data())
    }
}

impl Trailer {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Trailer_.signature())
    }
}

impl Frame {
    /// Write all blocks of a frame
    pub fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if let Some(b) = &self.graphic_control_ext {
            b.format(w)?;
        }
        self.image_desc.format(w)?;
        if let Some(b) = &self.local_color_table {
            b.format(w)?;
        }
        if let Some(b) = &self.image_data {
            b.format(w)?;
        }
        Ok(())
    }
}

/// Encoded bytes of one frame.
///
/// Produced by [StepEnc::add_frame]; written to the output by
/// [StepEnc::flush].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodedFrame(Vec<u8>);

impl EncodedFrame {
    /// Get the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the frame has no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into the encoded bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

/// Canvas geometry and shared frame encoding state
pub(crate) struct Canvas {
    /// Screen width
    width: u16,
    /// Screen height
    height: u16,
    /// Accelerator context
    accel: AccelContext,
}

impl Canvas {
    /// Create a new canvas
    pub fn new(width: u16, height: u16, accel: AccelContext) -> Self {
        Canvas {
            width,
            height,
            accel,
        }
    }

    /// Make the logical screen descriptor
    fn screen_desc(&self) -> LogicalScreenDesc {
        LogicalScreenDesc::default()
            .with_screen_width(self.width)
            .with_screen_height(self.height)
            .with_color_resolution(8)
    }

    /// Check that a frame fits within the canvas
    fn check_geometry(&self, step: &Step) -> Result<(u16, u16)> {
        let raster = step.raster();
        let width = u16::try_from(raster.width())?;
        let height = u16::try_from(raster.height())?;
        let (left, top) = step.position();
        if u32::from(left) + u32::from(width) > u32::from(self.width)
            || u32::from(top) + u32::from(height) > u32::from(self.height)
        {
            return Err(Error::InvalidFrameDimensions);
        }
        Ok((width, height))
    }

    /// Encode one animation step into frame blocks
    pub fn make_frame(&self, step: &Step) -> Result<Frame> {
        let (width, height) = self.check_geometry(step)?;
        let raster = step.raster();
        let pixels: Vec<Color> = raster
            .pixels()
            .iter()
            .map(|p| {
                [
                    u8::from(Rgb::red(*p)),
                    u8::from(Rgb::green(*p)),
                    u8::from(Rgb::blue(*p)),
                ]
            })
            .collect();
        let palette = match distinct_colors(&pixels, MAX_COLORS) {
            Some(colors) => {
                log::debug!("palette: {} distinct colors", colors.len());
                make_palette(&colors)
            }
            None => {
                let mut quantizer = match step.seed() {
                    Some(seed) => Quantizer::with_seed(step.quantizer(), seed),
                    None => Quantizer::new(step.quantizer()),
                };
                let n_colors = quantizer.quantize(&pixels, MAX_COLORS);
                log::debug!("palette: {n_colors} colors ({:?})", quantizer.kind());
                quantizer.palette()
            }
        };
        let ditherer = self.accel.ditherer(step.dither());
        log::debug!("ditherer: {ditherer:?}");
        let indices = ditherer.dither(
            &pixels,
            u32::from(width),
            u32::from(height),
            &palette,
        )?;
        let tbl = ColorTableConfig::new(u16::try_from(palette.len())?);
        let data = lzw::encode_image_data(indices.as_u8_slice(), tbl.table_len())?;
        log::debug!("lzw: {} bytes", data.len());
        let (left, top) = step.position();
        let image_desc = ImageDesc::default()
            .with_left(left)
            .with_top(top)
            .with_width(width)
            .with_height(height)
            .with_color_table_config(&tbl);
        Ok(Frame {
            graphic_control_ext: Some(step.graphic_control()),
            image_desc,
            local_color_table: Some(LocalColorTable::with_palette(&palette, &tbl)),
            image_data: Some(ImageData::with_compressed(data)),
        })
    }

    /// Encode one animation step into a buffer
    pub fn encode_frame(&self, step: &Step) -> Result<EncodedFrame> {
        let frame = self.make_frame(step)?;
        let mut buf = Vec::with_capacity(frame.image_desc.image_sz() / 2 + 1024);
        frame.format(&mut buf)?;
        Ok(EncodedFrame(buf))
    }
}

/// Encoder for animation steps.
///
/// Created by [Encoder::open](struct.Encoder.html#method.open), after the
/// file preamble has been written.  Frames are encoded with
/// [add_frame](#method.add_frame) or [add_frames](#method.add_frames),
/// which do no I/O, then written in display order with
/// [flush](#method.flush).
pub struct StepEnc<W: Write> {
    /// Writer for output data
    writer: W,
    /// Canvas for frames
    canvas: Canvas,
    /// Worker pool for encoding frames
    pool: Option<ThreadPool>,
}

impl<W: Write> StepEnc<W> {
    /// Write the preamble and create a step encoder
    pub(crate) fn open(
        mut writer: W,
        canvas: Canvas,
        loop_count: u16,
        pool: Option<ThreadPool>,
    ) -> Result<Self> {
        let mut buf = Vec::with_capacity(
            BlockCode::Header_.size() + BlockCode::LogicalScreenDesc_.size() + 19,
        );
        Header::default().format(&mut buf)?;
        canvas.screen_desc().format(&mut buf)?;
        Application::with_loop_count(loop_count).format(&mut buf)?;
        writer.write_all(&buf)?;
        log::info!(
            "opened {}x{} canvas, {} workers",
            canvas.width,
            canvas.height,
            pool.as_ref().map_or(1, |p| p.current_num_threads())
        );
        Ok(StepEnc {
            writer,
            canvas,
            pool,
        })
    }

    /// Get the screen size
    pub fn screen_size(&self) -> (u16, u16) {
        (self.canvas.width, self.canvas.height)
    }

    /// Encode one animation step.
    ///
    /// Nothing is written to the output; pass the result to
    /// [flush](#method.flush).
    pub fn add_frame(&self, step: &Step) -> Result<EncodedFrame> {
        self.canvas.encode_frame(step)
    }

    /// Encode several animation steps, on the worker pool if configured.
    ///
    /// Results are in the same order as `steps`.
    pub fn add_frames(&self, steps: &[Step]) -> Vec<Result<EncodedFrame>> {
        let canvas = &self.canvas;
        match &self.pool {
            Some(pool) => pool.install(|| {
                steps.par_iter().map(|s| canvas.encode_frame(s)).collect()
            }),
            None => steps.iter().map(|s| canvas.encode_frame(s)).collect(),
        }
    }

    /// Write an encoded frame to the output
    pub fn flush(&mut self, frame: EncodedFrame) -> Result<()> {
        self.writer.write_all(frame.as_bytes())?;
        Ok(())
    }

    /// Write the trailer and finish encoding, returning the writer
    pub fn finish(mut self) -> Result<W> {
        Trailer::default().format(&mut self.writer)?;
        self.writer.flush()?;
        self.canvas.accel.close();
        log::info!("finished");
        Ok(self.writer)
    }
}
