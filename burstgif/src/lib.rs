// lib.rs      burstgif crate.
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! An animated GIF encoder.
//!
//! Each frame is reduced to at most 256 colors by a color quantizer, mapped
//! to palette indices by a ditherer, and LZW compressed.  Frames can be
//! encoded in parallel on a small worker pool, then written in display
//! order.
//!
//! ## Example
//! ```no_run
//! use burstgif::{Encoder, QuantizerKind, Step};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut enc = Encoder::create("out.gif", 64, 64)?.with_workers(4).open()?;
//! let pixels = vec![0x0080_4020; 64 * 64];
//! let step = Step::with_packed(64, 64, &pixels)?
//!     .with_delay_ms(100)
//!     .with_quantizer(QuantizerKind::MedianCut);
//! let frame = enc.add_frame(&step)?;
//! enc.flush(frame)?;
//! enc.finish()?;
//! # Ok(())
//! # }
//! ```
pub mod block;
pub mod dither;
mod encode;
mod error;
pub mod lzw;
mod private;
pub mod quantize;

pub use crate::dither::{AccelContext, DitherBackend, DitherKind};
pub use crate::encode::{EncodedFrame, StepEnc};
pub use crate::error::{Error, Result};
pub use crate::private::{Encoder, Step};
pub use crate::quantize::QuantizerKind;
