// block.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! GIF blocks written by the encoder
use pix::{Palette, rgb::Rgb};

/// Number of channels in a color table entry
const CHANNELS: usize = 3;

/// Local color table configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    table_len: usize, // must be between 2...256
}

/// Get the color table size field for a number of colors.
///
/// This is the smallest `s` where `2^(s+1)` is at least `n_colors`.
pub fn color_table_size_field(n_colors: usize) -> u8 {
    let mut s = 0;
    while (2 << s) < n_colors && s < 7 {
        s += 1;
    }
    s
}

impl ColorTableConfig {
    /// Create a color table config, padding the length to a power of two
    pub fn new(n_colors: u16) -> Self {
        let table_len = usize::from(n_colors)
            .max(2)
            .next_power_of_two()
            .min(256);
        ColorTableConfig { table_len }
    }

    /// Get the number of entries, including padding
    pub fn table_len(&self) -> usize {
        self.table_len
    }

    /// Get the 3-bit size field
    pub fn len_bits(&self) -> u8 {
        color_table_size_field(self.table_len)
    }

    /// Get the table size in bytes
    pub fn size_bytes(&self) -> usize {
        self.table_len * CHANNELS
    }
}

/// Frame disposal method
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum DisposalMethod {
    #[default]
    NoAction,
    Keep,
    Background,
    Previous,
    Reserved(u8),
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            _ => Reserved(n & 0b0111),
        }
    }
}

impl From<DisposalMethod> for u8 {
    fn from(d: DisposalMethod) -> Self {
        use self::DisposalMethod::*;
        match d {
            NoAction => 0,
            Keep => 1,
            Background => 2,
            Previous => 3,
            Reserved(n) => n & 0b0111,
        }
    }
}

/// Block signature codes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Header_,
    LogicalScreenDesc_,
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    /// Get the signature byte(s)
    pub fn signature(self) -> &'static [u8] {
        use self::BlockCode::*;
        match self {
            Header_ => b"GIF",
            ImageDesc_ => b",", // (0x2C) Image separator
            Extension_ => b"!", // (0x21) Extension introducer
            Trailer_ => b";",   // (0x3B) GIF trailer
            _ => &[],
        }
    }

    /// Get the fixed size of the block
    pub fn size(self) -> usize {
        use self::BlockCode::*;
        match self {
            Header_ => 6,
            LogicalScreenDesc_ => 7,
            ImageDesc_ => 10,
            Trailer_ => 1,
            Extension_ => 2, // +sub-blocks
        }
    }
}

/// Extension codes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    GraphicControl_,
    Application_,
}

impl From<ExtensionCode> for u8 {
    fn from(t: ExtensionCode) -> Self {
        use self::ExtensionCode::*;
        match t {
            GraphicControl_ => 0xF9,
            Application_ => 0xFF,
        }
    }
}

/// Header block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Default for Header {
    fn default() -> Self {
        Header { version: *b"89a" }
    }
}

impl Header {
    /// Get the version
    pub fn version(&self) -> [u8; 3] {
        self.version
    }
}

/// Logical screen descriptor block.
///
/// No global color table is written; every frame carries a local one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
}

impl LogicalScreenDesc {
    const COLOR_RESOLUTION: u8 = 0b0111_0000;

    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    /// Set the color resolution (bits per primary color, 1-8)
    pub fn with_color_resolution(mut self, bits: u8) -> Self {
        let res = (bits.clamp(1, 8) - 1) << 4;
        self.flags = (self.flags & !Self::COLOR_RESOLUTION) | res;
        self
    }
}

/// Application extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Application {
    app_data: Vec<Vec<u8>>, // sequence of sub-blocks
}

impl Application {
    /// Create a Netscape looping extension.
    ///
    /// A loop count of zero means loop forever.
    pub fn with_loop_count(loop_count: u16) -> Self {
        let [lo, hi] = loop_count.to_le_bytes();
        let app_data = vec![b"NETSCAPE2.0".to_vec(), vec![1, lo, hi]];
        Application { app_data }
    }
    pub fn app_data(&self) -> &[Vec<u8>] {
        &self.app_data
    }
}

/// Graphic control extension block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const USER_INPUT: u8 = 0b0000_0010;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }
    pub fn set_disposal_method(&mut self, disposal_method: DisposalMethod) {
        let d: u8 = disposal_method.into();
        self.flags = (self.flags & !Self::DISPOSAL_METHOD) | (d << 2);
    }
    pub fn user_input(&self) -> bool {
        (self.flags & Self::USER_INPUT) != 0
    }
    pub fn set_user_input(&mut self, user_input: bool) {
        let u = u8::from(user_input) << 1;
        self.flags = (self.flags & !Self::USER_INPUT) | u;
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
    pub fn set_delay_time_cs(&mut self, delay_time_cs: u16) {
        self.delay_time_cs = delay_time_cs;
    }
    pub fn transparent_color(&self) -> Option<u8> {
        if self.flags & Self::TRANSPARENT_COLOR != 0 {
            Some(self.transparent_color_idx)
        } else {
            None
        }
    }
    pub fn transparent_color_idx(&self) -> u8 {
        self.transparent_color_idx
    }
    pub fn set_transparent_color(&mut self, transparent_color: Option<u8>) {
        match transparent_color {
            Some(t) => {
                self.flags |= Self::TRANSPARENT_COLOR;
                self.transparent_color_idx = t;
            }
            None => {
                self.flags &= !Self::TRANSPARENT_COLOR;
                self.transparent_color_idx = 0;
            }
        }
    }
}

/// Image descriptor block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }
    pub fn left(&self) -> u16 {
        self.left
    }
    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }
    pub fn top(&self) -> u16 {
        self.top
    }
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    /// Set the local color table flags (unsorted, not interlaced)
    pub fn with_color_table_config(mut self, tbl: &ColorTableConfig) -> Self {
        self.flags =
            Self::COLOR_TABLE_PRESENT | (tbl.len_bits() & Self::COLOR_TABLE_SIZE);
        self
    }
    pub fn image_sz(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// Local color table block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalColorTable {
    colors: Vec<u8>,
}

impl LocalColorTable {
    /// Create a color table from a palette.
    ///
    /// Entries past the end of the palette are padded with black up to the
    /// configured table length.
    pub fn with_palette(palette: &Palette, tbl: &ColorTableConfig) -> Self {
        let mut colors = Vec::with_capacity(tbl.size_bytes());
        for i in 0..palette.len().min(tbl.table_len()) {
            if let Some(clr) = palette.entry(i) {
                colors.push(u8::from(Rgb::red(clr)));
                colors.push(u8::from(Rgb::green(clr)));
                colors.push(u8::from(Rgb::blue(clr)));
            }
        }
        colors.resize(tbl.size_bytes(), 0);
        LocalColorTable { colors }
    }
    pub fn len(&self) -> usize {
        self.colors.len() / CHANNELS
    }
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
}

/// Image data block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    data: Vec<u8>, // LZW minimum code size, then sub-blocks
}

impl ImageData {
    /// Create image data from an already compressed block
    pub(crate) fn with_compressed(data: Vec<u8>) -> Self {
        debug_assert!(!data.is_empty());
        ImageData { data }
    }
    /// Get the compressed data, including sub-block lengths
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Trailer block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trailer {}

/// Blocks of one encoded frame
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub graphic_control_ext: Option<GraphicControl>,
    pub image_desc: ImageDesc,
    pub local_color_table: Option<LocalColorTable>,
    pub image_data: Option<ImageData>,
}
