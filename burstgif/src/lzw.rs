// lzw.rs
//
// Copyright (c) 2020-2025  Douglas Lau
//
//! Lempel-Ziv-Welch compression for GIF image data
use crate::{Error, Result};
use std::cmp::Ordering;
use std::ops::AddAssign;

/// Maximum length of one data sub-block
const SUB_BLOCK_LEN: usize = 0xFF;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> u16 {
        1 << (self.0 as u16)
    }
}

/// Code type
type Code = u16;

/// Dictionary node.
///
/// Each node is a string of color indices; nodes sharing a prefix are kept
/// in a binary tree (`left` / `right`) hanging off the prefix `child` link.
#[derive(Clone, Copy, Debug)]
struct Node {
    /// First node extending this string
    child: Option<Code>,
    /// Sibling with a lower last index
    left: Option<Code>,
    /// Sibling with a higher last index
    right: Option<Code>,
    /// Last color index of the string
    index: u8,
}

/// Code dictionary
#[derive(Debug)]
struct Dictionary {
    /// Table of nodes, indexed by code
    nodes: Vec<Node>,
    /// Minimum code bits
    min_code_bits: u8,
}

/// LZW compressor for GIF image data
pub struct Compressor {
    /// Code dictionary
    dict: Dictionary,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Pending bits, not yet written
    code: u32,
    /// Number of pending bits
    n_bits: u8,
}

impl Node {
    fn new(index: u8) -> Self {
        Node {
            child: None,
            left: None,
            right: None,
            index,
        }
    }

    /// Get a link code
    fn link(&self, ordering: Ordering) -> Option<Code> {
        match ordering {
            Ordering::Less => self.left,
            Ordering::Equal => self.child,
            Ordering::Greater => self.right,
        }
    }

    /// Set a link code
    fn set_link(&mut self, ordering: Ordering, code: Code) {
        match ordering {
            Ordering::Less => self.left = Some(code),
            Ordering::Equal => self.child = Some(code),
            Ordering::Greater => self.right = Some(code),
        }
    }
}

impl Dictionary {
    fn new(min_code_bits: u8) -> Self {
        let mut dict = Dictionary {
            nodes: Vec::with_capacity(usize::from(Bits::MAX.entries()) + 1),
            min_code_bits,
        };
        dict.reset();
        dict
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end of information code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the next free code
    fn next_code(&self) -> Code {
        self.nodes.len() as Code
    }

    /// Reset to single-index strings only
    fn reset(&mut self) {
        self.nodes.clear();
        for index in 0..self.clear_code() {
            self.nodes.push(Node::new(index as u8));
        }
        self.nodes.push(Node::new(0)); // clear code
        self.nodes.push(Node::new(0)); // end code
    }

    /// Find the string `prefix + index`, inserting it when missing.
    ///
    /// Returns the code of the string if it was already known.
    fn find_or_insert(&mut self, prefix: Code, index: u8) -> Option<Code> {
        let next_code = self.next_code();
        let mut code = prefix;
        let mut ordering = Ordering::Equal;
        while let Some(link) = self.nodes[usize::from(code)].link(ordering) {
            code = link;
            ordering = index.cmp(&self.nodes[usize::from(code)].index);
            if ordering == Ordering::Equal {
                return Some(code);
            }
        }
        self.nodes[usize::from(code)].set_link(ordering, next_code);
        self.nodes.push(Node::new(index));
        None
    }
}

impl Compressor {
    /// Create a new compressor
    pub fn new(min_code_bits: u8) -> Self {
        Compressor {
            dict: Dictionary::new(min_code_bits),
            min_code_bits,
            code_bits: Bits::from(min_code_bits + 1),
            code: 0,
            n_bits: 0,
        }
    }

    /// Pack a code into a buffer, least significant bit first
    fn pack(&mut self, code: Code, buffer: &mut Vec<u8>) {
        self.code |= u32::from(code) << self.n_bits;
        self.n_bits += u8::from(self.code_bits);
        while self.n_bits >= 8 {
            buffer.push(self.code as u8);
            self.code >>= 8;
            self.n_bits -= 8;
        }
    }

    /// Write out any pending bits, padded with zeros
    fn pack_finish(&mut self, buffer: &mut Vec<u8>) {
        if self.n_bits > 0 {
            buffer.push(self.code as u8);
        }
        self.code = 0;
        self.n_bits = 0;
    }

    /// Compress a slice of color indices.
    ///
    /// Every index must be below the clear code.
    pub fn compress(&mut self, indices: &[u8], buffer: &mut Vec<u8>) {
        self.pack(self.dict.clear_code(), buffer);
        let mut prefix: Option<Code> = None;
        for &index in indices {
            prefix = match prefix {
                None => Some(Code::from(index)),
                Some(code) => match self.dict.find_or_insert(code, index) {
                    Some(found) => Some(found),
                    None => {
                        self.pack(code, buffer);
                        Some(Code::from(index))
                    }
                },
            };
            let next_code = self.dict.next_code();
            if next_code > self.code_bits.entries() {
                if next_code > Bits::MAX.entries() {
                    self.pack(self.dict.clear_code(), buffer);
                    self.dict.reset();
                    self.code_bits = Bits::from(self.min_code_bits + 1);
                } else {
                    self.code_bits += 1;
                }
            }
        }
        if let Some(code) = prefix {
            self.pack(code, buffer);
            // decoder adds one more string after the last code
            if self.dict.next_code() >= self.code_bits.entries() {
                self.code_bits += 1;
            }
        }
        self.pack(self.dict.end_code(), buffer);
        self.pack_finish(buffer);
    }
}

/// Get the LZW minimum code size for a padded color table length
pub fn min_code_size(table_len: usize) -> u8 {
    let mut bits = 2;
    while (1 << bits) < table_len && bits < 8 {
        bits += 1;
    }
    bits
}

/// Compress color indices into a complete GIF image data block.
///
/// The block is the minimum code size byte, followed by data sub-blocks and
/// a zero-length terminator.  Indices not within `table_len` are rejected
/// before anything is compressed.
pub fn encode_image_data(indices: &[u8], table_len: usize) -> Result<Vec<u8>> {
    if indices.iter().any(|i| usize::from(*i) >= table_len) {
        return Err(Error::InvalidColorIndex);
    }
    let min_code_bits = min_code_size(table_len);
    let mut data = Vec::with_capacity(indices.len() / 2 + 8);
    Compressor::new(min_code_bits).compress(indices, &mut data);
    let n_blocks = data.len() / SUB_BLOCK_LEN + 1;
    let mut block = Vec::with_capacity(data.len() + n_blocks + 2);
    block.push(min_code_bits);
    for chunk in data.chunks(SUB_BLOCK_LEN) {
        block.push(chunk.len() as u8); // block size
        block.extend_from_slice(chunk);
    }
    block.push(0); // block size
    Ok(block)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use weezl::{BitOrder, decode::Decoder};

    /// Join sub-blocks of an image data block, checking their lengths
    fn unblock(block: &[u8]) -> (u8, Vec<u8>) {
        let min_code_bits = block[0];
        let mut data = vec![];
        let mut pos = 1;
        loop {
            let len = usize::from(block[pos]);
            pos += 1;
            if len == 0 {
                break;
            }
            assert!(len <= SUB_BLOCK_LEN);
            data.extend_from_slice(&block[pos..pos + len]);
            pos += len;
        }
        assert_eq!(pos, block.len(), "data after terminator");
        (min_code_bits, data)
    }

    /// Decode an image data block with an independent GIF LZW decoder
    pub(crate) fn decode_image_data(block: &[u8]) -> Vec<u8> {
        let (min_code_bits, data) = unblock(block);
        Decoder::new(BitOrder::Lsb, min_code_bits)
            .decode(&data)
            .unwrap()
    }

    fn round_trip(indices: &[u8], table_len: usize) {
        let block = encode_image_data(indices, table_len).unwrap();
        assert_eq!(decode_image_data(&block), indices);
    }

    /// Pseudo-random indices, so the dictionary keeps growing
    fn noise(len: usize, table_len: usize) -> Vec<u8> {
        let mut x = 0x2545_F491_u32;
        (0..len)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                (x as usize % table_len) as u8
            })
            .collect()
    }

    #[test]
    fn code_size() {
        assert_eq!(min_code_size(2), 2);
        assert_eq!(min_code_size(4), 2);
        assert_eq!(min_code_size(8), 3);
        assert_eq!(min_code_size(16), 4);
        assert_eq!(min_code_size(128), 7);
        assert_eq!(min_code_size(256), 8);
    }

    #[test]
    fn empty() {
        let block = encode_image_data(&[], 4).unwrap();
        // clear (4) + end (5), 3 bits each
        assert_eq!(block, [2, 1, 0b0010_1100, 0]);
        round_trip(&[], 4);
    }

    #[test]
    fn single() {
        round_trip(&[1], 2);
        round_trip(&[200], 256);
    }

    #[test]
    fn known_stream() {
        // 2x2 image, indices 0 1 2 3
        let block = encode_image_data(&[0, 1, 2, 3], 4).unwrap();
        // codes: 4 0 1 2 3 5 (3 bits each, 4 bits after 8 entries)
        assert_eq!(block, [2, 3, 0x44, 0x34, 0x05, 0]);
        round_trip(&[0, 1, 2, 3], 4);
    }

    #[test]
    fn end_code_widened() {
        // decoder widens to 4 bits after reading the final code 2
        let block = encode_image_data(&[0, 1, 2], 4).unwrap();
        // codes: 4 0 1 2 (3 bits), 5 (4 bits)
        assert_eq!(block, [2, 2, 0x44, 0x54, 0]);
        round_trip(&[0, 1, 2], 4);
    }

    #[test]
    fn every_width_boundary() {
        for table_len in [2, 4, 16, 256] {
            let indices = noise(600, table_len);
            for len in 0..=indices.len() {
                round_trip(&indices[..len], table_len);
            }
        }
    }

    #[test]
    fn lengths_around_reset() {
        let indices = noise(4200, 256);
        for len in 3700..=4200 {
            round_trip(&indices[..len], 256);
        }
    }

    #[test]
    fn repeated() {
        round_trip(&[0; 4096], 2);
        round_trip(&[7; 10_000], 8);
    }

    #[test]
    fn dictionary_full() {
        round_trip(&noise(4096, 256), 256);
        round_trip(&noise(4096, 4), 4);
    }

    #[test]
    fn multiple_resets() {
        round_trip(&noise(50_000, 256), 256);
        round_trip(&noise(20_000, 16), 16);
        round_trip(&noise(30_000, 2), 2);
    }

    #[test]
    fn sub_blocks() {
        let block = encode_image_data(&noise(5000, 256), 256).unwrap();
        let (_, data) = unblock(&block);
        assert!(data.len() > SUB_BLOCK_LEN);
        assert_eq!(block[1] as usize, SUB_BLOCK_LEN);
    }

    #[test]
    fn invalid_index() {
        assert!(matches!(
            encode_image_data(&[0, 1, 4], 4),
            Err(Error::InvalidColorIndex)
        ));
    }
}
