// lzw.rs
//
// Copyright (c) 2020  Douglas Lau
//
//! Lempel-Ziv-Welch decompression for GIF

/// Maximum code width allowed for GIF
const MAX_WIDTH: u8 = 12;

/// Reader of variable-width codes packed LSB-first in a byte buffer
pub(crate) struct BitReader<'a> {
    /// Byte buffer
    buf: &'a [u8],
    /// Cursor position, in bits
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader
    pub fn new(buf: &'a [u8]) -> Self {
        BitReader { buf, pos: 0 }
    }

    /// Read the next `n` bits (1 to 12) as an unsigned integer.
    ///
    /// Bits past the end of the buffer are read as zero; callers detect
    /// exhaustion with the LZW end code, not from this reader.
    pub fn read(&mut self, n: u8) -> u16 {
        debug_assert!(n >= 1 && n <= MAX_WIDTH);
        let len = self.buf.len() * 8;
        let mut val = 0;
        for i in 0..n as usize {
            let pos = self.pos + i;
            if pos >= len {
                break;
            }
            let bit = (self.buf[pos / 8] >> (pos % 8)) & 1;
            val |= (bit as u16) << i;
        }
        self.pos = (self.pos + n as usize).min(len);
        val
    }
}

/// LZW decompressor for the reassembled payload of one image
#[derive(Debug)]
pub(crate) struct Decompressor {
    /// Minimum code size, from the image data block
    min_code_size: u8,
}

impl Decompressor {
    /// Create a new decompressor
    pub fn new(min_code_size: u8) -> Self {
        debug_assert!(min_code_size >= 2 && min_code_size < MAX_WIDTH);
        Decompressor { min_code_size }
    }

    /// Make the initial code table: one single-index sequence per code,
    /// up to and including the end code.
    fn base_table(end: u16) -> Vec<Vec<u16>> {
        (0..=end).map(|i| vec![i]).collect()
    }

    /// Decompress a payload into color table indices.
    ///
    /// Codes are read until the end code, or until `max_pixels` indices
    /// have been produced.  The pixel bound is what terminates malformed
    /// streams, since reads past the end of the payload yield zero-valued
    /// codes forever.
    pub fn decompress(&self, bytes: &[u8], max_pixels: usize) -> Vec<u16> {
        let clear = 1 << self.min_code_size;
        let end = clear + 1;
        let mut width = self.min_code_size + 1;
        let mut reader = BitReader::new(bytes);
        let mut table = Self::base_table(end);
        let mut last: Option<u16> = None;
        let mut out = Vec::with_capacity(max_pixels);
        while out.len() < max_pixels {
            let code = reader.read(width);
            if code == clear {
                width = self.min_code_size + 1;
                table = Self::base_table(end);
                last = None;
                continue;
            }
            if code == end {
                break;
            }
            let mut k = None;
            if let Some(seq) = table.get(code as usize) {
                out.extend_from_slice(seq);
                k = seq.first().copied();
            } else if let Some(prev) = Self::entry(&table, last) {
                // the "not yet assigned" case: previous sequence plus its
                // own first index
                let first = prev[0];
                out.extend_from_slice(prev);
                out.push(first);
                k = Some(first);
            }
            // width grows when the table fills the current code range,
            // checked before the entry for this code is added
            if table.len() == (1 << width) - 1 && width < MAX_WIDTH {
                width += 1;
            }
            if let (Some(k), Some(prev)) = (k, Self::entry(&table, last)) {
                let mut seq = prev.clone();
                seq.push(k);
                table.push(seq);
            }
            last = Some(code);
        }
        out
    }

    /// Look up the table entry for the last code, if defined and in range
    fn entry(table: &[Vec<u16>], last: Option<u16>) -> Option<&Vec<u16>> {
        last.and_then(|code| table.get(code as usize))
    }
}

/// Pack (code, width) pairs LSB-first into a byte buffer
#[cfg(test)]
pub(crate) fn pack_codes(codes: &[(u16, u8)]) -> Vec<u8> {
    let mut buf = vec![];
    let mut acc = 0u32;
    let mut n_bits = 0;
    for &(code, width) in codes {
        acc |= (code as u32) << n_bits;
        n_bits += width;
        while n_bits >= 8 {
            buf.push(acc as u8);
            acc >>= 8;
            n_bits -= 8;
        }
    }
    if n_bits > 0 {
        buf.push(acc as u8);
    }
    buf
}
