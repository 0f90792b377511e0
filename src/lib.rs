// lib.rs      gifpix crate.
//
// Copyright (c) 2020  Douglas Lau
//
//! A library for decoding GIF images into pixel grids.
//!
//! Decoding works over an in-memory byte buffer and never delegates to a
//! general-purpose image library: the container parser, the LZW
//! decompressor and the frame compositor are all in this crate.  Each
//! composited [Step](struct.Step.html) holds the full canvas, with
//! transparency and sub-region placement applied against the previous
//! step.
#[macro_use]
extern crate log;

pub mod block;
mod decode;
mod error;
mod lzw;
mod private;

pub use crate::decode::{Blocks, Frames, Steps};
pub use crate::error::{Error, Result};
pub use crate::private::{
    decode_file, ChannelOrder, DecodedGif, Decoder, Metadata, PixelGrid, Step,
};
