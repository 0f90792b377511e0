// decode.rs
//
// Copyright (c) 2020  Douglas Lau
//
//! GIF file decoding
use crate::block::*;
use crate::error::{Error, Result};
use crate::lzw::Decompressor;
use crate::private::{ChannelOrder, PixelGrid, Step};

/// Forward-only cursor over the input buffer
struct Cursor<'a> {
    /// Input buffer
    buf: &'a [u8],
    /// Byte position
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    /// Check if the cursor has reached the end of the buffer
    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Take a fixed-size field
    fn take(&mut self, sz: usize) -> Result<&'a [u8]> {
        let end = self.pos + sz;
        if end <= self.buf.len() {
            let buf = &self.buf[self.pos..end];
            self.pos = end;
            Ok(buf)
        } else {
            Err(Error::UnexpectedEndOfFile)
        }
    }

    /// Take a single byte
    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Peek at the next byte without advancing
    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }
}

/// Iterator for every [Block](block/enum.Block.html) in a GIF file.
///
/// It can only be created with
/// Decoder.[into_blocks](struct.Decoder.html#method.into_blocks).
pub struct Blocks<'a> {
    /// Cursor over the input buffer
    cursor: Cursor<'a>,
    /// Maximum image size, in bytes
    max_image_sz: Option<usize>,
    /// Next expected block code and size
    expected_next: Option<(BlockCode, usize)>,
    /// Flag when done
    done: bool,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        // end-of-buffer at a block boundary is an implicit trailer
        if self.expected_next.is_none() && self.cursor.is_empty() {
            self.done = true;
            return None;
        }
        let res = self.next_block();
        match &res {
            Ok(Block::Trailer(_)) | Err(_) => self.done = true,
            _ => {}
        }
        Some(res)
    }
}

impl<'a> Blocks<'a> {
    /// Create a new block iterator
    pub(crate) fn new(buf: &'a [u8], max_image_sz: Option<usize>) -> Self {
        use self::BlockCode::Header_;
        Blocks {
            cursor: Cursor::new(buf),
            max_image_sz,
            expected_next: Some((Header_, Header_.size())),
            done: false,
        }
    }

    /// Decode the next block (including all sub-blocks).
    fn next_block(&mut self) -> Result<Block> {
        let (bc, sz) = self.examine()?;
        let mut block = self.decode_block(bc, sz)?;
        if block.has_sub_blocks() {
            while self.decode_sub_block(&mut block)? {}
        }
        Ok(block)
    }

    /// Examine the buffer for the next block code and size
    fn examine(&mut self) -> Result<(BlockCode, usize)> {
        match self.expected_next.take() {
            Some(bc_sz) => Ok(bc_sz),
            None => {
                let t = match self.cursor.peek() {
                    Some(t) => t,
                    None => return Err(Error::UnexpectedEndOfFile),
                };
                match BlockCode::from_u8(t) {
                    Some(bc) => Ok((bc, bc.size())),
                    None => Err(Error::InvalidBlockCode),
                }
            }
        }
    }

    /// Decode one block
    fn decode_block(&mut self, bc: BlockCode, sz: usize) -> Result<Block> {
        use crate::block::BlockCode::*;
        let buf = self.cursor.take(sz)?;
        debug!("  block  : {:?} {:?}", bc, sz);
        let block = match bc {
            Header_ => Header::from_buf(buf)?.into(),
            LogicalScreenDesc_ => LogicalScreenDesc::from_buf(buf).into(),
            GlobalColorTable_ => GlobalColorTable::with_colors(buf).into(),
            Extension_ => Block::parse_extension(buf),
            ImageDesc_ => ImageDesc::from_buf(buf).into(),
            LocalColorTable_ => LocalColorTable::with_colors(buf).into(),
            ImageData_ => ImageData::with_min_code_size(buf[0]).into(),
            Trailer_ => Trailer::default().into(),
        };
        self.check_block(&block)?;
        Ok(block)
    }

    /// Check a block and queue the next expected one
    fn check_block(&mut self, block: &Block) -> Result<()> {
        use crate::block::BlockCode::*;
        self.expected_next = match block {
            Block::Header(_) => {
                Some((LogicalScreenDesc_, LogicalScreenDesc_.size()))
            }
            Block::LogicalScreenDesc(b) => {
                let sz = b.color_table_config().size_bytes();
                if sz > 0 {
                    Some((GlobalColorTable_, sz))
                } else {
                    None
                }
            }
            Block::ImageDesc(b) => {
                if let Some(max) = self.max_image_sz {
                    if b.image_sz() > max {
                        return Err(Error::TooLargeImage);
                    }
                }
                let sz = b.color_table_config().size_bytes();
                if sz > 0 {
                    Some((LocalColorTable_, sz))
                } else {
                    Some((ImageData_, ImageData_.size()))
                }
            }
            Block::LocalColorTable(_) => {
                Some((ImageData_, ImageData_.size()))
            }
            _ => None,
        };
        Ok(())
    }

    /// Decode one sub-block; the zero-length terminator is consumed too
    fn decode_sub_block(&mut self, block: &mut Block) -> Result<bool> {
        let sz = self.cursor.take_u8()? as usize;
        if sz > 0 {
            let buf = self.cursor.take(sz)?;
            debug!("sub-block: {:?} {:?}", block, sz);
            Self::parse_sub_block(block, buf)?;
        }
        Ok(sz > 0)
    }

    /// Parse one sub-block
    fn parse_sub_block(block: &mut Block, buf: &[u8]) -> Result<()> {
        use crate::block::Block::*;
        match block {
            GraphicControl(b) => b.parse_buf(buf)?,
            Comment(b) => b.parse_buf(buf),
            Application(b) => b.parse_buf(buf),
            Unknown(b) => b.parse_buf(buf),
            ImageData(b) => b.parse_buf(buf),
            _ => panic!("Invalid state in parse_sub_block!"),
        }
        Ok(())
    }
}

impl Header {
    /// Decode a Header block from a buffer
    fn from_buf(buf: &[u8]) -> Result<Self> {
        assert_eq!(buf.len(), BlockCode::Header_.size());
        if &buf[..3] == b"GIF" {
            // version bytes are reported, not validated
            let version = [buf[3], buf[4], buf[5]];
            Ok(Header::with_version(version))
        } else {
            Err(Error::MalformedHeader)
        }
    }
}

impl LogicalScreenDesc {
    /// Decode a Logical Screen Descriptor block from a buffer
    fn from_buf(buf: &[u8]) -> Self {
        assert_eq!(buf.len(), BlockCode::LogicalScreenDesc_.size());
        let width = (buf[1] as u16) << 8 | buf[0] as u16;
        let height = (buf[3] as u16) << 8 | buf[2] as u16;
        let flags = buf[4];
        let bg_color = buf[5];
        let aspect = buf[6];
        LogicalScreenDesc::default()
            .with_screen_width(width)
            .with_screen_height(height)
            .with_flags(flags)
            .with_background_color_idx(bg_color)
            .with_pixel_aspect_ratio(aspect)
    }
}

impl ImageDesc {
    /// Decode an Image Descriptor block from a buffer
    fn from_buf(buf: &[u8]) -> Self {
        assert_eq!(buf.len(), BlockCode::ImageDesc_.size());
        let left = (buf[2] as u16) << 8 | buf[1] as u16;
        let top = (buf[4] as u16) << 8 | buf[3] as u16;
        let width = (buf[6] as u16) << 8 | buf[5] as u16;
        let height = (buf[8] as u16) << 8 | buf[7] as u16;
        let flags = buf[9];
        Self::default()
            .with_left(left)
            .with_top(top)
            .with_width(width)
            .with_height(height)
            .with_flags(flags)
    }
}

impl Block {
    /// Parse an extension block; unrecognized labels get the generic
    /// sub-block handling rather than an error
    fn parse_extension(buf: &[u8]) -> Self {
        use crate::block::ExtensionCode::*;
        assert_eq!(buf.len(), BlockCode::Extension_.size());
        let et: ExtensionCode = buf[1].into();
        match et {
            GraphicControl_ => GraphicControl::default().into(),
            Comment_ => Comment::default().into(),
            Application_ => Application::default().into(),
            Unknown_(n) => Unknown::new(n).into(),
        }
    }
}

impl GraphicControl {
    /// Parse a Graphic Control extension block
    fn parse_buf(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() == 4 {
            self.set_flags(buf[0]);
            let delay = (buf[2] as u16) << 8 | buf[1] as u16;
            self.set_delay_time_cs(delay);
            self.set_transparent_color_idx(buf[3]);
            Ok(())
        } else {
            Err(Error::MalformedGraphicControlExtension)
        }
    }
}

impl Comment {
    /// Parse a Comment extension block
    fn parse_buf(&mut self, buf: &[u8]) {
        self.add_comment(buf);
    }
}

impl Application {
    /// Parse an Application extension block
    fn parse_buf(&mut self, buf: &[u8]) {
        self.add_app_data(buf);
    }
}

impl Unknown {
    /// Create a new Unknown extension block
    fn new(ext_id: u8) -> Self {
        let mut b = Unknown::default();
        b.add_sub_block(&[ext_id]);
        b
    }
    /// Parse an Unknown extension block
    fn parse_buf(&mut self, buf: &[u8]) {
        self.add_sub_block(buf);
    }
}

impl ImageData {
    /// Parse an Image Data block
    fn parse_buf(&mut self, buf: &[u8]) {
        self.add_data(buf);
    }
}

/// Iterator for [Frame](block/struct.Frame.html)s within a GIF file.
///
/// It can only be created with
/// Decoder.[into_frames](struct.Decoder.html#method.into_frames).
pub struct Frames<'a> {
    /// Block iterator
    blocks: Blocks<'a>,
    /// Preamble, built while reading pre-frame blocks
    preamble: Option<Preamble>,
    /// Graphic control extension for the pending frame
    graphic_control_ext: Option<GraphicControl>,
    /// Image descriptor for the pending frame
    image_desc: Option<ImageDesc>,
    /// Local color table for the pending frame
    local_color_table: Option<LocalColorTable>,
    /// All comment extensions, in order
    comments: Vec<Comment>,
    /// All application extensions, in order
    applications: Vec<Application>,
    /// Count of top-level blocks (extensions, image descriptors, trailer)
    block_count: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(block) = self.blocks.next() {
            match block {
                Ok(b) => match self.handle_block(b) {
                    Ok(Some(f)) => return Some(Ok(f)),
                    Ok(None) => {} // need more blocks
                    Err(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

impl<'a> Frames<'a> {
    /// Create a new frame iterator
    pub(crate) fn new(blocks: Blocks<'a>) -> Self {
        Frames {
            blocks,
            preamble: None,
            graphic_control_ext: None,
            image_desc: None,
            local_color_table: None,
            comments: vec![],
            applications: vec![],
            block_count: 0,
        }
    }

    /// Read preamble blocks.  These are the blocks at the beginning of the
    /// file, before any frame blocks.
    pub fn preamble(&mut self) -> Result<Option<Preamble>> {
        if self.has_frame() {
            return Ok(None);
        }
        self.preamble = Some(Preamble::default());
        while let Some(block) = self.blocks.next() {
            self.handle_block(block?)?;
            if self.has_frame() {
                break;
            }
        }
        Ok(self.preamble.take())
    }

    /// Check if any frame blocks exist
    fn has_frame(&self) -> bool {
        self.graphic_control_ext.is_some() ||
        self.image_desc.is_some() ||
        self.local_color_table.is_some()
    }

    /// Handle one block
    fn handle_block(&mut self, block: Block) -> Result<Option<Frame>> {
        match block {
            Block::Header(b) => {
                if let Some(ref mut f) = &mut self.preamble {
                    f.header = Some(b);
                }
            }
            Block::LogicalScreenDesc(b) => {
                if let Some(ref mut f) = &mut self.preamble {
                    f.logical_screen_desc = Some(b);
                }
            }
            Block::GlobalColorTable(b) => {
                if let Some(ref mut f) = &mut self.preamble {
                    f.global_color_table = Some(b);
                }
            }
            Block::Application(b) => {
                self.block_count += 1;
                if let (Some(ref mut f), Some(_)) =
                    (&mut self.preamble, b.loop_count())
                {
                    if f.loop_count_ext.is_none() {
                        f.loop_count_ext = Some(b.clone());
                    }
                }
                self.applications.push(b);
            }
            Block::Comment(b) => {
                self.block_count += 1;
                if let Some(ref mut f) = &mut self.preamble {
                    f.comments.push(b.clone());
                }
                self.comments.push(b);
            }
            Block::Unknown(_) => {
                self.block_count += 1;
            }
            Block::GraphicControl(b) => {
                self.block_count += 1;
                // the nearest control preceding an image wins
                self.graphic_control_ext = Some(b);
            }
            Block::ImageDesc(b) => {
                self.block_count += 1;
                if self.image_desc.is_some() {
                    return Err(Error::InvalidBlockSequence);
                }
                self.image_desc = Some(b);
            }
            Block::LocalColorTable(b) => {
                self.local_color_table = Some(b);
            }
            Block::ImageData(image_data) => {
                let graphic_control_ext = self.graphic_control_ext.take();
                let image_desc = self.image_desc.take();
                let local_color_table = self.local_color_table.take();
                if let Some(image_desc) = image_desc {
                    let f = Frame::new(graphic_control_ext, image_desc,
                        local_color_table, image_data);
                    return Ok(Some(f));
                } else {
                    return Err(Error::InvalidBlockSequence);
                }
            }
            Block::Trailer(_) => {
                self.block_count += 1;
            }
        }
        Ok(None)
    }

    /// Get all comment extensions seen so far
    pub(crate) fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Get all application extensions seen so far
    pub(crate) fn applications(&self) -> &[Application] {
        &self.applications
    }

    /// Get the count of top-level blocks seen so far
    pub(crate) fn block_count(&self) -> usize {
        self.block_count
    }
}

/// Iterator for composited [Step](struct.Step.html)s within a GIF file.
///
/// Every step holds the full canvas with the frame pasted onto the
/// previous step's output.
///
/// It can only be created with
/// Decoder.[into_steps](struct.Decoder.html#method.into_steps).
pub struct Steps<'a> {
    /// Frame iterator
    frames: Frames<'a>,
    /// Preamble, taken from the frame iterator on the first step
    preamble: Option<Preamble>,
    /// Output channel order
    channel_order: ChannelOrder,
    /// Canvas from the previous step
    canvas: Option<PixelGrid>,
    /// Flag when the preamble has been read
    started: bool,
    /// Flag when done
    done: bool,
}

impl<'a> Iterator for Steps<'a> {
    type Item = Result<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Err(e) = self.ensure_started() {
            self.done = true;
            return Some(Err(e));
        }
        match self.frames.next() {
            Some(Ok(frame)) => match self.composite(frame) {
                Ok(step) => Some(Ok(step)),
                Err(e) => {
                    self.done = true;
                    Some(Err(e))
                }
            },
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => None,
        }
    }
}

impl<'a> Steps<'a> {
    /// Create a new step iterator
    pub(crate) fn new(frames: Frames<'a>, channel_order: ChannelOrder)
        -> Self
    {
        Steps {
            frames,
            preamble: None,
            channel_order,
            canvas: None,
            started: false,
            done: false,
        }
    }

    /// Read the preamble on the first step
    fn ensure_started(&mut self) -> Result<()> {
        if !self.started {
            self.started = true;
            self.preamble = self.frames.preamble()?;
        }
        Ok(())
    }

    /// Get the global color table, if any
    fn global_color_table(&self) -> Option<&GlobalColorTable> {
        self.preamble.as_ref().and_then(|p| p.global_color_table.as_ref())
    }

    /// Composite one frame onto the canvas
    fn composite(&mut self, frame: Frame) -> Result<Step> {
        let desc = &frame.image_desc;
        let width = desc.width() as usize;
        let height = desc.height() as usize;
        let n_pixels = width * height;
        let dec = Decompressor::new(frame.image_data.min_code_size());
        let mut indices = dec.decompress(frame.image_data.data(), n_pixels);
        if indices.len() < n_pixels {
            warn!("Missing image data: {:?} pixels",
                n_pixels - indices.len());
            indices.resize(n_pixels, 0);
        } else if indices.len() > n_pixels {
            warn!("Extra image data: {:?} pixels", indices.len() - n_pixels);
            indices.truncate(n_pixels);
        }
        let prev_canvas = self.canvas.take();
        let colors = match &frame.local_color_table {
            Some(lct) => lct.colors(),
            None => match self.global_color_table() {
                Some(gct) => gct.colors(),
                None => return Err(Error::MissingColorTable),
            }
        };
        let grid =
            PixelGrid::from_indexed(&indices, colors, CHANNELS, width,
                height)?;
        let left = i32::from(desc.left());
        let top = i32::from(desc.top());
        let canvas = match prev_canvas {
            None => {
                // first frame becomes the canvas; pixels outside its
                // region stay zero
                let screen_width = self.preamble.as_ref()
                    .map(|p| p.screen_width() as usize)
                    .unwrap_or(0);
                let screen_height = self.preamble.as_ref()
                    .map(|p| p.screen_height() as usize)
                    .unwrap_or(0);
                let mut canvas =
                    PixelGrid::new(screen_width, screen_height, CHANNELS);
                canvas.paste(&grid, left, top);
                canvas
            }
            Some(prev) => {
                let mut canvas = prev.clone();
                let region = canvas.paste(&grid, left, top);
                let transparent = frame.graphic_control_ext.as_ref()
                    .and_then(|g| g.transparent_color());
                if let Some(idx) = transparent {
                    // pasted pixels of the transparent color show what
                    // was underneath (compared after table lookup)
                    let color = PixelGrid::color_entry(colors, CHANNELS,
                        idx as usize)?;
                    canvas.revert_matching(&prev, color, region);
                }
                canvas
            }
        };
        let mut grid = canvas.clone();
        self.canvas = Some(canvas);
        if self.channel_order == ChannelOrder::Bgr {
            grid.swap_red_blue();
        }
        Ok(Step::new(grid, desc.left(), desc.top(), desc.width(),
            desc.height(), frame.graphic_control_ext,
            frame.local_color_table))
    }

    /// Split into preamble and remaining frame iterator
    pub(crate) fn into_parts(self) -> (Option<Preamble>, Frames<'a>) {
        (self.preamble, self.frames)
    }
}


#[cfg(test)]
mod test {
    use super::fixture::*;
    use super::*;
    use crate::private::Decoder;

    #[test]
    fn simple_1() -> Result<()> {
        let gif = [
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0A, 0x00,
            0x0A, 0x00, 0x91, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
            0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00,
            0x00, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x2C, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00,
            0x0A, 0x00, 0x00, 0x02, 0x16, 0x8C, 0x2D, 0x99,
            0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02, 0x75,
            0xEC, 0x95, 0xFA, 0xA8, 0xDE, 0x60, 0x8C, 0x04,
            0x91, 0x4C, 0x01, 0x00, 0x3B,
        ];
        let image = [
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
            1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
            1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
            2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
            2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
            2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
            2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
            2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
        ];
        for frame in Decoder::new(&gif).into_frames() {
            let frame = frame?;
            let dec = Decompressor::new(frame.image_data.min_code_size());
            let indices = dec.decompress(frame.image_data.data(), 100);
            assert_eq!(indices, &image[..]);
        }
        // white (0), red (1) and blue (2) from the global color table
        let mut steps = Decoder::new(&gif).into_steps();
        let step = steps.next().unwrap()?;
        assert_eq!(step.grid().pixel(0, 0), &[0xFF, 0x00, 0x00]);
        assert_eq!(step.grid().pixel(5, 0), &[0x00, 0x00, 0xFF]);
        assert_eq!(step.grid().pixel(3, 3), &[0xFF, 0xFF, 0xFF]);
        assert!(steps.next().is_none());
        Ok(())
    }

    #[test]
    fn blocks_in_order() -> Result<()> {
        let mut g = screen(2, 2, &[0, 0, 0, 255, 255, 255]);
        graphic_control(&mut g, 0, 10, 0);
        image(&mut g, 0, 0, 2, 2, None, &[0, 1, 1, 0]);
        trailer(&mut g);
        let blocks: Vec<_> = Decoder::new(&g)
            .into_blocks()
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(blocks.len(), 7);
        assert!(matches!(blocks[0], Block::Header(_)));
        assert!(matches!(blocks[1], Block::LogicalScreenDesc(_)));
        assert!(matches!(blocks[2], Block::GlobalColorTable(_)));
        assert!(matches!(blocks[3], Block::GraphicControl(_)));
        assert!(matches!(blocks[4], Block::ImageDesc(_)));
        assert!(matches!(blocks[5], Block::ImageData(_)));
        assert!(matches!(blocks[6], Block::Trailer(_)));
        Ok(())
    }

    #[test]
    fn malformed_signature() {
        let mut g = screen(2, 2, &[0, 0, 0, 255, 255, 255]);
        g[0] = b'J';
        match Decoder::new(&g).decode() {
            Err(Error::MalformedHeader) => {}
            r => panic!("{:?}", r),
        }
    }

    #[test]
    fn unknown_block_code() {
        let mut g = screen(2, 2, &[0, 0, 0, 255, 255, 255]);
        g.push(0x7F);
        match Decoder::new(&g).decode() {
            Err(Error::InvalidBlockCode) => {}
            r => panic!("{:?}", r),
        }
    }

    #[test]
    fn unknown_extension_tolerated() -> Result<()> {
        let mut g = screen(1, 1, &[0, 0, 0, 255, 255, 255]);
        // plain text label is handled as a generic extension
        g.extend_from_slice(&[0x21, 0x01, 3, 9, 9, 9, 0]);
        image(&mut g, 0, 0, 1, 1, None, &[1]);
        trailer(&mut g);
        let decoded = Decoder::new(&g).decode()?;
        assert_eq!(decoded.steps().len(), 1);
        assert_eq!(decoded.metadata().block_count(), 3);
        Ok(())
    }

    #[test]
    fn truncated_mid_block() {
        let mut g = screen(2, 2, &[0, 0, 0, 255, 255, 255]);
        image(&mut g, 0, 0, 2, 2, None, &[0, 1, 1, 0]);
        // chop inside the image data sub-blocks
        g.truncate(g.len() - 2);
        match Decoder::new(&g).decode() {
            Err(Error::UnexpectedEndOfFile) => {}
            r => panic!("{:?}", r),
        }
    }

    #[test]
    fn missing_trailer_tolerated() -> Result<()> {
        let mut g = screen(2, 2, &[0, 0, 0, 255, 255, 255]);
        image(&mut g, 0, 0, 2, 2, None, &[0, 1, 1, 0]);
        // no trailer: end-of-buffer at a block boundary
        let decoded = Decoder::new(&g).decode()?;
        assert_eq!(decoded.steps().len(), 1);
        Ok(())
    }

    #[test]
    fn local_color_table_supersedes() -> Result<()> {
        let mut g = screen(1, 1, &[0, 0, 0, 255, 255, 255]);
        image(&mut g, 0, 0, 1, 1, Some(&[0, 0, 9, 0, 0, 7]), &[1]);
        trailer(&mut g);
        let decoded = Decoder::new(&g).decode()?;
        let step = &decoded.steps()[0];
        assert_eq!(step.grid().pixel(0, 0), &[0, 0, 7]);
        assert!(step.local_color_table().is_some());
        Ok(())
    }

    #[test]
    fn compositing_pastes_at_offset() -> Result<()> {
        let colors = [
            0, 0, 0,        // 0: black
            255, 0, 0,      // 1: red
            0, 255, 0,      // 2: green
            0, 0, 255,      // 3: blue
        ];
        let mut g = screen(4, 4, &colors);
        graphic_control(&mut g, 0, 5, 0);
        image(&mut g, 0, 0, 4, 4, None, &[1; 16]);
        graphic_control(&mut g, 0, 10, 0);
        image(&mut g, 1, 1, 2, 2, None, &[2; 4]);
        trailer(&mut g);
        let decoded = Decoder::new(&g).decode()?;
        assert_eq!(decoded.steps().len(), 2);
        let step = &decoded.steps()[1];
        for y in 0..4 {
            for x in 0..4 {
                let inside = (1..3).contains(&x) && (1..3).contains(&y);
                let expected: &[u8] = if inside {
                    &[0, 255, 0]
                } else {
                    &[255, 0, 0]
                };
                assert_eq!(step.grid().pixel(x, y), expected);
            }
        }
        assert_eq!(step.left(), 1);
        assert_eq!(step.top(), 1);
        assert_eq!(step.width(), 2);
        assert_eq!(step.height(), 2);
        assert_eq!(decoded.steps()[0].delay_time_cs(), Some(5));
        assert_eq!(step.delay_time_cs(), Some(10));
        Ok(())
    }

    #[test]
    fn transparency_shows_underneath() -> Result<()> {
        let colors = [
            0, 0, 0,        // 0: black
            255, 0, 0,      // 1: red
            9, 9, 9,        // 2: transparent marker
            0, 0, 255,      // 3: blue
        ];
        let mut g = screen(4, 4, &colors);
        image(&mut g, 0, 0, 4, 4, None, &[
            1, 1, 1, 1,
            1, 3, 3, 1,
            1, 3, 3, 1,
            1, 1, 1, 1,
        ]);
        // transparent color flag set, index 2
        graphic_control(&mut g, 0x01, 0, 2);
        image(&mut g, 1, 1, 2, 2, None, &[2, 1, 1, 2]);
        trailer(&mut g);
        let decoded = Decoder::new(&g).decode()?;
        let step = &decoded.steps()[1];
        // (1,1) and (2,2) pasted the transparent color: prior shows
        assert_eq!(step.grid().pixel(1, 1), &[0, 0, 255]);
        assert_eq!(step.grid().pixel(2, 2), &[0, 0, 255]);
        // the rest of the pasted region is opaque
        assert_eq!(step.grid().pixel(2, 1), &[255, 0, 0]);
        assert_eq!(step.grid().pixel(1, 2), &[255, 0, 0]);
        // outside the pasted region, the first frame persists
        assert_eq!(step.grid().pixel(0, 0), &[255, 0, 0]);
        assert_eq!(step.transparent_color(), Some(2));
        assert_eq!(decoded.steps()[0].transparent_color(), None);
        Ok(())
    }

    #[test]
    fn transparency_is_color_based() -> Result<()> {
        // indices 2 and 3 map to the same color: both revert, since the
        // comparison happens after table lookup
        let colors = [
            0, 0, 0,
            255, 0, 0,
            9, 9, 9,
            9, 9, 9,
        ];
        let mut g = screen(2, 1, &colors);
        image(&mut g, 0, 0, 2, 1, None, &[1, 1]);
        graphic_control(&mut g, 0x01, 0, 2);
        image(&mut g, 0, 0, 2, 1, None, &[2, 3]);
        trailer(&mut g);
        let decoded = Decoder::new(&g).decode()?;
        let step = &decoded.steps()[1];
        assert_eq!(step.grid().pixel(0, 0), &[255, 0, 0]);
        assert_eq!(step.grid().pixel(1, 0), &[255, 0, 0]);
        Ok(())
    }

    #[test]
    fn overhanging_frame_is_clipped() -> Result<()> {
        let colors = [0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];
        let mut g = screen(2, 2, &colors);
        image(&mut g, 0, 0, 2, 2, None, &[1; 4]);
        // 2x2 frame at (1,1) hangs over the right and bottom edges
        image(&mut g, 1, 1, 2, 2, None, &[2; 4]);
        trailer(&mut g);
        let decoded = Decoder::new(&g).decode()?;
        let step = &decoded.steps()[1];
        assert_eq!(step.grid().pixel(0, 0), &[255, 0, 0]);
        assert_eq!(step.grid().pixel(1, 0), &[255, 0, 0]);
        assert_eq!(step.grid().pixel(0, 1), &[255, 0, 0]);
        assert_eq!(step.grid().pixel(1, 1), &[0, 255, 0]);
        Ok(())
    }

    #[test]
    fn invalid_color_index() {
        let mut g = screen(1, 1, &[0, 0, 0, 255, 255, 255]);
        // index 3 is past the 2-entry table
        image(&mut g, 0, 0, 1, 1, None, &[3]);
        trailer(&mut g);
        match Decoder::new(&g).decode() {
            Err(Error::InvalidColorIndex) => {}
            r => panic!("{:?}", r),
        }
    }

    #[test]
    fn image_without_color_table() {
        let mut g = vec![];
        g.extend_from_slice(b"GIF89a");
        g.extend_from_slice(&[1, 0, 1, 0, 0x00, 0, 0]);
        image(&mut g, 0, 0, 1, 1, None, &[0]);
        trailer(&mut g);
        match Decoder::new(&g).decode() {
            Err(Error::MissingColorTable) => {}
            r => panic!("{:?}", r),
        }
    }

    #[test]
    fn too_large_image() {
        let mut g = screen(3, 3, &[0, 0, 0, 255, 255, 255]);
        image(&mut g, 0, 0, 3, 3, None, &[0; 9]);
        trailer(&mut g);
        match Decoder::new(&g).max_image_sz(Some(4)).decode() {
            Err(Error::TooLargeImage) => {}
            r => panic!("{:?}", r),
        }
        assert!(Decoder::new(&g).max_image_sz(None).decode().is_ok());
    }

    #[test]
    fn bgr_channel_order() -> Result<()> {
        let mut g = screen(1, 1, &[0, 0, 0, 255, 0, 9]);
        image(&mut g, 0, 0, 1, 1, None, &[1]);
        trailer(&mut g);
        let decoded =
            Decoder::new(&g).channel_order(ChannelOrder::Bgr).decode()?;
        assert_eq!(decoded.steps()[0].grid().pixel(0, 0), &[9, 0, 255]);
        Ok(())
    }

    #[test]
    fn preamble_fields() -> Result<()> {
        let mut g = screen(7, 5, &[0, 0, 0, 255, 255, 255]);
        g.extend_from_slice(&[0x21, 0xFE, 2, b'h', b'i', 0]);
        image(&mut g, 0, 0, 7, 5, None, &[0; 35]);
        trailer(&mut g);
        let mut frames = Decoder::new(&g).into_frames();
        let preamble = frames.preamble()?.unwrap();
        assert_eq!(preamble.screen_width(), 7);
        assert_eq!(preamble.screen_height(), 5);
        assert_eq!(preamble.header.unwrap().version(), *b"89a");
        assert_eq!(preamble.global_color_table.unwrap().len(), 2);
        assert_eq!(preamble.comments.len(), 1);
        assert_eq!(frames.count(), 1);
        Ok(())
    }
}
