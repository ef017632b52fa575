//! Frame output for the simulation: JPEG encoding of threshold masks and a
//! minimal MJPEG AVI 1.0 container writer.
//!
//! The AVI layout is the classic one: a `hdrl` list describing a single
//! `vids`/`MJPG` stream, a `movi` list of `00dc` chunks, and an `idx1`
//! keyframe index. Size and frame-count fields are written as placeholders
//! and patched on [`AviWriter::close`].

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Seek, SeekFrom, Write};
use std::path::Path;

use grayscott::d2::sim::{FrameError, FrameSink};
use image::{ImageOutputFormat, Rgb, RgbImage};
use ndarray::Array2;

/// Encodes a threshold mask as a baseline JPEG: white foreground on black.
///
/// Mask rows map to pixel rows, so the image is `cols x rows` pixels.
pub fn encode_jpeg(mask: &Array2<bool>) -> Result<Vec<u8>, image::ImageError> {
    let (rows, cols) = mask.dim();

    let mut img = RgbImage::new(cols as u32, rows as u32);
    for ((i, j), &foreground) in mask.indexed_iter() {
        let px = if foreground {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        };
        img.put_pixel(j as u32, i as u32, px);
    }

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Jpeg(90))?;
    Ok(bytes)
}

/// Error type for AVI writing.
#[derive(Debug, thiserror::Error)]
pub enum AviError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A frame of the wrong pixel dimensions was appended.
    #[error("frame is {got_w}x{got_h}, stream is {want_w}x{want_h}")]
    DimensionMismatch {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },
}

// Fixed file offsets of the fields patched on close. The header layout up
// to the start of the movi chunks is constant.
const OFF_RIFF_SIZE: u64 = 4;
const OFF_TOTAL_FRAMES: u64 = 48;
const OFF_STREAM_LENGTH: u64 = 140;
const OFF_MOVI_SIZE: u64 = 216;
/// Offset of the `movi` fourcc; idx1 entries are relative to it.
const MOVI_START: u64 = 220;

const HDRL_SIZE: u32 = 192;
const STRL_SIZE: u32 = 116;
const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;

/// Appends successive JPEG frames to an MJPEG AVI stream.
///
/// Frames play back at a fixed rate; the container is only valid once
/// [`AviWriter::close`] has run. Dropping the writer early leaves a
/// truncated file, matching the fail-fast error model of the simulation.
pub struct AviWriter<W: Write + Seek> {
    w: W,
    width: u32,
    height: u32,
    frames: u32,
    // (offset relative to the movi fourcc, chunk data size)
    index: Vec<(u32, u32)>,
}

impl AviWriter<BufWriter<File>> {
    /// Creates `path` and writes the stream header for a `width x height`
    /// video at `fps` frames per second.
    pub fn create<P: AsRef<Path>>(path: P, width: u32, height: u32, fps: u32) -> Result<Self, AviError> {
        AviWriter::new(BufWriter::new(File::create(path)?), width, height, fps)
    }
}

impl<W: Write + Seek> AviWriter<W> {
    /// Writes the AVI header onto `w`, which must be positioned at the
    /// start of the file.
    pub fn new(mut w: W, width: u32, height: u32, fps: u32) -> Result<Self, AviError> {
        w.write_all(b"RIFF")?;
        w.write_all(&0u32.to_le_bytes())?; // riff size, patched
        w.write_all(b"AVI ")?;

        w.write_all(b"LIST")?;
        w.write_all(&HDRL_SIZE.to_le_bytes())?;
        w.write_all(b"hdrl")?;

        // avih: main header.
        w.write_all(b"avih")?;
        w.write_all(&56u32.to_le_bytes())?;
        w.write_all(&(1_000_000 / fps).to_le_bytes())?; // microseconds per frame
        w.write_all(&0u32.to_le_bytes())?; // max bytes per second
        w.write_all(&0u32.to_le_bytes())?; // padding granularity
        w.write_all(&AVIF_HASINDEX.to_le_bytes())?;
        w.write_all(&0u32.to_le_bytes())?; // total frames, patched
        w.write_all(&0u32.to_le_bytes())?; // initial frames
        w.write_all(&1u32.to_le_bytes())?; // streams
        w.write_all(&0u32.to_le_bytes())?; // suggested buffer size
        w.write_all(&width.to_le_bytes())?;
        w.write_all(&height.to_le_bytes())?;
        w.write_all(&[0u8; 16])?; // reserved

        w.write_all(b"LIST")?;
        w.write_all(&STRL_SIZE.to_le_bytes())?;
        w.write_all(b"strl")?;

        // strh: one video stream, MJPEG handler.
        w.write_all(b"strh")?;
        w.write_all(&56u32.to_le_bytes())?;
        w.write_all(b"vids")?;
        w.write_all(b"MJPG")?;
        w.write_all(&0u32.to_le_bytes())?; // flags
        w.write_all(&0u16.to_le_bytes())?; // priority
        w.write_all(&0u16.to_le_bytes())?; // language
        w.write_all(&0u32.to_le_bytes())?; // initial frames
        w.write_all(&1u32.to_le_bytes())?; // scale
        w.write_all(&fps.to_le_bytes())?; // rate: rate/scale frames per second
        w.write_all(&0u32.to_le_bytes())?; // start
        w.write_all(&0u32.to_le_bytes())?; // length in frames, patched
        w.write_all(&0u32.to_le_bytes())?; // suggested buffer size
        w.write_all(&u32::MAX.to_le_bytes())?; // quality: default
        w.write_all(&0u32.to_le_bytes())?; // sample size
        w.write_all(&0u16.to_le_bytes())?; // rcFrame
        w.write_all(&0u16.to_le_bytes())?;
        w.write_all(&(width as u16).to_le_bytes())?;
        w.write_all(&(height as u16).to_le_bytes())?;

        // strf: BITMAPINFOHEADER.
        w.write_all(b"strf")?;
        w.write_all(&40u32.to_le_bytes())?;
        w.write_all(&40u32.to_le_bytes())?; // biSize
        w.write_all(&(width as i32).to_le_bytes())?;
        w.write_all(&(height as i32).to_le_bytes())?;
        w.write_all(&1u16.to_le_bytes())?; // planes
        w.write_all(&24u16.to_le_bytes())?; // bits per pixel
        w.write_all(b"MJPG")?; // compression
        w.write_all(&(width * height * 3).to_le_bytes())?; // image size
        w.write_all(&0u32.to_le_bytes())?; // x pixels per meter
        w.write_all(&0u32.to_le_bytes())?; // y pixels per meter
        w.write_all(&0u32.to_le_bytes())?; // colors used
        w.write_all(&0u32.to_le_bytes())?; // colors important

        w.write_all(b"LIST")?;
        w.write_all(&0u32.to_le_bytes())?; // movi size, patched
        w.write_all(b"movi")?;

        Ok(AviWriter {
            w,
            width,
            height,
            frames: 0,
            index: Vec::new(),
        })
    }

    /// Frames appended so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Appends one already-encoded JPEG frame. Chunks are word-aligned as
    /// RIFF requires; the pad byte is not counted in the chunk size.
    pub fn add_frame(&mut self, jpeg: &[u8]) -> Result<(), AviError> {
        let pos = self.w.stream_position()?;
        self.index.push(((pos - MOVI_START) as u32, jpeg.len() as u32));

        self.w.write_all(b"00dc")?;
        self.w.write_all(&(jpeg.len() as u32).to_le_bytes())?;
        self.w.write_all(jpeg)?;
        if jpeg.len() % 2 == 1 {
            self.w.write_all(&[0u8])?;
        }

        self.frames += 1;
        Ok(())
    }

    /// Writes the idx1 index, patches every size and frame-count field, and
    /// flushes. Returns the underlying writer.
    pub fn close(mut self) -> Result<W, AviError> {
        let idx1_start = self.w.stream_position()?;

        self.w.write_all(b"idx1")?;
        self.w.write_all(&(16 * self.frames).to_le_bytes())?;
        for &(offset, size) in &self.index {
            self.w.write_all(b"00dc")?;
            self.w.write_all(&AVIIF_KEYFRAME.to_le_bytes())?;
            self.w.write_all(&offset.to_le_bytes())?;
            self.w.write_all(&size.to_le_bytes())?;
        }
        let end = self.w.stream_position()?;

        self.w.seek(SeekFrom::Start(OFF_RIFF_SIZE))?;
        self.w.write_all(&((end - 8) as u32).to_le_bytes())?;
        self.w.seek(SeekFrom::Start(OFF_TOTAL_FRAMES))?;
        self.w.write_all(&self.frames.to_le_bytes())?;
        self.w.seek(SeekFrom::Start(OFF_STREAM_LENGTH))?;
        self.w.write_all(&self.frames.to_le_bytes())?;
        self.w.seek(SeekFrom::Start(OFF_MOVI_SIZE))?;
        self.w.write_all(&((idx1_start - MOVI_START) as u32).to_le_bytes())?;

        self.w.seek(SeekFrom::End(0))?;
        self.w.flush()?;
        Ok(self.w)
    }
}

impl<W: Write + Seek> FrameSink for AviWriter<W> {
    fn put_frame(&mut self, mask: &Array2<bool>) -> Result<(), FrameError> {
        let (rows, cols) = mask.dim();
        if (cols as u32, rows as u32) != (self.width, self.height) {
            return Err(FrameError::Encode(Box::new(AviError::DimensionMismatch {
                got_w: cols as u32,
                got_h: rows as u32,
                want_w: self.width,
                want_h: self.height,
            })));
        }

        let jpeg = encode_jpeg(mask).map_err(|e| FrameError::Encode(Box::new(e)))?;
        self.add_frame(&jpeg).map_err(|e| FrameError::Write(Box::new(e)))
    }
}
