#![forbid(unsafe_code)]

//! Turns a PNG stream into the parts of a PDF image.
//!
//! A PDF image with `/Filter /FlateDecode` and PNG predictor `/DecodeParms`
//! can use the `IDAT` data of most PNG files *as is*. So for greyscale, RGB,
//! and indexed images, [`decode_png`] only reads up to the image data and then
//! hands out the rest of the PNG's Zlib stream without ever inflating it.
//!
//! PDF images can't have an alpha channel though, alpha has to be a second
//! image used as a soft mask. For greyscale+alpha and RGB+alpha PNGs the data
//! is inflated, the alpha samples are split off by an [`AlphaSeparator`], and
//! both halves are compressed again on the fly. Soft masks need PDF 1.4, so
//! the [`OutputTarget`] is told about that.
//!
//! ```no_run
//! use png_embed::*;
//! # fn f(file: std::fs::File) -> Result<(), PngError> {
//! let mut version = PdfVersion::V1_3;
//! let mut image = decode_png(file, &DecodeOptions::default(), &mut version)?;
//! let mut color = Vec::new();
//! std::io::copy(image.color_stream(), &mut color)?;
//! image.flush()?;
//! let mask: Option<Vec<u8>> = image.soft_mask().map(SoftMask::to_vec);
//! image.close()?;
//! # Ok(())
//! # }
//! ```

use core::fmt::Debug;
use std::io::{self, Read};

use flate2::{
  read::{ZlibDecoder, ZlibEncoder},
  Compression,
};

use crate::{png::*, FormatError, PngError};

/// A PDF version number, ordered the way the versions were released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfVersion {
  pub major: u8,
  pub minor: u8,
}
impl PdfVersion {
  pub const V1_3: Self = Self::new(1, 3);
  /// The first version with soft masks (`/SMask`).
  pub const V1_4: Self = Self::new(1, 4);

  #[inline]
  #[must_use]
  pub const fn new(major: u8, minor: u8) -> Self {
    Self { major, minor }
  }
}
impl Default for PdfVersion {
  #[inline]
  fn default() -> Self {
    Self::V1_3
  }
}
impl core::fmt::Display for PdfVersion {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "{}.{}", self.major, self.minor)
  }
}

/// The document that decoded images will go into.
pub trait OutputTarget {
  /// The document must be written as at least this version.
  fn require_pdf_version(&mut self, version: PdfVersion);
}
impl OutputTarget for PdfVersion {
  #[inline]
  fn require_pdf_version(&mut self, version: PdfVersion) {
    if *self < version {
      *self = version;
    }
  }
}

/// Settings for [`decode_png`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
  /// Use the `pHYs` chunk (if any) to set [`ImageDescriptor::dpi`].
  pub read_dpi: bool,
  /// Level used when color data has to be compressed again.
  pub color_compression: Compression,
  /// Level used for the soft mask.
  pub mask_compression: Compression,
}
impl Default for DecodeOptions {
  #[inline]
  fn default() -> Self {
    Self {
      read_dpi: false,
      color_compression: Compression::default(),
      mask_compression: Compression::fast(),
    }
  }
}
impl DecodeOptions {
  #[inline]
  #[must_use]
  pub const fn with_read_dpi(self, read_dpi: bool) -> Self {
    Self { read_dpi, ..self }
  }
  #[inline]
  #[must_use]
  pub const fn with_color_compression(self, color_compression: Compression) -> Self {
    Self { color_compression, ..self }
  }
  #[inline]
  #[must_use]
  pub const fn with_mask_compression(self, mask_compression: Compression) -> Self {
    Self { mask_compression, ..self }
  }
}

type RecompressedColor<R> = ZlibEncoder<AlphaSeparator<ZlibDecoder<ChunkReader<R>>>>;

/// The Zlib compressed color data of an image.
pub enum ColorStream<R> {
  /// The PNG's own `IDAT` data, byte for byte.
  Passthrough(ChunkReader<R>),
  /// The PNG's data inflated, with alpha removed, and deflated again.
  Recompressed(RecompressedColor<R>),
  /// Released by [`ImageDescriptor::close`], reads as empty.
  Closed,
}
impl<R: Read> Debug for ColorStream<R> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::Passthrough(reader) => f.debug_tuple("Passthrough").field(reader).finish(),
      Self::Recompressed(encoder) => f.debug_tuple("Recompressed").field(encoder.get_ref()).finish(),
      Self::Closed => f.write_str("Closed"),
    }
  }
}
impl<R: Read> Read for ColorStream<R> {
  #[inline]
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    match self {
      Self::Passthrough(reader) => reader.read(buf),
      Self::Recompressed(encoder) => encoder.read(buf),
      Self::Closed => Ok(0),
    }
  }
}

/// One step of tearing down a recompressing pipeline.
///
/// An [`ImageDescriptor`] lists these in the order they have to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseHook {
  /// Release the inflater reading the PNG's data (and the PNG source).
  Inflate,
  /// Finish the soft mask's Zlib stream.
  AlphaCompressor,
  /// Release the color compressor.
  ColorDeflate,
}

/// Everything needed to write a PNG as a PDF image.
pub struct ImageDescriptor<R> {
  pub width: u32,
  pub height: u32,
  /// Always 1, 2, 4, or 8.
  pub bits_per_component: u8,
  pub color_model: ColorModel,
  /// `PLTE` data, stored as `[r, g, b]` triples. Only non-empty for
  /// [`ColorModel::Indexed`].
  pub palette: Vec<u8>,
  pub transparency: Option<Transparency>,
  pub dpi: Option<f64>,
  color: ColorStream<R>,
  mask: Option<SoftMask>,
  close_hooks: Vec<CloseHook>,
}
impl<R: Read> Debug for ImageDescriptor<R> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("ImageDescriptor")
      .field("width", &self.width)
      .field("height", &self.height)
      .field("bits_per_component", &self.bits_per_component)
      .field("color_model", &self.color_model)
      .field("palette", &self.palette.len())
      .field("transparency", &self.transparency)
      .field("dpi", &self.dpi)
      .field("color", &self.color)
      .field("mask", &self.mask)
      .field("close_hooks", &self.close_hooks)
      .finish()
  }
}
impl<R: Read> ImageDescriptor<R> {
  /// The PDF `/Filter` for both the color stream and the soft mask.
  #[inline]
  #[must_use]
  pub const fn filter(&self) -> &'static str {
    "FlateDecode"
  }

  /// The PDF `/DecodeParms` entries for the color stream.
  ///
  /// `/Predictor 15` tells the PDF reader that every row starts with a PNG
  /// filter type byte.
  #[must_use]
  pub fn decode_parms(&self) -> String {
    format!(
      "/Predictor 15 /Colors {} /BitsPerComponent {} /Columns {}",
      self.color_model.channel_count(),
      self.bits_per_component,
      self.width
    )
  }

  /// If the image had an alpha channel, and so has a [`soft_mask`](Self::soft_mask).
  #[inline]
  #[must_use]
  pub fn has_alpha(&self) -> bool {
    self.mask.is_some()
  }

  /// The compressed color data.
  #[inline]
  pub fn color_stream(&mut self) -> &mut ColorStream<R> {
    &mut self.color
  }

  /// The compressed alpha data, if the image had an alpha channel.
  ///
  /// This fills in as the color stream is read, and its final size is only
  /// known after the color stream was read to the end and then
  /// [`flush`](Self::flush) was called.
  ///
  /// Inflated, the mask is just the alpha samples in row order. They are
  /// still PNG-filtered with each row's filter type, but the rows carry no
  /// filter type bytes of their own.
  #[inline]
  #[must_use]
  pub fn soft_mask(&self) -> Option<&SoftMask> {
    self.mask.as_ref()
  }

  /// Pushes all pending alpha data into the soft mask.
  ///
  /// Does nothing for images without alpha.
  pub fn flush(&mut self) -> io::Result<()> {
    match &mut self.color {
      ColorStream::Recompressed(encoder) => encoder.get_mut().flush_alpha(),
      _ => Ok(()),
    }
  }

  /// The teardown steps that [`close`](Self::close) will run, in order.
  #[inline]
  #[must_use]
  pub fn close_hooks(&self) -> &[CloseHook] {
    &self.close_hooks
  }

  /// Runs every close hook once, in order, and releases the color stream.
  ///
  /// Call this after the color stream was read to the end. Calling it again
  /// does nothing.
  pub fn close(&mut self) -> io::Result<()> {
    for hook in core::mem::take(&mut self.close_hooks) {
      self.run_close_hook(hook)?;
    }
    Ok(())
  }

  fn run_close_hook(&mut self, hook: CloseHook) -> io::Result<()> {
    log::trace!("png: close hook {hook:?}");
    match hook {
      CloseHook::ColorDeflate => self.color = ColorStream::Closed,
      CloseHook::Inflate => {
        if let ColorStream::Recompressed(encoder) = &mut self.color {
          drop(encoder.get_mut().close_source());
        }
      }
      CloseHook::AlphaCompressor => {
        if let ColorStream::Recompressed(encoder) = &mut self.color {
          let separator = encoder.get_mut();
          if !separator.is_done() {
            log::debug!("png: soft mask finished before all rows were read");
          }
          separator.finish_alpha()?;
        }
      }
    }
    Ok(())
  }
}

/// Reads a PNG up to its image data and sets up the image's streams.
///
/// * Greyscale, RGB, and indexed images use the PNG's compressed data
///   directly as their color stream.
/// * Greyscale+alpha and RGB+alpha images get a recompressed color stream and
///   a soft mask, and `target` is raised to at least PDF 1.4.
///
/// ## Failure
/// * [`PngError::EndOfStream`] if `source` was empty.
/// * [`PngError::Format`] if the data isn't a supported PNG, including an
///   indexed image without a palette.
/// * [`PngError::Io`] if `source` fails.
pub fn decode_png<R: Read, T: OutputTarget + ?Sized>(
  source: R, options: &DecodeOptions, target: &mut T,
) -> Result<ImageDescriptor<R>, PngError> {
  let mut reader = ChunkReader::new(source, options.read_dpi);
  reader.parse_until(ParserState::Data)?;
  let ihdr = *reader.header().ok_or(FormatError::MissingHeader)?;
  let colorspace = classify_color_type(ihdr.color_type, reader.palette())?;
  let palette = match colorspace.model {
    ColorModel::Indexed => reader.palette().to_vec(),
    _ => Vec::new(),
  };
  let transparency = reader.transparency();
  let dpi = reader.dpi();

  let (color, mask, close_hooks) = if colorspace.has_alpha {
    log::debug!(
      "png: splitting alpha from {}x{} {} image",
      ihdr.width,
      ihdr.height,
      colorspace.model.pdf_name()
    );
    let separator = AlphaSeparator::new(
      ZlibDecoder::new(reader),
      ihdr.width,
      ihdr.height,
      colorspace.channel_count(),
      options.mask_compression,
    );
    let mask = separator.mask().clone();
    let color = ZlibEncoder::new(separator, options.color_compression);
    target.require_pdf_version(PdfVersion::V1_4);
    (
      ColorStream::Recompressed(color),
      Some(mask),
      vec![CloseHook::Inflate, CloseHook::AlphaCompressor, CloseHook::ColorDeflate],
    )
  } else {
    log::debug!(
      "png: passing through {}x{} {} image data",
      ihdr.width,
      ihdr.height,
      colorspace.model.pdf_name()
    );
    (ColorStream::Passthrough(reader), None, Vec::new())
  };

  Ok(ImageDescriptor {
    width: ihdr.width,
    height: ihdr.height,
    bits_per_component: ihdr.bit_depth,
    color_model: colorspace.model,
    palette,
    transparency,
    dpi,
    color,
    mask,
    close_hooks,
  })
}

/// [`decode_png`] over PNG bytes that are already in memory.
#[inline]
pub fn decode_png_bytes<'b, T: OutputTarget + ?Sized>(
  bytes: &'b [u8], options: &DecodeOptions, target: &mut T,
) -> Result<ImageDescriptor<&'b [u8]>, PngError> {
  decode_png(bytes, options, target)
}
