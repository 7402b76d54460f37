use core::cell::{Ref, RefCell};
use std::{
  io::{self, Read, Write},
  rc::Rc,
};

use flate2::{write::ZlibEncoder, Compression};

/// A Zlib compressed soft mask, filled in as an [`AlphaSeparator`] runs.
///
/// This is a shared handle: the separator writes into it while the color data
/// is being read, and the owner of the image reads from it afterwards. The
/// contents are only complete once the separator's alpha compressor has been
/// flushed or finished.
#[derive(Clone, Default)]
pub struct SoftMask(Rc<RefCell<Vec<u8>>>);
impl SoftMask {
  #[inline]
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }
  /// Compressed bytes so far.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.0.borrow().len()
  }
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
  /// Borrows the compressed bytes.
  ///
  /// ## Panics
  /// * If held across a read of the color stream that writes alpha data.
  #[inline]
  pub fn bytes(&self) -> Ref<'_, [u8]> {
    Ref::map(self.0.borrow(), Vec::as_slice)
  }
  /// Copies out the compressed bytes.
  #[inline]
  #[must_use]
  pub fn to_vec(&self) -> Vec<u8> {
    self.0.borrow().clone()
  }
}
impl core::fmt::Debug for SoftMask {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_tuple("SoftMask").field(&self.len()).finish()
  }
}
impl Write for SoftMask {
  #[inline]
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.borrow_mut().extend_from_slice(buf);
    Ok(buf.len())
  }
  #[inline]
  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

/// Splits the alpha samples out of decompressed scanline data.
///
/// The source must give the inflated (but still filtered) image data of an
/// 8-bit greyscale+alpha or RGB+alpha PNG. Each scanline is one filter type
/// byte followed by `width` pixels of `channels + 1` bytes.
///
/// Reading from the separator gives the same data with the alpha byte of
/// every pixel removed, which is the filtered data of an image with just the
/// color channels. Each alpha byte goes into a Zlib compressor writing to a
/// [`SoftMask`] instead.
///
/// The filter bytes stay in the color data only.
///
/// Each `read` moves single bytes from the source and gives back at most one
/// byte, so the split is correct no matter how reads line up with pixels or
/// rows. Use it through a buffering layer (or `read_to_end`, etc).
pub struct AlphaSeparator<S> {
  source: Option<S>,
  channels: usize,
  stride: usize,
  total: usize,
  offset: usize,
  alpha: Option<ZlibEncoder<SoftMask>>,
  mask: SoftMask,
}
impl<S> core::fmt::Debug for AlphaSeparator<S> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("AlphaSeparator")
      .field("channels", &self.channels)
      .field("stride", &self.stride)
      .field("offset", &self.offset)
      .field("total", &self.total)
      .field("alpha_open", &self.alpha.is_some())
      .field("mask", &self.mask)
      .finish_non_exhaustive()
  }
}
impl<S: Read> AlphaSeparator<S> {
  /// * `channels`: color channels per pixel, not counting alpha (1 or 3).
  /// * `level`: compression level of the soft mask.
  pub fn new(source: S, width: u32, height: u32, channels: usize, level: Compression) -> Self {
    debug_assert!(channels == 1 || channels == 3, "channels: {channels}");
    let stride = (channels + 1).saturating_mul(width as usize).saturating_add(1);
    let mask = SoftMask::new();
    Self {
      source: Some(source),
      channels,
      stride,
      total: stride.saturating_mul(height as usize),
      offset: 0,
      alpha: Some(ZlibEncoder::new(mask.clone(), level)),
      mask,
    }
  }

  /// Bytes per scanline of the source data, including the filter byte.
  #[inline]
  #[must_use]
  pub fn stride(&self) -> usize {
    self.stride
  }

  /// If every row of the image has gone through.
  #[inline]
  #[must_use]
  pub fn is_done(&self) -> bool {
    self.offset >= self.total
  }

  /// The soft mask that alpha samples are written into.
  #[inline]
  #[must_use]
  pub fn mask(&self) -> &SoftMask {
    &self.mask
  }

  /// Pushes pending alpha data into the [`SoftMask`].
  ///
  /// While rows remain this is a Zlib sync flush. After the last row it
  /// finishes the stream, so the mask holds a complete Zlib stream and its
  /// length is final.
  pub fn flush_alpha(&mut self) -> io::Result<()> {
    if self.is_done() {
      return self.finish_alpha();
    }
    match self.alpha.as_mut() {
      Some(encoder) => encoder.flush(),
      None => Ok(()),
    }
  }

  /// Writes the end of the alpha Zlib stream.
  ///
  /// Only the first call does anything, after that alpha bytes can't be
  /// accepted anymore.
  pub fn finish_alpha(&mut self) -> io::Result<()> {
    if let Some(encoder) = self.alpha.take() {
      encoder.finish()?;
    }
    Ok(())
  }

  /// Drops the source, giving it back if it wasn't closed already.
  #[inline]
  pub fn close_source(&mut self) -> Option<S> {
    self.source.take()
  }

  fn write_alpha(&mut self, a: u8) -> io::Result<()> {
    match self.alpha.as_mut() {
      Some(encoder) => encoder.write_all(&[a]),
      None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "alpha compressor already finished")),
    }
  }
}
impl<S: Read> Read for AlphaSeparator<S> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    if buf.is_empty() {
      return Ok(0);
    }
    while self.offset < self.total {
      let source = match self.source.as_mut() {
        Some(source) => source,
        None => return Err(io::Error::new(io::ErrorKind::BrokenPipe, "alpha separator source closed")),
      };
      let mut byte = [0_u8; 1];
      source.read_exact(&mut byte)?;
      let j = self.offset % self.stride;
      self.offset += 1;
      // j == 0 is the filter byte
      if j != 0 && (j - 1) % (self.channels + 1) == self.channels {
        self.write_alpha(byte[0])?;
        continue;
      }
      buf[0] = byte[0];
      return Ok(1);
    }
    Ok(0)
  }
}
