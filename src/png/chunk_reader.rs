use core::fmt::Debug;
use std::io::{self, Read};

use crate::{parser_helpers::*, FormatError, PngError};

use super::*;

/// Size of the buffer used to step over chunks we don't care about.
const SKIP_SCRATCH_LEN: usize = 2 << 10;

/// Pulls a PNG apart one chunk at a time.
///
/// The reader walks the chunks of the stream, keeping the metadata it finds,
/// until it's positioned at the image data. From then on the reader *is* the
/// image data: each call to [`read`](Read::read) gives out bytes of the
/// current `IDAT` chunk, and when that chunk runs out the next chunks are
/// parsed automatically. The bytes produced are the single Zlib stream that
/// all `IDAT` payloads form together, and reading returns `Ok(0)` once the
/// `IEND` chunk is reached.
///
/// Only one chunk header and a small skip buffer are ever held in memory,
/// however big the chunks are and however small the caller's reads are.
pub struct ChunkReader<R> {
  source: R,
  state: ParserState,
  /// `IDAT` payload bytes left in the current chunk.
  readable: u32,
  /// The current `IDAT` chunk's CRC hasn't been consumed yet.
  in_idat: bool,
  read_dpi: bool,
  header: Option<IHDR>,
  palette: Vec<u8>,
  transparency: Option<Transparency>,
  dpi: Option<f64>,
  /// Set by the first format error, every later call gives it again.
  failed: Option<FormatError>,
  scratch: Box<[u8]>,
}
impl<R> Debug for ChunkReader<R> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("ChunkReader")
      .field("state", &self.state)
      .field("readable", &self.readable)
      .field("header", &self.header)
      .field("palette", &(&self.palette[..self.palette.len().min(12)], self.palette.len()))
      .field("transparency", &self.transparency)
      .field("dpi", &self.dpi)
      .field("failed", &self.failed)
      .finish_non_exhaustive()
  }
}
impl<R: Read> ChunkReader<R> {
  /// Makes a reader over PNG bytes, nothing is read yet.
  ///
  /// * `read_dpi`: if a `pHYs` chunk should be used to set the [`dpi`](Self::dpi).
  pub fn new(source: R, read_dpi: bool) -> Self {
    Self {
      source,
      state: ParserState::Init,
      readable: 0,
      in_idat: false,
      read_dpi,
      header: None,
      palette: Vec::new(),
      transparency: None,
      dpi: None,
      failed: None,
      scratch: vec![0_u8; SKIP_SCRATCH_LEN].into_boxed_slice(),
    }
  }

  /// Parses chunks until the reader's state is at least `target`.
  ///
  /// ## Failure
  /// * [`PngError::EndOfStream`] if the source was empty.
  /// * [`FormatError`]s for bad data.
  /// * Any error of the source itself.
  ///
  /// A format error is final: after one, this and `read` only ever give that
  /// same error.
  pub fn parse_until(&mut self, target: ParserState) -> Result<(), PngError> {
    self.check_failed()?;
    let result = self.parse_until_inner(target);
    self.remember(result)
  }

  fn parse_until_inner(&mut self, target: ParserState) -> Result<(), PngError> {
    if self.state == ParserState::Init {
      self.parse_signature()?;
    }
    while self.state < target {
      if self.in_idat {
        self.skip_rest_of_idat()?;
      }
      self.parse_chunk()?;
    }
    Ok(())
  }

  fn parse_signature(&mut self) -> Result<(), PngError> {
    let mut signature = [0_u8; 8];
    let got = read_up_to(&mut self.source, &mut signature)?;
    if got == 0 {
      self.state = ParserState::End;
      return Err(PngError::EndOfStream);
    }
    self.state = ParserState::Signature;
    if !is_png_header_correct(&signature[..got]) {
      return Err(FormatError::NotPng.into());
    }
    Ok(())
  }

  /// Reads the length and type of the next chunk.
  ///
  /// A stream that ends cleanly between two chunks gives `None`.
  fn read_frame(&mut self) -> Result<Option<ChunkFrame>, PngError> {
    let mut frame = [0_u8; 8];
    match read_up_to(&mut self.source, &mut frame)? {
      0 => Ok(None),
      8 => {
        let [l0, l1, l2, l3, t0, t1, t2, t3] = frame;
        Ok(Some(ChunkFrame {
          length: u32::from_be_bytes([l0, l1, l2, l3]),
          chunk_ty: AsciiArray([t0, t1, t2, t3]),
        }))
      }
      _ => Err(FormatError::Truncated.into()),
    }
  }

  #[inline]
  fn check_failed(&self) -> Result<(), PngError> {
    match &self.failed {
      Some(format_err) => Err(PngError::Format(format_err.clone())),
      None => Ok(()),
    }
  }

  fn remember<T>(&mut self, result: Result<T, PngError>) -> Result<T, PngError> {
    if let Err(PngError::Format(format_err)) = &result {
      log::debug!("png: stopping at format error: {format_err}");
      self.failed = Some(format_err.clone());
    }
    result
  }

  /// Moves the state forward, never backward.
  #[inline]
  fn advance(&mut self, state: ParserState) {
    self.state = self.state.max(state);
  }

  fn parse_chunk(&mut self) -> Result<(), PngError> {
    let ChunkFrame { length, chunk_ty: ty } = match self.read_frame()? {
      Some(frame) => frame,
      None => {
        log::debug!("png: stream ended without an IEND chunk");
        self.advance(ParserState::End);
        return Ok(());
      }
    };
    log::trace!("png: {ty} chunk, {length} bytes");
    match ty {
      chunk_ty::IHDR => {
        if length != IHDR::PAYLOAD_LEN {
          return Err(FormatError::InvalidChunkLength { chunk: ty, length }.into());
        }
        self.header = Some(IHDR::try_from(read_array::<13, R>(&mut self.source)?)?);
        self.advance(ParserState::Header);
      }
      chunk_ty::PLTE => {
        self.palette = self.read_payload(length)?;
        self.advance(ParserState::Ancillary);
      }
      chunk_ty::tRNS => {
        let color_type = self.header.ok_or(FormatError::MissingHeader)?.color_type;
        let data = self.read_payload(length)?;
        self.transparency = Transparency::from_payload(color_type, &data)?;
        self.advance(ParserState::Ancillary);
      }
      chunk_ty::pHYs => {
        if length != pHYs::PAYLOAD_LEN {
          return Err(FormatError::InvalidChunkLength { chunk: ty, length }.into());
        }
        let phys = pHYs::from(read_array::<9, R>(&mut self.source)?);
        if self.read_dpi {
          match phys.dpi() {
            Some(dpi) => self.dpi = Some(dpi),
            None => log::debug!("png: ignoring non-square pHYs {}x{}", phys.ppu_x, phys.ppu_y),
          }
        }
        self.advance(ParserState::Ancillary);
      }
      chunk_ty::IDAT => {
        if self.header.is_none() {
          return Err(FormatError::MissingHeader.into());
        }
        self.advance(ParserState::Data);
        self.readable = length;
        self.in_idat = true;
        // the payload is left for `read`
        return Ok(());
      }
      chunk_ty::IEND => {
        self.skip(length)?;
        self.advance(ParserState::End);
      }
      _ => {
        log::debug!("png: skipping {ty} chunk ({length} bytes)");
        self.skip(length)?;
      }
    }
    // ignore CRC
    self.skip_crc()?;
    Ok(())
  }

  /// Reads a whole payload into a new vec.
  ///
  /// The vec only grows as bytes actually arrive.
  fn read_payload(&mut self, length: u32) -> Result<Vec<u8>, PngError> {
    let mut data = Vec::new();
    (&mut self.source).take(u64::from(length)).read_to_end(&mut data)?;
    if data.len() != length as usize {
      return Err(FormatError::Truncated.into());
    }
    Ok(data)
  }

  #[inline]
  fn skip(&mut self, length: u32) -> io::Result<()> {
    skip_bytes(&mut self.source, u64::from(length), &mut self.scratch)
  }

  #[inline]
  fn skip_crc(&mut self) -> io::Result<()> {
    read_array::<4, R>(&mut self.source).map(drop)
  }

  fn skip_rest_of_idat(&mut self) -> io::Result<()> {
    self.skip(self.readable)?;
    self.readable = 0;
    self.finish_idat()
  }

  fn finish_idat(&mut self) -> io::Result<()> {
    self.in_idat = false;
    self.skip_crc()
  }

  /// Where the reader is in the stream.
  #[inline]
  pub fn state(&self) -> ParserState {
    self.state
  }

  /// The image header, once it's been parsed.
  #[inline]
  pub fn header(&self) -> Option<&IHDR> {
    self.header.as_ref()
  }

  /// The palette bytes exactly as stored, empty if there was no `PLTE`.
  #[inline]
  pub fn palette(&self) -> &[u8] {
    &self.palette
  }

  /// The palette as `[r, g, b]` entries.
  ///
  /// Gives `None` if the palette length isn't a multiple of 3.
  #[inline]
  pub fn palette_entries(&self) -> Option<&[[u8; 3]]> {
    bytemuck::try_cast_slice(&self.palette).ok()
  }

  #[inline]
  pub fn transparency(&self) -> Option<Transparency> {
    self.transparency
  }

  /// The resolution from `pHYs`.
  ///
  /// This is only ever set if the reader was made with `read_dpi` enabled.
  #[inline]
  pub fn dpi(&self) -> Option<f64> {
    self.dpi
  }

  /// Gives back the source, positioned wherever the reader left it.
  #[inline]
  pub fn into_inner(self) -> R {
    self.source
  }

  fn read_data(&mut self, buf: &mut [u8]) -> Result<usize, PngError> {
    match self.parse_until_inner(ParserState::Data) {
      Ok(()) => (),
      Err(PngError::EndOfStream) => return Ok(0),
      Err(e) => return Err(e),
    }
    while self.readable == 0 {
      if self.in_idat {
        self.finish_idat()?;
      }
      if self.state == ParserState::End {
        return Ok(0);
      }
      self.parse_chunk()?;
    }
    let want = buf.len().min(self.readable as usize);
    let n = match self.source.read(&mut buf[..want])? {
      0 => return Err(FormatError::Truncated.into()),
      n => n,
    };
    self.readable -= n as u32;
    if self.readable == 0 {
      self.finish_idat()?;
    }
    Ok(n)
  }
}
impl<R: Read> Read for ChunkReader<R> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    self.check_failed()?;
    if buf.is_empty() || self.state == ParserState::End {
      return Ok(0);
    }
    let result = self.read_data(buf);
    Ok(self.remember(result)?)
  }
}
