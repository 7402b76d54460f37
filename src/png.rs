#![forbid(unsafe_code)]

//! Module for streaming PNG data.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! ## Library Design Assumptions
//!
//! Unlike a full image decoder, nothing here ever produces pixels. The PNG
//! image data is already a Zlib stream of filtered scanlines, and a PDF reader
//! can unfilter that itself when told to use PNG predictors. So the job here
//! is just to:
//!
//! * Walk the chunks of the PNG, one at a time, pulling bytes from any
//!   [`Read`](std::io::Read) source. The whole file is never in memory.
//! * Collect the header, palette, transparency, and resolution info.
//! * Hand out the `IDAT` payload as one continuous byte stream, no matter how
//!   many `IDAT` chunks it was split across.
//! * For images with an alpha channel, inflate the data and split the alpha
//!   samples off into their own Zlib stream (see [`AlphaSeparator`]), because
//!   PDF wants the alpha as a separate soft mask image.
//!
//! ## Parsing Errors
//!
//! Quoting [section 13.2 of the PNG
//! spec](https://www.w3.org/TR/2003/REC-PNG-20031110/#13Decoders.Errors):
//!
//! > Errors that have little or no effect on the processing of the image may be
//! > ignored, while those that affect critical data shall be dealt with in a
//! > manner appropriate to the application.
//!
//! In our case, that means:
//!
//! * The signature, the header's method flags, and the declared chunk lengths
//!   are all checked, because getting them wrong means we'd pass garbage to
//!   the PDF.
//! * Both of the checksum systems (CRC32 checks on individual chunks, and
//!   Adler32 checking on the Zlib compressed image data) are *not* checked.
//!   The chunk CRC is read and thrown away.
//! * A `pHYs` chunk with different x and y resolution is ignored.
//! * Unknown chunks are skipped by their declared length.

mod alpha;
pub use alpha::*;

mod chunk_reader;
pub use chunk_reader::*;

mod colorspace;
pub use colorspace::*;

mod ihdr;
pub use ihdr::*;

mod phys;
pub use phys::*;

mod trns;
pub use trns::*;


use crate::AsciiArray;

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the PNG's initial 8 bytes are correct.
pub const fn is_png_header_correct(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

/// The chunk types that the reader does something with.
///
/// All other chunk types are skipped.
#[allow(nonstandard_style)]
pub mod chunk_ty {
  use crate::AsciiArray;
  pub const IHDR: AsciiArray<4> = AsciiArray(*b"IHDR");
  pub const PLTE: AsciiArray<4> = AsciiArray(*b"PLTE");
  pub const tRNS: AsciiArray<4> = AsciiArray(*b"tRNS");
  pub const pHYs: AsciiArray<4> = AsciiArray(*b"pHYs");
  pub const IDAT: AsciiArray<4> = AsciiArray(*b"IDAT");
  pub const IEND: AsciiArray<4> = AsciiArray(*b"IEND");
}

/// Where a [`ChunkReader`] is within the PNG stream.
///
/// The states are ordered, and a reader only ever moves forward through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ParserState {
  /// Nothing has been read.
  #[default]
  Init,
  /// The signature has been read and checked.
  Signature,
  /// The `IHDR` chunk has been read.
  Header,
  /// At least one ancillary chunk has been read.
  Ancillary,
  /// Positioned within the image data.
  Data,
  /// The `IEND` chunk has been read.
  End,
}

/// The framing at the start of every chunk.
///
/// The payload is left in the source for whoever handles this type of chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkFrame {
  pub length: u32,
  pub chunk_ty: AsciiArray<4>,
}
