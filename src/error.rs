use std::io;

use crate::AsciiArray;

/// The data given isn't PNG data this crate can embed.
///
/// All of these are fatal: once one is returned the decode is abandoned and
/// no partially built descriptor is handed out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
  /// The first eight bytes weren't the PNG signature.
  #[error("not a PNG stream")]
  NotPng,

  /// Only 1, 2, 4, and 8 bits per channel are supported (and only 8 for the
  /// RGB and alpha-carrying color types).
  #[error("unsupported bit depth {0} in PNG stream")]
  UnsupportedBitDepth(u8),

  /// The header's compression method wasn't 0.
  #[error("unknown compression method {0} in PNG stream")]
  UnknownCompressionMethod(u8),

  /// The header's filter method wasn't 0.
  #[error("unknown filter method {0} in PNG stream")]
  UnknownFilterMethod(u8),

  /// The header's interlace method wasn't 0.
  #[error("interlacing not supported in PNG stream")]
  InterlacingNotSupported,

  /// The header's color type isn't one of 0, 2, 3, 4, or 6.
  #[error("unknown color type {0} in PNG stream")]
  UnknownColorType(u8),

  /// Indexed color without any `PLTE` data.
  #[error("missing palette in PNG stream")]
  MissingPalette,

  /// Image data showed up before the `IHDR` chunk.
  #[error("image data before IHDR in PNG stream")]
  MissingHeader,

  /// A chunk declared a length that can't hold what the chunk must contain.
  #[error("invalid length {length} for {chunk} chunk in PNG stream")]
  InvalidChunkLength {
    /// chunk type tag
    chunk: AsciiArray<4>,
    /// declared payload length
    length: u32,
  },

  /// The stream ended in the middle of a chunk.
  #[error("truncated PNG stream")]
  Truncated,
}

/// An error from decoding a PNG stream.
#[derive(Debug, thiserror::Error)]
pub enum PngError {
  /// The source was already at its end before the signature.
  ///
  /// This is not a corrupt stream, there's just nothing there.
  #[error("end of stream")]
  EndOfStream,

  /// The data isn't valid (see [`FormatError`]).
  #[error(transparent)]
  Format(#[from] FormatError),

  /// The underlying byte source failed.
  #[error(transparent)]
  Io(io::Error),
}

impl From<io::Error> for PngError {
  /// Recovers errors that had to travel through an `io::Read` layer.
  ///
  /// * `UnexpectedEof` means the data stopped mid-chunk.
  /// * An `InvalidData` error wrapping a [`FormatError`] gives back that
  ///   format error.
  /// * Everything else is passed along unchanged.
  fn from(e: io::Error) -> Self {
    match e.kind() {
      io::ErrorKind::UnexpectedEof => Self::Format(FormatError::Truncated),
      io::ErrorKind::InvalidData => {
        match e.get_ref().and_then(|inner| inner.downcast_ref::<FormatError>()) {
          Some(format_err) => Self::Format(format_err.clone()),
          None => Self::Io(e),
        }
      }
      _ => Self::Io(e),
    }
  }
}

impl From<PngError> for io::Error {
  fn from(e: PngError) -> Self {
    match e {
      PngError::EndOfStream => io::Error::from(io::ErrorKind::UnexpectedEof),
      PngError::Format(format_err) => io::Error::new(io::ErrorKind::InvalidData, format_err),
      PngError::Io(io_err) => io_err,
    }
  }
}

#[test]
fn test_format_errors_survive_io_round_trip() {
  let original = FormatError::InvalidChunkLength { chunk: AsciiArray(*b"pHYs"), length: 3 };
  let io_err: io::Error = PngError::Format(original.clone()).into();
  assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
  match PngError::from(io_err) {
    PngError::Format(f) => assert_eq!(f, original),
    other => panic!("expected a format error, got {other:?}"),
  }
}

#[test]
fn test_unexpected_eof_becomes_truncated() {
  let e = PngError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
  assert!(matches!(e, PngError::Format(FormatError::Truncated)));
  let e = PngError::from(io::Error::from(io::ErrorKind::PermissionDenied));
  assert!(matches!(e, PngError::Io(ref inner) if inner.kind() == io::ErrorKind::PermissionDenied));
}
