use crate::FormatError;

/// Image Header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// The raw color type byte.
  ///
  /// This isn't checked until the color model is classified, see
  /// [`PngColorType`].
  pub color_type: u8,
}
impl IHDR {
  /// Number of bytes an `IHDR` payload has.
  pub const PAYLOAD_LEN: u32 = 13;
}
impl TryFrom<[u8; 13]> for IHDR {
  type Error = FormatError;
  fn try_from(value: [u8; 13]) -> Result<Self, Self::Error> {
    let [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =
      value;
    if !matches!(bit_depth, 1 | 2 | 4 | 8) {
      return Err(FormatError::UnsupportedBitDepth(bit_depth));
    }
    // RGB and the alpha types only allow 8 or 16, and 16 is out already
    if matches!(color_type, 2 | 4 | 6) && bit_depth != 8 {
      return Err(FormatError::UnsupportedBitDepth(bit_depth));
    }
    if compression_method != 0 {
      return Err(FormatError::UnknownCompressionMethod(compression_method));
    }
    if filter_method != 0 {
      return Err(FormatError::UnknownFilterMethod(filter_method));
    }
    if interlace_method != 0 {
      return Err(FormatError::InterlacingNotSupported);
    }
    Ok(Self {
      width: u32::from_be_bytes([w0, w1, w2, w3]),
      height: u32::from_be_bytes([h0, h1, h2, h3]),
      bit_depth,
      color_type,
    })
  }
}

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// If this color type stores an alpha sample with every pixel.
  pub const fn has_alpha(self) -> bool {
    matches!(self, Self::YA | Self::RGBA)
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = FormatError;
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(FormatError::UnknownColorType(value)),
    })
  }
}

#[cfg(test)]
fn ihdr_bytes(width: u32, height: u32, bit_depth: u8, color_type: u8, methods: [u8; 3]) -> [u8; 13] {
  let [w0, w1, w2, w3] = width.to_be_bytes();
  let [h0, h1, h2, h3] = height.to_be_bytes();
  let [c, f, i] = methods;
  [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, c, f, i]
}

#[test]
fn test_ihdr_parse() {
  let ihdr = IHDR::try_from(ihdr_bytes(640, 480, 8, 6, [0, 0, 0])).unwrap();
  assert_eq!(ihdr, IHDR { width: 640, height: 480, bit_depth: 8, color_type: 6 });
  // indexed and grey allow the small depths
  for depth in [1, 2, 4, 8] {
    assert!(IHDR::try_from(ihdr_bytes(1, 1, depth, 0, [0, 0, 0])).is_ok());
    assert!(IHDR::try_from(ihdr_bytes(1, 1, depth, 3, [0, 0, 0])).is_ok());
  }
  // unknown color types are left for classification
  assert_eq!(IHDR::try_from(ihdr_bytes(1, 1, 8, 5, [0, 0, 0])).unwrap().color_type, 5);
}

#[test]
fn test_ihdr_rejects() {
  assert_eq!(
    IHDR::try_from(ihdr_bytes(1, 1, 16, 2, [0, 0, 0])),
    Err(FormatError::UnsupportedBitDepth(16))
  );
  assert_eq!(
    IHDR::try_from(ihdr_bytes(1, 1, 3, 0, [0, 0, 0])),
    Err(FormatError::UnsupportedBitDepth(3))
  );
  assert_eq!(
    IHDR::try_from(ihdr_bytes(1, 1, 4, 6, [0, 0, 0])),
    Err(FormatError::UnsupportedBitDepth(4))
  );
  assert_eq!(
    IHDR::try_from(ihdr_bytes(1, 1, 8, 0, [1, 0, 0])),
    Err(FormatError::UnknownCompressionMethod(1))
  );
  assert_eq!(
    IHDR::try_from(ihdr_bytes(1, 1, 8, 0, [0, 2, 0])),
    Err(FormatError::UnknownFilterMethod(2))
  );
  assert_eq!(
    IHDR::try_from(ihdr_bytes(1, 1, 8, 0, [0, 0, 1])),
    Err(FormatError::InterlacingNotSupported)
  );
}
