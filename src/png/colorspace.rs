use crate::FormatError;

use super::PngColorType;

/// The PDF color space an image's color samples are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorModel {
  Gray,
  Rgb,
  Indexed,
}
impl ColorModel {
  /// Number of color samples per pixel, not counting any alpha.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Gray => 1,
      Self::Rgb => 3,
      Self::Indexed => 1,
    }
  }

  /// Name of the color space in a PDF.
  #[inline]
  #[must_use]
  pub const fn pdf_name(self) -> &'static str {
    match self {
      Self::Gray => "DeviceGray",
      Self::Rgb => "DeviceRGB",
      Self::Indexed => "Indexed",
    }
  }
}

/// The result of classifying a PNG color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colorspace {
  pub model: ColorModel,
  /// If the PNG data carries an alpha sample per pixel that has to be split
  /// off (see [`AlphaSeparator`](super::AlphaSeparator)).
  pub has_alpha: bool,
}
impl Colorspace {
  #[inline]
  #[must_use]
  pub const fn channel_count(&self) -> usize {
    self.model.channel_count()
  }
}

/// Picks the color model for the header's color type.
///
/// * 0 and 4 are gray, 2 and 6 are RGB, with 4 and 6 also having alpha.
/// * 3 is indexed, which needs `palette` to not be empty.
///
/// ## Failure
/// * [`FormatError::UnknownColorType`] for any other color type.
/// * [`FormatError::MissingPalette`] for indexed color without a palette.
pub fn classify_color_type(color_type: u8, palette: &[u8]) -> Result<Colorspace, FormatError> {
  let ty = PngColorType::try_from(color_type)?;
  let model = match ty {
    PngColorType::Y | PngColorType::YA => ColorModel::Gray,
    PngColorType::RGB | PngColorType::RGBA => ColorModel::Rgb,
    PngColorType::Index => {
      if palette.is_empty() {
        return Err(FormatError::MissingPalette);
      }
      ColorModel::Indexed
    }
  };
  Ok(Colorspace { model, has_alpha: ty.has_alpha() })
}

#[test]
fn test_classify_color_type() {
  let gray = classify_color_type(0, &[]).unwrap();
  assert_eq!(gray, Colorspace { model: ColorModel::Gray, has_alpha: false });
  assert_eq!(gray.channel_count(), 1);
  let gray_alpha = classify_color_type(4, &[]).unwrap();
  assert_eq!(gray_alpha, Colorspace { model: ColorModel::Gray, has_alpha: true });
  let rgb = classify_color_type(2, &[]).unwrap();
  assert_eq!(rgb, Colorspace { model: ColorModel::Rgb, has_alpha: false });
  assert_eq!(rgb.channel_count(), 3);
  let rgba = classify_color_type(6, &[]).unwrap();
  assert_eq!(rgba, Colorspace { model: ColorModel::Rgb, has_alpha: true });
  let indexed = classify_color_type(3, &[0, 0, 0]).unwrap();
  assert_eq!(indexed, Colorspace { model: ColorModel::Indexed, has_alpha: false });
  assert_eq!(indexed.model.pdf_name(), "Indexed");
}

#[test]
fn test_classify_errors() {
  assert_eq!(classify_color_type(3, &[]), Err(FormatError::MissingPalette));
  for bad in [1, 5, 7, 255] {
    assert_eq!(classify_color_type(bad, &[1, 2, 3]), Err(FormatError::UnknownColorType(bad)));
  }
}
